use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::state::Theme;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_MODEL: &str = "gemini-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_DEPLOY_LINK_BASE: &str = "https://example.com";
pub const DEFAULT_DEPLOY_LINK_DELAY_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub deploy_link_base: String,
    pub deploy_link_delay_ms: u64,
    pub include_history: bool,
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            deploy_link_base: DEFAULT_DEPLOY_LINK_BASE.to_string(),
            deploy_link_delay_ms: DEFAULT_DEPLOY_LINK_DELAY_MS,
            include_history: false,
            theme: Theme::default(),
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when no file exists
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(path = %path.display(), model = %config.model, "loaded config");
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, content).map_err(io_err)?;
        Ok(())
    }

    /// Write `theme` into the file at `path`, leaving every other stored value as it was
    pub fn save_theme_to(path: &Path, theme: Theme) -> Result<(), ConfigError> {
        let mut stored = Self::load_from(path)?;
        stored.theme = theme;
        stored.save_to(path)
    }

    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("botcraft").join("config.json"))
    }

    /// The API key, preferring the environment over the config file
    pub fn resolve_api_key(&self) -> Option<String> {
        pick_api_key(std::env::var(API_KEY_ENV).ok(), self.api_key.clone())
    }

    pub fn deploy_link_delay(&self) -> Duration {
        Duration::from_millis(self.deploy_link_delay_ms)
    }
}

fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_file.filter(|k| !k.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.deploy_link_delay(), Duration::from_millis(2000));
        assert!(!config.include_history);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "gemini-1.5-flash", "theme": "dark"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.deploy_link_delay_ms, DEFAULT_DEPLOY_LINK_DELAY_MS);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            api_key: Some("secret".to_string()),
            include_history: true,
            ..Config::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_save_theme_keeps_other_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"model": "gemini-1.5-flash"}"#).unwrap();

        Config::save_theme_to(&path, Theme::Dark).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(!config.include_history);
    }

    #[test]
    fn test_save_theme_leaves_broken_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::save_theme_to(&path, Theme::Dark).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_serialize_error_is_not_reported_as_invalid_file() {
        let source = serde_json::from_str::<u8>("x").unwrap_err();
        let err = ConfigError::Serialize(source);
        assert!(err.to_string().starts_with("Failed to serialize config"));
    }

    #[test]
    fn test_env_key_wins_over_file() {
        let key = pick_api_key(Some("env".into()), Some("file".into()));
        assert_eq!(key.as_deref(), Some("env"));
    }

    #[test]
    fn test_blank_keys_are_ignored() {
        assert_eq!(pick_api_key(Some("  ".into()), Some("file".into())).as_deref(), Some("file"));
        assert_eq!(pick_api_key(None, Some(String::new())), None);
    }
}
