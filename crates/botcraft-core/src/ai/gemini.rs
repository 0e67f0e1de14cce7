use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ChatBackend, ClientError};
use crate::config::Config;
use crate::state::{Message, Role};

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct GeminiModel {
    name: String,
}

#[derive(Deserialize)]
struct GeminiModelsResponse {
    #[serde(default)]
    models: Vec<GeminiModel>,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    settings: ClientSettings,
}

impl GeminiClient {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub fn has_api_key(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn api_key(&self) -> Result<&str, ClientError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(ClientError::MissingApiKey)
    }

    pub async fn generate(&self, turns: &[Message]) -> Result<String, ClientError> {
        let key = self.api_key()?;
        let request = build_request(turns);

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", key)])
            .json(&request)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body = response.text().await.map_err(transport)?;
        parse_reply(&body)
    }

    pub async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/v1beta/models",
            self.settings.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .get(&url)
            .query(&[("key", key)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status { status, body });
        }

        let body = response.text().await.map_err(transport)?;
        let models: GeminiModelsResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;

        Ok(models
            .models
            .into_iter()
            .map(|m| m.name.trim_start_matches("models/").to_string())
            .collect())
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn send(&self, turns: &[Message]) -> Result<String, ClientError> {
        self.generate(turns).await
    }
}

/// reqwest errors print the request URL, and ours ends in `?key=...`
fn transport(e: reqwest::Error) -> ClientError {
    ClientError::Transport(e.without_url())
}

/// A single turn goes out as a bare `parts` entry; several turns carry roles.
fn build_request(turns: &[Message]) -> GenerateRequest {
    let with_roles = turns.len() > 1;
    let contents = turns
        .iter()
        .map(|turn| GeminiContent {
            role: with_roles.then(|| match turn.role() {
                Role::User => "user",
                Role::Assistant => "model",
            }),
            parts: vec![GeminiPart {
                text: turn.content().to_string(),
            }],
        })
        .collect();

    GenerateRequest { contents }
}

fn parse_reply(body: &str) -> Result<String, ClientError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
    extract_reply(response)
}

/// Take the text of the first part of the first candidate, verbatim
fn extract_reply(response: GenerateResponse) -> Result<String, ClientError> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::MalformedResponse("no candidates".to_string()))?;

    candidate
        .content
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or_else(|| ClientError::MalformedResponse("candidate has no text part".to_string()))
}
