pub mod ai;
pub mod config;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatBackend, ClientError, ClientSettings, GeminiClient};
pub use config::{Config, ConfigError};
pub use session::{ChatSession, SessionEvent, SessionOptions, SubmitOutcome, ERROR_REPLY};
pub use state::{activity_line, Conversation, Message, Role, SessionPhase, Tab, Theme, ViewState};
