pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::Message;

pub use gemini::{ClientSettings, GeminiClient};

/// Why a request to the text-generation endpoint did not yield a reply.
///
/// Callers that only need "it failed" can ignore the variant; it exists for logging.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no API key configured (set GEMINI_API_KEY or api_key in config.json)")]
    MissingApiKey,

    /// Built with the request URL stripped, since the URL carries the API key
    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Something that turns conversation turns into one generated reply
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `turns` (the last one being the new prompt) and return the reply text.
    async fn send(&self, turns: &[Message]) -> Result<String, ClientError>;
}
