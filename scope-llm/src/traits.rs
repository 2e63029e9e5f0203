use async_trait::async_trait;
use scope_http::HttpError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rate limit exceeded")]
    RateLimit,

    #[error("completion timed out")]
    Timeout,

    #[error("provider error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("decode error: {0}")]
    Decode(String),
}

impl LlmError {
    /// Rate limits, 5xx, timeouts, and transport failures are worth another
    /// attempt; auth and payload problems are not.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::RateLimit | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Decode(_) => false,
        }
    }
}

impl From<HttpError> for LlmError {
    fn from(e: HttpError) -> Self {
        match e {
            HttpError::Api { status, .. } if status.as_u16() == 429 => LlmError::RateLimit,
            HttpError::Api { status, message, .. } => LlmError::Api {
                status: status.as_u16(),
                message,
            },
            HttpError::Network(m) if m.contains("timed out") => LlmError::Timeout,
            HttpError::Network(m) => LlmError::Network(m),
            HttpError::Decode(m, _) => LlmError::Decode(m),
            other => LlmError::Network(other.to_string()),
        }
    }
}

/// A completion provider. Implementations make a single attempt per call;
/// retry budgets live with the caller.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response to the given prompt with optional system prompt.
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse, LlmError>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
