use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited")]
    RateLimited,

    #[error("provider unavailable")]
    Unavailable,

    #[error("{operation} timed out after {}ms", timeout.as_millis())]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: String },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: String },

    #[error("{provider} API request failed (status {status})")]
    Api { provider: String, status: u16 },

    /// Transport failure or non-success reply where the status is not exposed.
    #[error("{provider} request failed: {message}")]
    Server { provider: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same call may succeed.
    ///
    /// Rate limits, deadlines, transport failures and 5xx responses are transient.
    /// Everything else (bad request, malformed body, unsupported operation) is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::Unavailable | Self::Timeout { .. } | Self::Server { .. } => {
                true
            }
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status >= 500,
            Self::Json(_)
            | Self::EmptyResponse { .. }
            | Self::EmbedUnsupported { .. }
            | Self::Other(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
