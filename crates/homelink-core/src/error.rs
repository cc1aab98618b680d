//! Error types for Homelink core operations.

use thiserror::Error;

/// Reasons an OAuth `state` value cannot be tied back to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrelationError {
    /// The `state` parameter was absent or empty.
    #[error("state parameter is missing")]
    Missing,

    /// The `state` parameter could not be parsed.
    #[error("state parameter is malformed: {0}")]
    Malformed(String),

    /// The nonce was never issued or was already consumed.
    #[error("state was not issued by this bot or was already used")]
    Unknown,

    /// The nonce outlived its time-to-live.
    #[error("state has expired, send /start again")]
    Expired,

    /// The nonce was issued for a different conversation.
    #[error("state does not belong to this conversation")]
    Mismatch,
}

/// Errors that can occur in Homelink core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated).
        body: String,
    },

    /// OAuth provider rejected a request.
    #[error("OAuth error: {error}: {description}")]
    OAuth {
        /// Error code from the provider.
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL construction error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Longest response body kept in [`CoreError::Api`].
const MAX_BODY_LEN: usize = 512;

impl CoreError {
    /// Build an API error, truncating long bodies on a char boundary.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.len() > MAX_BODY_LEN {
            let mut cut = MAX_BODY_LEN;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        CoreError::Api { status, body }
    }
}
