//! Callback server error types.
//!
//! The callback is opened in the user's browser, so errors render as plain
//! text rather than JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use homelink_core::CorrelationError;
use thiserror::Error;

/// Result type for handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error type for callback requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be tied to a conversation or lacks parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The provider refused the authorization.
    #[error("authorization denied: {0}")]
    Denied(String),

    /// Token exchange failed upstream.
    #[error("token exchange failed")]
    ExchangeFailed,

    /// Token exchange did not finish in time.
    #[error("token exchange timed out")]
    Timeout,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Denied(_) => StatusCode::BAD_REQUEST,
            ApiError::ExchangeFailed | ApiError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown in the browser.
    fn user_message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => {
                format!("Invalid authorization request: {msg}. Send /start in Telegram to try again.")
            }
            ApiError::Denied(msg) => {
                format!("Authorization was not granted ({msg}). Send /start in Telegram to try again.")
            }
            ApiError::ExchangeFailed | ApiError::Timeout => {
                "Authorization failed. Send /start in Telegram to try again.".to_string()
            }
        }
    }
}

impl From<CorrelationError> for ApiError {
    fn from(err: CorrelationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), self.user_message()).into_response()
    }
}
