//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token rejected or Telegram unreachable at startup.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Sending a message failed.
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    /// Callback server error.
    #[error("Callback server error: {0}")]
    Server(#[from] std::io::Error),

    /// Core error (configuration, HTTP clients).
    #[error(transparent)]
    Core(#[from] homelink_core::CoreError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::SendFailed(e.to_string())
    }
}
