//! OAuth redirect handler.

use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Body returned once the credential is stored.
pub const SUCCESS_MESSAGE: &str = "Authorization successful! Return to Telegram";

/// Query parameters of the provider redirect.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
    /// Correlation state issued on `/start`.
    pub state: Option<String>,
    /// Authorization code to redeem.
    pub code: Option<String>,
    /// Set by the provider when the user declined.
    pub error: Option<String>,
    /// Provider's explanation of `error`.
    pub error_description: Option<String>,
}

/// GET /oauth_callback - Complete an authorization started with `/start`.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<&'static str> {
    if let Some(reason) = query.error.filter(|e| !e.is_empty()) {
        let detail = query
            .error_description
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| reason.clone());
        warn!(error = %reason, "Provider returned an authorization error");
        return Err(ApiError::Denied(detail));
    }

    let conversation = state
        .states
        .resolve(query.state.as_deref().unwrap_or_default())
        .await
        .map_err(|e| {
            warn!(error = %e, "Rejected callback with invalid state");
            ApiError::from(e)
        })?;

    let code = query
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("code parameter is missing".to_string()))?;

    let exchange = state.exchanger.exchange_code(code.trim());
    let credential = match tokio::time::timeout(state.config.exchange_timeout, exchange).await {
        Ok(Ok(credential)) => credential,
        Ok(Err(e)) => {
            error!(chat_id = %conversation, error = %e, "Token exchange error");
            return Err(ApiError::ExchangeFailed);
        }
        Err(_) => {
            error!(
                chat_id = %conversation,
                timeout_secs = state.config.exchange_timeout.as_secs(),
                "Token exchange timed out"
            );
            return Err(ApiError::Timeout);
        }
    };

    state.sessions.save(conversation, credential).await;
    info!(chat_id = %conversation, "Conversation authorized");

    Ok(SUCCESS_MESSAGE)
}
