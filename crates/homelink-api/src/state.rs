//! Application state shared across handlers.

use std::sync::Arc;

use homelink_core::{SessionStore, StateRegistry, TokenExchange};

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ApiConfig>,
    /// Credential store shared with the chat bot.
    pub sessions: Arc<dyn SessionStore>,
    /// Outstanding authorization states shared with the chat bot.
    pub states: Arc<StateRegistry>,
    /// Token endpoint client.
    pub exchanger: Arc<dyn TokenExchange>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(
        config: ApiConfig,
        sessions: Arc<dyn SessionStore>,
        states: Arc<StateRegistry>,
        exchanger: Arc<dyn TokenExchange>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            states,
            exchanger,
        }
    }
}
