//! Router configuration and server setup.

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiConfig;
use crate::handlers;
use crate::state::AppState;

/// Path the provider redirects to.
pub const CALLBACK_PATH: &str = "/oauth_callback";

/// Creates the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(CALLBACK_PATH, get(handlers::oauth_callback))
        .route("/health", get(handlers::health))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Binds the listener. Failing here is a fatal startup error.
pub async fn bind(config: &ApiConfig) -> std::io::Result<TcpListener> {
    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Callback server listening on {}", addr);
    Ok(listener)
}

/// Serves requests on an already bound listener.
pub async fn serve_listener(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}

/// Binds and starts the callback server.
pub async fn serve(config: ApiConfig, state: AppState) -> std::io::Result<()> {
    let listener = bind(&config).await?;
    serve_listener(listener, state).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use homelink_core::{
        ConversationId, CoreError, Credential, MemorySessionStore, SessionStore, StateMode,
        StateRegistry, TokenExchange,
    };

    use super::*;
    use crate::handlers::SUCCESS_MESSAGE;

    /// Token endpoint stand-in: "good" succeeds, "slow" hangs, anything else fails.
    #[derive(Default)]
    struct StubExchange {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenExchange for StubExchange {
        async fn exchange_code(&self, code: &str) -> homelink_core::Result<Credential> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match code {
                "good" => Ok(Credential::bearer("access-good").with_refresh_token("refresh-good")),
                "slow" => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(Credential::bearer("too-late"))
                }
                _ => Err(CoreError::OAuth {
                    error: "invalid_grant".to_string(),
                    description: "Code has expired".to_string(),
                }),
            }
        }
    }

    struct Harness {
        server: TestServer,
        sessions: Arc<MemorySessionStore>,
        states: Arc<StateRegistry>,
        exchanger: Arc<StubExchange>,
    }

    fn harness(mode: StateMode) -> Harness {
        let sessions = Arc::new(MemorySessionStore::new());
        let states = Arc::new(StateRegistry::new(mode, Duration::from_secs(600)));
        let exchanger = Arc::new(StubExchange::default());

        let state = AppState::new(
            ApiConfig::default().with_exchange_timeout(Duration::from_millis(200)),
            sessions.clone(),
            states.clone(),
            exchanger.clone(),
        );
        let server = TestServer::new(create_router(state)).unwrap();

        Harness {
            server,
            sessions,
            states,
            exchanger,
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let h = harness(StateMode::Verified);
        h.states.issue(ConversationId(1)).await;

        let response = h.server.get("/health").await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["pending_authorizations"], 1);
        assert!(!body["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_plain_callback_stores_credential() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("code", "good")
            .await;

        response.assert_status_ok();
        response.assert_text(SUCCESS_MESSAGE);

        let stored = h.sessions.get(ConversationId(42)).await.unwrap();
        assert_eq!(stored.access_token, "access-good");
    }

    #[tokio::test]
    async fn test_verified_callback_stores_credential() {
        let h = harness(StateMode::Verified);
        let state = h.states.issue(ConversationId(7)).await;

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", &state)
            .add_query_param("code", "good")
            .await;

        response.assert_status_ok();
        assert!(h.sessions.get(ConversationId(7)).await.is_some());
    }

    #[tokio::test]
    async fn test_exchange_failure_leaves_store_unchanged() {
        let h = harness(StateMode::Plain);
        h.sessions
            .save(ConversationId(42), Credential::bearer("previous"))
            .await;

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("code", "bad")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let stored = h.sessions.get(ConversationId(42)).await.unwrap();
        assert_eq!(stored.access_token, "previous");
    }

    #[tokio::test]
    async fn test_exchange_failure_without_prior_credential() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("code", "bad")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.sessions.get(ConversationId(42)).await.is_none());
    }

    #[tokio::test]
    async fn test_exchange_timeout() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("code", "slow")
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert!(h.sessions.get(ConversationId(42)).await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_state_rejected_before_exchange() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "forty-two")
            .add_query_param("code", "good")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
        assert!(h.sessions.get(ConversationId(0)).await.is_none());
        assert!(h.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_state_rejected() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("code", "good")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_code_rejected() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_forged_state_rejected_in_verified_mode() {
        let h = harness(StateMode::Verified);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("code", "good")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
        assert!(h.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_state_cannot_be_replayed() {
        let h = harness(StateMode::Verified);
        let state = h.states.issue(ConversationId(7)).await;

        h.server
            .get(CALLBACK_PATH)
            .add_query_param("state", &state)
            .add_query_param("code", "good")
            .await
            .assert_status_ok();

        h.server
            .get(CALLBACK_PATH)
            .add_query_param("state", &state)
            .add_query_param("code", "good")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_provider_error_rejected() {
        let h = harness(StateMode::Plain);

        let response = h
            .server
            .get(CALLBACK_PATH)
            .add_query_param("state", "42")
            .add_query_param("error", "access_denied")
            .add_query_param("error_description", "User denied access")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.text().contains("User denied access"));
        assert_eq!(h.exchanger.calls.load(Ordering::SeqCst), 0);
    }
}
