//! Concurrent callbacks for distinct conversations must not interfere.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use homelink_api::{create_router, ApiConfig, AppState, CALLBACK_PATH};
use homelink_core::{
    ConversationId, Credential, MemorySessionStore, SessionStore, StateRegistry, TokenExchange,
};

/// Issues a credential derived from the code, after a short delay.
struct EchoExchange;

#[async_trait]
impl TokenExchange for EchoExchange {
    async fn exchange_code(&self, code: &str) -> homelink_core::Result<Credential> {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok(Credential::bearer(format!("token-for-{code}")))
    }
}

#[tokio::test]
async fn test_parallel_callbacks_store_every_credential() {
    const CONVERSATIONS: i64 = 32;

    let sessions = Arc::new(MemorySessionStore::new());
    let states = Arc::new(StateRegistry::default());
    let state = AppState::new(
        ApiConfig::default(),
        sessions.clone(),
        states.clone(),
        Arc::new(EchoExchange),
    );
    let server = TestServer::new(create_router(state)).unwrap();

    let mut issued = Vec::new();
    for i in 0..CONVERSATIONS {
        issued.push((i, states.issue(ConversationId(i)).await));
    }

    let requests = issued.iter().map(|(i, state)| {
        server
            .get(CALLBACK_PATH)
            .add_query_param("state", state)
            .add_query_param("code", format!("code-{i}"))
            .into_future()
    });
    for response in futures::future::join_all(requests).await {
        response.assert_status_ok();
    }

    assert_eq!(sessions.len().await, CONVERSATIONS as usize);
    for i in 0..CONVERSATIONS {
        let credential = sessions.get(ConversationId(i)).await.unwrap();
        assert_eq!(credential.access_token, format!("token-for-code-{i}"));
    }
    assert_eq!(states.pending_count().await, 0);
}
