//! Conversation → credential store.
//!
//! The [`SessionStore`] trait is injected wherever credentials are read or
//! written, so the callback server and the chat dispatcher share one store
//! without a process-wide singleton. [`MemorySessionStore`] keeps everything
//! in memory: entries live for the lifetime of the process and are lost on
//! restart.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{ConversationId, Credential};

/// Storage for one credential per conversation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a credential, replacing any previous one for the conversation.
    async fn save(&self, conversation: ConversationId, credential: Credential);

    /// Look up the credential for a conversation.
    async fn get(&self, conversation: ConversationId) -> Option<Credential>;
}

/// In-memory [`SessionStore`] guarded by a single lock.
#[derive(Default)]
pub struct MemorySessionStore {
    credentials: RwLock<HashMap<ConversationId, Credential>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of conversations with a stored credential.
    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    /// Whether no credential has been stored yet.
    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, conversation: ConversationId, credential: Credential) {
        let replaced = self
            .credentials
            .write()
            .await
            .insert(conversation, credential)
            .is_some();
        debug!(chat_id = %conversation, replaced, "Stored credential");
    }

    async fn get(&self, conversation: ConversationId) -> Option<Credential> {
        self.credentials.read().await.get(&conversation).cloned()
    }
}
