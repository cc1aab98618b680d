//! OAuth `state` correlation between `/start` and the callback redirect.
//!
//! In [`StateMode::Verified`] every `/start` issues a one-shot nonce bound to
//! the conversation; the `state` value carried through the browser is
//! `"<conversation>.<nonce>"`. The callback must present a nonce that was
//! issued here, has not expired, and belongs to the conversation it names.
//!
//! [`StateMode::Plain`] keeps the bare conversation id as `state`. Anyone who
//! can guess the id can complete an exchange for that conversation, so it is
//! only meant for deployments that need the legacy URL shape.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CorrelationError;
use crate::models::ConversationId;

/// Default lifetime of an issued nonce (10 minutes).
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Default upper bound on outstanding nonces.
pub const DEFAULT_MAX_PENDING: usize = 10_000;

/// Separator between the conversation id and the nonce.
const SEPARATOR: char = '.';

/// How `state` values are produced and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateMode {
    /// `state` is the bare conversation id.
    Plain,
    /// `state` carries a one-shot nonce with an expiry.
    #[default]
    Verified,
}

/// A `/start` that has not been completed yet.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    /// Conversation that requested authorization.
    pub conversation: ConversationId,
    /// When the nonce was issued.
    pub issued_at: DateTime<Utc>,
    sequence: u64,
}

impl PendingAuthorization {
    fn is_expired(&self, ttl: chrono::Duration, now: DateTime<Utc>) -> bool {
        self.issued_at
            .checked_add_signed(ttl)
            .is_some_and(|deadline| now >= deadline)
    }
}

/// Issues and resolves OAuth `state` values.
pub struct StateRegistry {
    mode: StateMode,
    ttl: chrono::Duration,
    max_pending: usize,
    issued: AtomicU64,
    pending: Mutex<HashMap<String, PendingAuthorization>>,
}

impl StateRegistry {
    /// Create a registry holding at most [`DEFAULT_MAX_PENDING`] nonces.
    pub fn new(mode: StateMode, ttl: Duration) -> Self {
        Self::with_capacity(mode, ttl, DEFAULT_MAX_PENDING)
    }

    /// Create a registry holding at most `max_pending` nonces.
    ///
    /// Once full, issuing a new nonce evicts the oldest one.
    pub fn with_capacity(mode: StateMode, ttl: Duration, max_pending: usize) -> Self {
        let ttl =
            chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        Self {
            mode,
            ttl,
            max_pending: max_pending.max(1),
            issued: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Registry in [`StateMode::Plain`].
    pub fn plain() -> Self {
        Self::new(StateMode::Plain, DEFAULT_STATE_TTL)
    }

    /// The configured mode.
    pub fn mode(&self) -> StateMode {
        self.mode
    }

    /// Issue a `state` value for a conversation.
    pub async fn issue(&self, conversation: ConversationId) -> String {
        match self.mode {
            StateMode::Plain => conversation.to_string(),
            StateMode::Verified => {
                let nonce = Uuid::new_v4().simple().to_string();
                let now = Utc::now();
                let sequence = self.issued.fetch_add(1, Ordering::Relaxed);

                let mut pending = self.pending.lock().await;
                let ttl = self.ttl;
                pending.retain(|_, p| !p.is_expired(ttl, now));
                while pending.len() >= self.max_pending {
                    let Some(oldest) = pending
                        .iter()
                        .min_by_key(|(_, p)| p.sequence)
                        .map(|(nonce, _)| nonce.clone())
                    else {
                        break;
                    };
                    if let Some(evicted) = pending.remove(&oldest) {
                        warn!(chat_id = %evicted.conversation, "Evicted oldest authorization state");
                    }
                }
                pending.insert(
                    nonce.clone(),
                    PendingAuthorization {
                        conversation,
                        issued_at: now,
                        sequence,
                    },
                );

                debug!(chat_id = %conversation, pending = pending.len(), "Issued authorization state");
                format!("{conversation}{SEPARATOR}{nonce}")
            }
        }
    }

    /// Resolve a `state` value from the callback to its conversation.
    ///
    /// In verified mode the nonce is consumed whether or not it is still
    /// valid, so a state value can be redeemed at most once.
    pub async fn resolve(&self, state: &str) -> Result<ConversationId, CorrelationError> {
        let state = state.trim();
        if state.is_empty() {
            return Err(CorrelationError::Missing);
        }

        match self.mode {
            StateMode::Plain => state
                .parse::<ConversationId>()
                .map_err(|_| CorrelationError::Malformed(state.to_string())),
            StateMode::Verified => {
                let (id, nonce) = state
                    .split_once(SEPARATOR)
                    .ok_or_else(|| CorrelationError::Malformed(state.to_string()))?;
                let conversation = id
                    .parse::<ConversationId>()
                    .map_err(|_| CorrelationError::Malformed(state.to_string()))?;
                if nonce.is_empty() {
                    return Err(CorrelationError::Malformed(state.to_string()));
                }

                let entry = self
                    .pending
                    .lock()
                    .await
                    .remove(nonce)
                    .ok_or(CorrelationError::Unknown)?;

                if entry.is_expired(self.ttl, Utc::now()) {
                    warn!(chat_id = %conversation, "Authorization state expired");
                    return Err(CorrelationError::Expired);
                }
                if entry.conversation != conversation {
                    warn!(
                        chat_id = %conversation,
                        issued_for = %entry.conversation,
                        "Authorization state used for another conversation"
                    );
                    return Err(CorrelationError::Mismatch);
                }

                Ok(conversation)
            }
        }
    }

    /// Number of outstanding nonces, including expired ones not yet pruned.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Default for StateRegistry {
    fn default() -> Self {
        Self::new(StateMode::Verified, DEFAULT_STATE_TTL)
    }
}
