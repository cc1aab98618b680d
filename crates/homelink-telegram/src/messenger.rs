//! Outbound chat transport.

use async_trait::async_trait;
use homelink_core::ConversationId;
use teloxide::prelude::*;

use crate::error::Result;

/// Sends text to a conversation.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver `text` to `conversation`.
    async fn send_text(&self, conversation: ConversationId, text: &str) -> Result<()>;
}

#[async_trait]
impl Messenger for Bot {
    async fn send_text(&self, conversation: ConversationId, text: &str) -> Result<()> {
        self.send_message(ChatId(conversation.as_i64()), text).await?;
        Ok(())
    }
}
