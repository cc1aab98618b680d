//! Main Telegram bot implementation.

use std::sync::Arc;

use homelink_core::ConversationId;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::error::{Result, TelegramError};
use crate::handlers::{Command, CommandHandler};

/// The Homelink Telegram bot.
pub struct TelegramBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Command logic shared with every update.
    handler: Arc<CommandHandler>,
}

impl TelegramBot {
    /// Create a bot from a token and a command handler.
    pub fn new(token: impl Into<String>, handler: CommandHandler) -> Self {
        Self {
            bot: Bot::new(token),
            handler: Arc::new(handler),
        }
    }

    /// Get the bot's username. Fails when the token is rejected.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Publish the command list shown in Telegram's command menu.
    pub async fn register_commands(&self) -> Result<()> {
        self.bot.set_my_commands(Command::bot_commands()).await?;
        Ok(())
    }

    /// Run the long-polling loop until Ctrl+C.
    ///
    /// Updates are handled one at a time, in arrival order.
    pub async fn start_polling(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        if let Err(e) = self.register_commands().await {
            warn!(error = %e, "Could not register bot commands");
        }

        let handler = Arc::clone(&self.handler);

        let tree = Update::filter_message().filter_command::<Command>().endpoint(
            move |bot: Bot, msg: Message, cmd: Command| {
                let handler = Arc::clone(&handler);
                async move {
                    let conversation = ConversationId(msg.chat.id.0);
                    info!(chat_id = %conversation, "Command matched: {:?}", cmd);
                    if let Err(e) = handler.handle(&bot, conversation, cmd).await {
                        warn!(chat_id = %conversation, error = %e, "Failed to send reply");
                    }
                    respond(())
                }
            },
        );

        info!("Bot is running! Send /start to begin.");

        Dispatcher::builder(self.bot.clone(), tree)
            .default_handler(|upd| async move {
                debug!(update_id = ?upd.id, "Ignoring update");
            })
            .distribution_function(|_| Some(()))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot stopped");
        Ok(())
    }
}
