//! Command handlers for the Telegram bot.

use std::sync::Arc;

use homelink_core::{ConversationId, Device, DeviceSource, OAuthClient, SessionStore, StateRegistry};
use teloxide::utils::command::BotCommands;
use tracing::{error, info};

use crate::error::Result;
use crate::messenger::Messenger;

/// Prefix of the `/start` reply; the authorization URL follows.
pub const AUTHORIZE_PREFIX: &str = "Click to authorize: ";

/// Reply to `/devices` before any successful authorization.
pub const AUTHORIZE_FIRST: &str = "Please authorize first using /start";

/// Reply when the device API call fails.
pub const FETCH_ERROR: &str = "Error fetching devices";

/// Reply when the account has no devices.
pub const NO_DEVICES: &str = "You have no devices yet.";

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Link your smart-home account")]
    Start,

    #[command(description = "List your devices")]
    Devices,
}

/// Executes chat commands against the shared stores and clients.
pub struct CommandHandler {
    oauth: Arc<OAuthClient>,
    states: Arc<StateRegistry>,
    sessions: Arc<dyn SessionStore>,
    devices: Arc<dyn DeviceSource>,
}

impl CommandHandler {
    /// Create a handler.
    pub fn new(
        oauth: Arc<OAuthClient>,
        states: Arc<StateRegistry>,
        sessions: Arc<dyn SessionStore>,
        devices: Arc<dyn DeviceSource>,
    ) -> Self {
        Self {
            oauth,
            states,
            sessions,
            devices,
        }
    }

    /// Run `command` for `conversation` and send the reply.
    pub async fn handle(
        &self,
        messenger: &dyn Messenger,
        conversation: ConversationId,
        command: Command,
    ) -> Result<()> {
        let reply = self.reply(conversation, command).await;
        messenger.send_text(conversation, &reply).await
    }

    /// Compute the reply for `command` without sending it.
    pub async fn reply(&self, conversation: ConversationId, command: Command) -> String {
        match command {
            Command::Start => self.start(conversation).await,
            Command::Devices => self.devices(conversation).await,
        }
    }

    /// `/start` always issues a fresh authorization link; an existing
    /// credential stays in place until a new exchange succeeds.
    async fn start(&self, conversation: ConversationId) -> String {
        let state = self.states.issue(conversation).await;
        let url = self.oauth.authorization_url(&state);
        info!(chat_id = %conversation, "Sent authorization link");
        format!("{AUTHORIZE_PREFIX}{url}")
    }

    async fn devices(&self, conversation: ConversationId) -> String {
        let Some(credential) = self.sessions.get(conversation).await else {
            return AUTHORIZE_FIRST.to_string();
        };

        match self.devices.list_devices(&credential).await {
            Ok(devices) => {
                info!(chat_id = %conversation, count = devices.len(), "Listed devices");
                render_devices(&devices)
            }
            Err(e) => {
                error!(chat_id = %conversation, error = %e, "Error getting devices");
                FETCH_ERROR.to_string()
            }
        }
    }
}

/// Render one `— <name> (<type>)` line per device, in order.
pub fn render_devices(devices: &[Device]) -> String {
    if devices.is_empty() {
        return NO_DEVICES.to_string();
    }

    let mut response = String::from("Your devices:\n");
    for device in devices {
        response.push_str(&format!("— {} ({})\n", device.name, device.kind));
    }
    response
}
