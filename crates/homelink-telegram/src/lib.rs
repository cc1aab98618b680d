//! Telegram bot that links a chat to a smart-home account.
//!
//! A user sends `/start`, follows the authorization link and grants access
//! at the provider. The provider redirects to the callback server from
//! `homelink-api`, which stores the credential for that chat. `/devices`
//! then lists the account's devices.
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `HOMELINK_CLIENT_ID`, `HOMELINK_CLIENT_SECRET`: OAuth application
//!
//! See [`homelink_core::config`] for the optional settings.
//!
//! # Commands
//!
//! - `/start` - Send an authorization link
//! - `/devices` - List devices of the linked account
//!
//! Anything else is ignored.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod messenger;

pub use bot::TelegramBot;
pub use error::{Result, TelegramError};
pub use handlers::{render_devices, Command, CommandHandler};
pub use messenger::Messenger;
