//! Core logic for Homelink, a Telegram bot for smart-home device listings.
//!
//! This crate holds everything the chat bot and the OAuth callback server
//! share:
//!
//! - [`SessionStore`]: one credential per conversation, last write wins
//! - [`StateRegistry`]: ties the OAuth `state` on the callback back to the
//!   conversation that sent `/start`
//! - [`OAuthClient`]: authorization URL and code exchange
//! - [`DeviceClient`]: read-only device listing
//! - [`Settings`]: configuration from the environment
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use homelink_core::{
//!     ConversationId, MemorySessionStore, OAuthClient, SessionStore, Settings, StateRegistry,
//! };
//!
//! # async fn example() -> homelink_core::Result<()> {
//! let settings = Settings::from_env()?;
//! let oauth = OAuthClient::new(settings.oauth.clone(), settings.http_timeout)?;
//! let states = StateRegistry::new(settings.state_mode, settings.state_ttl);
//! let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
//!
//! let state = states.issue(ConversationId(7)).await;
//! println!("Open {}", oauth.authorization_url(&state));
//! # let _ = sessions;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod correlation;
pub mod devices;
pub mod error;
pub mod models;
pub mod oauth;
pub mod session;

pub use config::{EnvFiles, OAuthSettings, Settings};
pub use correlation::{PendingAuthorization, StateMode, StateRegistry};
pub use devices::{DeviceClient, DeviceSource};
pub use error::{CoreError, CorrelationError, Result};
pub use models::{ConversationId, Credential, Device, DeviceList, TokenResponse};
pub use oauth::{OAuthClient, TokenExchange};
pub use session::{MemorySessionStore, SessionStore};
