//! OAuth callback server for Homelink.
//!
//! The smart-home provider redirects the user's browser here after consent.
//! The handler resolves the `state` parameter back to the Telegram
//! conversation, exchanges the code for a credential and stores it in the
//! shared [`homelink_core::SessionStore`].
//!
//! Routes:
//! - `GET /oauth_callback?state=..&code=..` - complete an authorization
//! - `GET /health` - liveness probe
//!
//! # Example
//!
//! ```ignore
//! use homelink_api::{ApiConfig, AppState, serve};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(/* ... */);
//!     serve(ApiConfig::default(), state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{bind, create_router, serve, serve_listener, CALLBACK_PATH};
pub use state::AppState;
