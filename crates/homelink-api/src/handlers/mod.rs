//! HTTP request handlers.

pub mod callback;
pub mod health;

pub use callback::*;
pub use health::*;
