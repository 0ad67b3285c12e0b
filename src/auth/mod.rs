//! Authentication module
//!
//! Supports: Basic, static Bearer, and server-issued tokens
//!
//! The `Authenticator` applies credentials to outgoing requests and caches
//! the token for the token flow, refreshing it when it expires or when the
//! server rejects it.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, CachedToken, DEFAULT_TOKEN_SCHEME};
