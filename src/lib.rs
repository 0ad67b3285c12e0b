// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # jss-client
//!
//! Async client for the Jamf Pro server (JSS) REST API.
//!
//! Every resource type the server exposes is described by a catalog entry.
//! Queries return either a `SummarySet` (the lightweight listing) or a
//! `Resource` proxy that fetches lazily, caches what it fetched and knows
//! whether that copy is fresh, partial or stale.
//!
//! ## Features
//!
//! - **Classic and Pro APIs**: XML `JSSResource` endpoints and JSON `api/v1` endpoints
//! - **Lazy proxies**: data is fetched on first access and refreshed when stale
//! - **Subsets**: partial records upgrade themselves when a missing section is read
//! - **Token or Basic auth**: bearer tokens are cached and refreshed on 401
//! - **Distribution points**: copy packages and scripts to shares and buckets
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jss_client::{ClientConfig, Jss, QueryOptions, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::new("https://jss.example.com:8443", "api", "secret");
//!     let jss = Jss::from_config(&config)?;
//!
//!     // Listing
//!     let policies = jss.policies(None::<u64>, QueryOptions::new()).await?.into_records()?;
//!     println!("{policies}");
//!
//!     // One record, fetched lazily and cached
//!     let mut policy = policies.resolve(0).await?;
//!     policy.set("general/enabled", "false")?;
//!     policy.save().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                              Jss                                │
//! │   query(kind, search, options) → Resource | SummarySet          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Catalog  │   Query   │   Resource    │   Cache   │  Transport  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ 68 types │ id/name   │ get/set       │ Unsaved   │ reqwest     │
//! │ verbs    │ match     │ save/delete   │ Fresh     │ Basic/Token │
//! │ search   │ key=value │ helpers       │ Partial   │ XML/JSON    │
//! │ keys     │ subset    │               │ Stale     │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)] // TODO: Document every public field before 1.0

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Client configuration file
pub mod config;

/// Authentication implementations
pub mod auth;

/// HTTP transport
pub mod http;

/// XML reader/writer and serialized documents
pub mod decode;

/// Resource type catalog
pub mod catalog;

/// Request path construction
pub mod query;

/// Cache states and expiry
pub mod cache;

/// Resource proxies and type helpers
pub mod resource;

/// Listing results
pub mod summary;

/// Server binding
pub mod jss;

/// Distribution points for packages and scripts
pub mod distribution;

/// Command-line interface
pub mod cli;

#[cfg(test)]
pub(crate) mod test_support;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use cache::{CachePolicy, CacheState};
pub use catalog::{Registry, ResourceDescriptor};
pub use config::ClientConfig;
pub use decode::Document;
pub use jss::{Jss, JssBuilder, Snapshot};
pub use query::{QueryOptions, SearchArg};
pub use resource::{Resource, Seed};
pub use summary::{QueryResult, SummaryRecord, SummarySet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
