//! Server binding module
//!
//! `Jss` ties a `Transport` to the resource `Registry` and is the entry
//! point for queries:
//!
//! ```rust,ignore
//! let jss = Jss::from_config(&ClientConfig::load(path)?)?;
//! let computers = jss.computers("Mac*", QueryOptions::new()).await?.into_records()?;
//! let mut first = computers.resolve(0).await?;
//! first.set("general/asset_tag", "A-100")?;
//! first.save().await?;
//! ```

mod client;
pub mod endpoints;
mod snapshot;

pub use client::{Jss, JssBuilder, DEFAULT_RESOLVE_CONCURRENCY};
pub use endpoints::{CommandStatus, FlushTarget, UploadKey};
pub use snapshot::Snapshot;

#[cfg(test)]
mod tests;
