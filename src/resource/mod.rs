//! Resource proxies
//!
//! One `Resource` type serves every resource type; what differs between
//! types lives in its `ResourceDescriptor`. Behavior specific to a few types
//! (policy scope, group membership, device identifiers) is in `helpers`.
//!
//! # Lifecycle
//!
//! - built from a full record: fresh (partial when fetched with a subset)
//! - built from a name: unsaved, id `"0"`, filled from the type's template
//! - built from a summary: stale until the first fetch
//!
//! `save` creates (POST) unsaved records and updates (PUT) the rest, then
//! fetches the record back so server-assigned fields are current.

pub mod helpers;
mod proxy;

pub use proxy::{Resource, Seed, UNSAVED_ID};
