//! Result collections
//!
//! Listing and search queries return a `SummarySet`: lightweight id and name
//! records that each resolve into a full `Resource` with one more request.
//! Summaries never hold nested data and are never refreshed.

mod set;
mod types;

pub use set::SummarySet;
pub use types::{QueryResult, SummaryRecord};
