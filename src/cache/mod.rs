//! Object cache state machine
//!
//! Each resource proxy owns one `CacheTracker`. The tracker records when the
//! proxy's data was last fetched and whether that fetch was a field subset;
//! the public `CacheState` is derived from it on every read, so decay from
//! fresh to stale needs no timer.
//!
//! ```text
//!            construct(name)                 construct(payload with id)
//!                 │                                   │
//!                 ▼          save (POST + GET)        ▼
//!             Unsaved ───────────────────────────▶ Fresh ◀──┐
//!                                                   │  ▲    │ retrieve()
//!                                   age ≥ max_age   │  │    │ save (PUT + GET)
//!                                                   ▼  │    │
//!   construct(summary) ───────────────────────────▶ Stale ──┘
//!
//!   retrieve() with a subset option ──▶ Partial ── field missing ──▶ full fetch ──▶ Fresh
//! ```

mod tracker;
mod types;

pub use tracker::CacheTracker;
pub use types::{CachePolicy, CacheState};

#[cfg(test)]
mod tests;
