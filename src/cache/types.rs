//! Cache state and expiry policy

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default maximum age of fetched data, in seconds
pub const DEFAULT_MAX_AGE_SECONDS: i64 = 3600;

/// Relationship between a proxy's local data and the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Local only; the record does not exist on the server yet
    Unsaved,
    /// Complete data fetched at the given time and still within max age
    Fresh(DateTime<Utc>),
    /// A field subset fetched at the given time and still within max age
    Partial(DateTime<Utc>),
    /// Data is expired, invalidated or was never fetched
    Stale,
}

impl CacheState {
    /// True for `Unsaved`
    pub fn is_unsaved(&self) -> bool {
        matches!(self, CacheState::Unsaved)
    }

    /// True for `Fresh`
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheState::Fresh(_))
    }

    /// True for `Partial`
    pub fn is_partial(&self) -> bool {
        matches!(self, CacheState::Partial(_))
    }

    /// True for `Stale`
    pub fn is_stale(&self) -> bool {
        matches!(self, CacheState::Stale)
    }

    /// When the data was fetched, if it is still considered current
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CacheState::Fresh(at) | CacheState::Partial(at) => Some(*at),
            CacheState::Unsaved | CacheState::Stale => None,
        }
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheState::Unsaved => f.write_str("unsaved"),
            CacheState::Fresh(at) => write!(f, "fresh ({})", at.to_rfc3339()),
            CacheState::Partial(at) => write!(f, "partial ({})", at.to_rfc3339()),
            CacheState::Stale => f.write_str("stale"),
        }
    }
}

/// How long fetched data stays current
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Maximum age in seconds; negative never expires, zero is always stale
    pub max_age_seconds: i64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

impl CachePolicy {
    /// Policy with the given maximum age in seconds
    pub fn new(max_age_seconds: i64) -> Self {
        Self { max_age_seconds }
    }

    /// Fetched data never expires
    pub fn never_expire() -> Self {
        Self::new(-1)
    }

    /// Every read forces a fetch
    pub fn always_stale() -> Self {
        Self::new(0)
    }

    /// Whether data fetched at `fetched_at` has expired by `now`
    pub fn is_expired(&self, fetched_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.max_age_seconds < 0 {
            return false;
        }
        now - fetched_at >= Duration::seconds(self.max_age_seconds)
    }
}
