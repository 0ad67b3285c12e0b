//! Per-proxy cache bookkeeping

use super::types::{CachePolicy, CacheState};
use chrono::{DateTime, Utc};
use tracing::debug;

/// What is known about the last fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Built locally, never sent to the server
    Local,
    /// Fetched from the server
    Fetched { at: DateTime<Utc>, partial: bool },
    /// Exists on the server; nothing has been fetched yet
    Unfetched,
    /// Exists on the server but the local data is not current
    Invalidated,
}

/// Tracks fetch time, subset status and pending local edits of one proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTracker {
    origin: Origin,
    dirty: bool,
}

impl CacheTracker {
    /// Tracker for a record that only exists locally
    pub fn unsaved() -> Self {
        Self {
            origin: Origin::Local,
            dirty: false,
        }
    }

    /// Tracker for data just received from the server
    pub fn fetched(at: DateTime<Utc>, partial: bool) -> Self {
        Self {
            origin: Origin::Fetched { at, partial },
            dirty: false,
        }
    }

    /// Tracker for a record known to exist but not yet fetched
    pub fn unfetched() -> Self {
        Self {
            origin: Origin::Unfetched,
            dirty: false,
        }
    }

    /// Tracker for a record whose local copy is out of date
    pub fn stale() -> Self {
        Self {
            origin: Origin::Invalidated,
            dirty: false,
        }
    }

    /// Current state, applying time decay
    pub fn state(&self, policy: &CachePolicy, now: DateTime<Utc>) -> CacheState {
        match self.origin {
            Origin::Local => CacheState::Unsaved,
            Origin::Unfetched | Origin::Invalidated => CacheState::Stale,
            Origin::Fetched { at, .. } if policy.is_expired(at, now) => CacheState::Stale,
            Origin::Fetched { at, partial: true } => CacheState::Partial(at),
            Origin::Fetched { at, partial: false } => CacheState::Fresh(at),
        }
    }

    /// Whether reading a field must fetch first.
    ///
    /// Unsaved records and records with pending local edits are never
    /// fetched implicitly, except a never-fetched record whose edits do not
    /// cover the field. Stale records always are; partial records only
    /// when the requested field was not part of the subset.
    pub fn must_fetch(&self, policy: &CachePolicy, now: DateTime<Utc>, field_present: bool) -> bool {
        if self.dirty {
            return self.origin == Origin::Unfetched && !field_present;
        }
        match self.state(policy, now) {
            CacheState::Unsaved | CacheState::Fresh(_) => false,
            CacheState::Stale => true,
            CacheState::Partial(_) => !field_present,
        }
    }

    /// Record a completed fetch; discards the pending-edit flag
    pub fn mark_fetched(&mut self, at: DateTime<Utc>, partial: bool) {
        debug!(partial, "cache: fetched at {}", at.to_rfc3339());
        self.origin = Origin::Fetched { at, partial };
        self.dirty = false;
    }

    /// Force the next field read to fetch (no effect on unsaved records)
    pub fn invalidate(&mut self) {
        if self.origin != Origin::Local {
            debug!("cache: invalidated");
            self.origin = Origin::Invalidated;
        }
    }

    /// Mark the record as existing only locally, e.g. after a delete
    pub fn mark_unsaved(&mut self) {
        debug!("cache: unsaved");
        self.origin = Origin::Local;
    }

    /// Note a local edit not yet saved
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether there are local edits not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the local data holds nothing from the server yet
    pub fn is_unfetched(&self) -> bool {
        self.origin == Origin::Unfetched
    }

    /// Whether the record exists on the server as far as we know
    pub fn is_remote(&self) -> bool {
        self.origin != Origin::Local
    }
}

impl Default for CacheTracker {
    fn default() -> Self {
        Self::unsaved()
    }
}
