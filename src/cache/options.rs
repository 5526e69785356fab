//! Cache Options Module
//!
//! Construction options and per-call option bundles for the TTL cache.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::Ttl;
use crate::error::{CacheError, Result};

// == Cache Options ==
/// Process-wide default policy of a cache instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtlCacheOptions {
    /// Maximum number of entries, None = unbounded
    pub max: Option<usize>,
    /// Default TTL for entries stored without one
    pub ttl: Option<Ttl>,
    /// Refresh an entry's TTL whenever it is read
    pub update_age_on_get: bool,
    /// Keep the existing TTL when an entry is overwritten
    #[serde(rename = "noUpdateTTL")]
    pub no_update_ttl: bool,
    /// Skip the dispose callback when an overwritten key stays in the cache
    pub no_dispose_on_set: bool,
}

impl TtlCacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = enabled;
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = enabled;
        self
    }

    pub fn no_dispose_on_set(mut self, enabled: bool) -> Self {
        self.no_dispose_on_set = enabled;
        self
    }

    // == Validate ==
    /// Rejects a zero capacity; a cache must be able to hold one entry.
    pub fn validate(&self) -> Result<()> {
        if self.max == Some(0) {
            return Err(CacheError::InvalidOptions(
                "max must be a positive integer".to_string(),
            ));
        }
        Ok(())
    }
}

// == Set Options ==
/// Per-call options for `TtlCache::set`. Unset fields use the cache defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub ttl: Option<Ttl>,
    pub no_update_ttl: Option<bool>,
    pub no_dispose_on_set: Option<bool>,
}

impl SetOptions {
    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = Some(enabled);
        self
    }

    pub fn no_dispose_on_set(mut self, enabled: bool) -> Self {
        self.no_dispose_on_set = Some(enabled);
        self
    }
}

impl From<Ttl> for SetOptions {
    fn from(ttl: Ttl) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::default()
        }
    }
}

impl From<Duration> for SetOptions {
    fn from(duration: Duration) -> Self {
        Ttl::from(duration).into()
    }
}

impl From<Option<Ttl>> for SetOptions {
    fn from(ttl: Option<Ttl>) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }
}

// == Get Options ==
/// Per-call options for `TtlCache::get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetOptions {
    pub update_age_on_get: Option<bool>,
    /// TTL to apply when the age is updated; defaults to the entry's own TTL
    pub ttl: Option<Ttl>,
}

impl GetOptions {
    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = Some(enabled);
        self
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }
}

// == Dispose Reason ==
/// Why an entry left the cache, passed to the dispose callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisposeReason {
    /// Removed to make room for a new entry
    Evict,
    /// Value replaced by an overwrite of the same key
    Set,
    /// Removed by `delete` or `clear`
    Delete,
    /// Found expired and purged
    Stale,
}
