//! Cache Entry Module
//!
//! One stored value with its TTL, deadline and insertion sequence.

use std::time::Instant;

use crate::cache::Ttl;

// == Cache Entry ==
/// Represents a single cache entry with value and expiration metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// TTL the entry was last stored or refreshed with
    pub ttl: Ttl,
    /// Absolute expiration instant, None = never expires
    pub expires_at: Option<Instant>,
    /// Insertion sequence number, breaks ties between equal deadlines
    pub seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    pub fn new(value: V, ttl: Ttl, seq: u64) -> Self {
        Self {
            value,
            ttl,
            expires_at: deadline(Instant::now(), ttl),
            seq,
        }
    }

    // == Refresh ==
    /// Restarts the entry's clock with a new TTL and sequence number.
    pub fn refresh(&mut self, ttl: Ttl, seq: u64) {
        self.ttl = ttl;
        self.expires_at = deadline(Instant::now(), ttl);
        self.seq = seq;
    }

    /// True for entries that never expire.
    pub fn is_immortal(&self) -> bool {
        self.expires_at.is_none()
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, rounded up to whole milliseconds.
    ///
    /// # Returns
    /// - `Ttl::Infinite` if the entry never expires
    /// - `Ttl::ZERO` if the entry has expired
    /// - `Ttl::Millis(remaining)` otherwise
    pub fn remaining_ttl(&self) -> Ttl {
        match self.expires_at {
            None => Ttl::Infinite,
            Some(expires) => {
                let now = Instant::now();
                if expires <= now {
                    return Ttl::ZERO;
                }
                let nanos = (expires - now).as_nanos();
                let ms = nanos.div_ceil(1_000_000);
                Ttl::Millis(u64::try_from(ms).unwrap_or(u64::MAX))
            }
        }
    }
}

// == Utility Functions ==
/// Computes the deadline for `ttl` starting at `now`.
///
/// Finite TTLs too large for the monotonic clock yield no deadline.
pub fn deadline(now: Instant, ttl: Ttl) -> Option<Instant> {
    ttl.as_duration().and_then(|d| now.checked_add(d))
}
