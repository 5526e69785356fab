//! Expiration Index Module
//!
//! Orders cache keys by deadline for eviction and traversal.

use std::collections::BTreeMap;
use std::time::Instant;

// == Expiration Index ==
/// Tracks keys ordered by expiration.
///
/// Finite entries are keyed by `(deadline, seq)`:
/// - Front = expires soonest
/// - Back = expires latest
///
/// Equal deadlines fall back to insertion sequence. Immortal entries are kept
/// apart, ordered by sequence only, and never appear in `iter`.
#[derive(Debug)]
pub struct ExpirationIndex<K> {
    finite: BTreeMap<(Instant, u64), K>,
    immortal: BTreeMap<u64, K>,
}

impl<K> Default for ExpirationIndex<K> {
    fn default() -> Self {
        Self {
            finite: BTreeMap::new(),
            immortal: BTreeMap::new(),
        }
    }
}

impl<K> ExpirationIndex<K> {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Tracks a key under its deadline (None = immortal).
    pub fn insert(&mut self, key: K, expires_at: Option<Instant>, seq: u64) {
        match expires_at {
            Some(at) => {
                self.finite.insert((at, seq), key);
            }
            None => {
                self.immortal.insert(seq, key);
            }
        }
    }

    // == Remove ==
    /// Stops tracking the key stored under this deadline and sequence.
    pub fn remove(&mut self, expires_at: Option<Instant>, seq: u64) -> Option<K> {
        match expires_at {
            Some(at) => self.finite.remove(&(at, seq)),
            None => self.immortal.remove(&seq),
        }
    }

    // == Peek Nearest ==
    /// Returns the next eviction candidate.
    ///
    /// The soonest finite deadline wins; immortal keys are only offered once
    /// no finite key is left, oldest first.
    pub fn peek_nearest(&self) -> Option<&K> {
        self.finite
            .values()
            .next()
            .or_else(|| self.immortal.values().next())
    }

    // == Iter ==
    /// Finite keys in ascending deadline order.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.finite.values()
    }

    // == Expired ==
    /// Keys whose deadline is at or before `now`, soonest first.
    pub fn expired(&self, now: Instant) -> impl Iterator<Item = &K> + '_ {
        self.finite
            .iter()
            .take_while(move |((at, _), _)| *at <= now)
            .map(|(_, key)| key)
    }

    // == Length ==
    /// Number of tracked keys, immortal ones included.
    pub fn len(&self) -> usize {
        self.finite.len() + self.immortal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finite.is_empty() && self.immortal.is_empty()
    }

    pub fn clear(&mut self) {
        self.finite.clear();
        self.immortal.clear();
    }
}
