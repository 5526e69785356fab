//! Per-type instance counters for isolated services.

use std::any::TypeId;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

// == Isolation Registry ==
/// Hands out instance ids, starting at 1, separately for every service type.
#[derive(Debug, Default)]
pub struct IsolationRegistry {
    counters: DashMap<TypeId, AtomicU64>,
}

impl IsolationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id<S: 'static>(&self) -> u64 {
        self.counters
            .entry(TypeId::of::<S>())
            .or_default()
            .fetch_add(1, Ordering::SeqCst)
            + 1
    }

    /// Number of ids handed out for `S` so far.
    pub fn instances<S: 'static>(&self) -> u64 {
        self.counters
            .get(&TypeId::of::<S>())
            .map_or(0, |counter| counter.load(Ordering::SeqCst))
    }
}
