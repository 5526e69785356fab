//! Background Tasks Module
//!
//! Periodic maintenance that runs alongside the cache.

mod purge;

pub use purge::spawn_purge_task;
