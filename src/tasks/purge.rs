//! Stale Entry Purge Task
//!
//! Expiry is lazy, so an entry nobody reads again stays in memory until it is
//! evicted. This task removes such entries at a fixed interval.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::memo::CacheHandle;

/// Spawns a task that calls `purge_stale` on `cache` every `interval`.
///
/// The task runs until aborted through the returned handle.
///
/// # Example
/// ```ignore
/// let module = TtlCacheModule::register(options)?;
/// let purge = spawn_purge_task(module.cache(), Duration::from_secs(30));
/// // Later, during shutdown:
/// purge.abort();
/// ```
pub fn spawn_purge_task(cache: CacheHandle, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval_millis(interval), "Starting stale entry purge task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_stale();
            if removed > 0 {
                info!(removed, "Purged stale cache entries");
            } else {
                debug!("Purge found no stale entries");
            }
        }
    })
}

/// Whole milliseconds of `interval`, saturating at `u64::MAX`.
fn interval_millis(interval: Duration) -> u64 {
    u64::try_from(interval.as_millis()).unwrap_or(u64::MAX)
}
