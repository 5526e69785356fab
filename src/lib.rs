//! ttl_memo - In-process TTL cache with method memoization
//!
//! A bounded key/value cache with per-entry expiration, plus adapters that
//! memoize sync and async service methods in it, sharing in-flight async
//! calls between concurrent callers.

pub mod cache;
pub mod config;
pub mod error;
pub mod memo;
pub mod module;
pub mod tasks;

pub use cache::{Ttl, TtlCache, TtlCacheOptions};
pub use config::Config;
pub use error::{CacheError, Result};
pub use memo::{with_cache, with_cache_async, CacheBinding, CacheHandle, Cached, CachedAsync};
pub use module::{Cacheable, TtlCacheModule};
pub use tasks::spawn_purge_task;
