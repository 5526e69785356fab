//! Memo Module
//!
//! Method-level memoization on top of a module's shared TTL cache: key
//! composition, the sync and async call adapters, and their policies.

mod binding;
mod cached;
mod cached_async;
mod key;
mod options;
mod slot;

pub use binding::CacheBinding;
pub use cached::{with_cache, Cached};
pub use cached_async::{with_cache_async, CachedAsync};
pub use key::{compose_key, wrap_cache_key, CacheKey};
pub use options::{CacheArgumentOptions, CachedAsyncOptions, CachedOptions, HashFunction};
pub use slot::{CacheHandle, CacheSlot, DisposeHook, PendingSlot, SharedCache};
