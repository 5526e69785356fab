//! Cache Module
//!
//! In-memory TTL cache with expiration-ordered eviction and traversal.

mod entry;
mod expirations;
mod options;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::CacheEntry;
pub use expirations::ExpirationIndex;
pub use options::{DisposeReason, GetOptions, SetOptions, TtlCacheOptions};
pub use stats::CacheStats;
pub use store::{DisposeFn, TtlCache};
pub use ttl::Ttl;
