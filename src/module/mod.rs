//! Module Registration
//!
//! Owns the cache of a registration and binds service instances to it.

mod cacheable;
mod isolation;
mod registration;

pub use cacheable::Cacheable;
pub use isolation::IsolationRegistry;
pub use registration::{
    TtlCacheAsyncModuleOptions, TtlCacheModule, TtlCacheModuleOptions, TtlCacheOptionsFactory,
};
