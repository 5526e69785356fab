//! Memoization of synchronous methods.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::memo::{CacheArgumentOptions, CacheBinding, CacheKey, CacheSlot, CachedOptions};

type SyncFn<A, T> = Box<dyn Fn(&A) -> T + Send + Sync>;

// == Cached ==
/// A synchronous method whose results are kept in the module cache.
pub struct Cached<A, T> {
    binding: CacheBinding,
    method: &'static str,
    options: CachedOptions<A>,
    func: SyncFn<A, T>,
    warned: AtomicBool,
}

/// Wraps `func` as the cached method `method` of the bound instance.
///
/// `options` takes a full `CachedOptions`, or just a `Ttl`.
pub fn with_cache<A, T, F>(
    binding: &CacheBinding,
    method: &'static str,
    options: impl Into<CachedOptions<A>>,
    func: F,
) -> Cached<A, T>
where
    F: Fn(&A) -> T + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    Cached {
        binding: binding.clone(),
        method,
        options: options.into(),
        func: Box::new(func),
        warned: AtomicBool::new(false),
    }
}

impl<A, T> Cached<A, T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn call(&self, args: A) -> T {
        self.call_with(args, None)
    }

    // == Call With ==
    /// Returns the cached result for `args`, or runs the method and stores
    /// what it returns.
    ///
    /// A result that cannot be stored is still returned.
    pub fn call_with(&self, args: A, options: Option<CacheArgumentOptions>) -> T {
        let Some(cache) = self.binding.cache() else {
            self.warn_detached();
            return (self.func)(&args);
        };

        let policy = self.options.merge(self.method, options.as_ref());
        let key = self.key_for(&args, policy.use_shared_cache);

        if !policy.ignore_cached {
            let hit = cache
                .lock()
                .get(&key, policy.get_options())
                .and_then(CacheSlot::ready_value::<T>);
            if let Some(value) = hit {
                debug!(key = %key, "cache hit");
                return value;
            }
        }

        let value = (self.func)(&args);
        let stored = cache
            .lock()
            .set(key.clone(), CacheSlot::ready(value.clone()), policy.set_options())
            .map(|_| ());
        if let Err(error) = stored {
            warn!(key = %key, %error, "result not cached");
        }
        value
    }

    /// The key a call with `args` reads and writes.
    pub fn cache_key(&self, args: &A, options: Option<&CacheArgumentOptions>) -> CacheKey {
        let policy = self.options.merge(self.method, options);
        self.key_for(args, policy.use_shared_cache)
    }

    pub fn options(&self) -> &CachedOptions<A> {
        &self.options
    }

    fn key_for(&self, args: &A, use_shared_cache: bool) -> CacheKey {
        let hash = self.options.hash(args);
        self.binding
            .key(self.method, use_shared_cache, hash.as_deref())
    }

    fn warn_detached(&self) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            warn!(
                class = self.binding.class_name(),
                method = self.method,
                "no cache bound to this instance, results will not be cached"
            );
        }
    }
}
