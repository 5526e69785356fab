//! Memoization of asynchronous methods with single-flight sharing.
//!
//! While a call is in flight its shared future sits in the cache under the
//! call's key, so concurrent callers await the same operation instead of
//! starting their own. The future settles its own slot when it completes:
//! a success replaces it with the value, a failure removes it. Started
//! calls are driven on the tokio runtime, so they finish even when every
//! caller has stopped waiting.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::cache::SetOptions;
use crate::memo::options::CallPolicy;
use crate::memo::{
    CacheArgumentOptions, CacheBinding, CacheHandle, CacheKey, CacheSlot, CachedAsyncOptions,
};

type AsyncFn<A, T, E> = Box<dyn Fn(A) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;
type SharedCall<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

static NEXT_PENDING_ID: AtomicU64 = AtomicU64::new(1);

// == Cached Async ==
/// An async method whose results, and in-flight calls, are kept in the
/// module cache.
pub struct CachedAsync<A, T, E> {
    binding: CacheBinding,
    method: &'static str,
    options: CachedAsyncOptions<A>,
    func: AsyncFn<A, T, E>,
    warned: AtomicBool,
}

/// Wraps the async `func` as the cached method `method` of the bound
/// instance. Only `Ok` results are ever stored.
pub fn with_cache_async<A, T, E, F, Fut>(
    binding: &CacheBinding,
    method: &'static str,
    options: impl Into<CachedAsyncOptions<A>>,
    func: F,
) -> CachedAsync<A, T, E>
where
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    CachedAsync {
        binding: binding.clone(),
        method,
        options: options.into(),
        func: Box::new(move |args| func(args).boxed()),
        warned: AtomicBool::new(false),
    }
}

enum Lookup<T, E> {
    Ready(T),
    Pending(SharedCall<T, E>),
    Miss,
}

impl<A, T, E> CachedAsync<A, T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub async fn call(&self, args: A) -> Result<T, E> {
        self.call_with(args, None).await
    }

    // == Call With ==
    /// Returns the stored value, joins a call already in flight for the same
    /// key, or starts the operation.
    pub async fn call_with(&self, args: A, options: Option<CacheArgumentOptions>) -> Result<T, E> {
        let Some(cache) = self.binding.cache() else {
            self.warn_detached();
            return (self.func)(args).await;
        };

        let policy = self.options.cached.merge(self.method, options.as_ref());
        let key = self.key_for(&args, policy.use_shared_cache);

        if !policy.ignore_cached {
            match lookup(cache, &key, &policy) {
                Lookup::Ready(value) => {
                    debug!(key = %key, "cache hit");
                    return Ok(value);
                }
                Lookup::Pending(operation) => {
                    debug!(key = %key, "joining in-flight call");
                    return operation.await;
                }
                Lookup::Miss => {}
            }
        }

        let operation = (self.func)(args);
        let set_options = policy.set_options();
        let cache_result = self.options.cache_promise_result;
        let pending_id = self
            .options
            .cache_promise
            .then(|| NEXT_PENDING_ID.fetch_add(1, Ordering::Relaxed));

        let owner = cache.downgrade();
        let settle_key = key.clone();
        let call: SharedCall<T, E> = async move {
            let result = operation.await;
            if let Some(cache) = owner.upgrade() {
                settle(&cache, &settle_key, pending_id, &result, cache_result, set_options);
            }
            result
        }
        .boxed()
        .shared();

        if let Some(id) = pending_id {
            let stored = cache
                .lock()
                .set(key.clone(), CacheSlot::pending(id, call.clone()), set_options)
                .map(|_| ());
            if let Err(error) = stored {
                warn!(key = %key, %error, "in-flight call not shared");
            }
        }

        drive(call.clone());
        call.await
    }

    /// The key a call with `args` reads and writes.
    pub fn cache_key(&self, args: &A, options: Option<&CacheArgumentOptions>) -> CacheKey {
        let policy = self.options.cached.merge(self.method, options);
        self.key_for(args, policy.use_shared_cache)
    }

    pub fn options(&self) -> &CachedAsyncOptions<A> {
        &self.options
    }

    fn key_for(&self, args: &A, use_shared_cache: bool) -> CacheKey {
        let hash = self.options.cached.hash(args);
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

fn lookup<T, E>(cache: &CacheHandle, key: &CacheKey, policy: &CallPolicy) -> Lookup<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    let mut cache = cache.lock();
    let Some(slot) = cache.get(key, policy.get_options()) else {
        return Lookup::Miss;
    };
    if let Some(value) = slot.ready_value::<T>() {
        return Lookup::Ready(value);
    }
    match slot.pending_operation::<SharedCall<T, E>>() {
        Some(operation) => Lookup::Pending(operation),
        None => Lookup::Miss,
    }
}

/// Keeps a started call running to completion even when every caller stops
/// waiting for it.
fn drive<T, E>(call: SharedCall<T, E>)
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(call.map(|_| ()));
        }
        Err(_) => debug!("no tokio runtime, call only runs while awaited"),
    }
}

// == Settle ==
/// Records the outcome of a finished call.
///
/// A call that put a pending slot in the cache only touches the key while
/// that slot is still its own, or the key is empty: a success replaces it
/// with the value when `cache_result` is set, anything else removes it. A
/// call without a pending slot stores its success unconditionally.
fn settle<T, E>(
    cache: &CacheHandle,
    key: &CacheKey,
    pending_id: Option<u64>,
    result: &Result<T, E>,
    cache_result: bool,
    set_options: SetOptions,
) where
    T: Clone + Send + Sync + 'static,
{
    let mut cache = cache.lock();
    let current = cache.peek(key).map(CacheSlot::pending_id);
    let ours = pending_id.is_some() && current == Some(pending_id);

    match result {
        Ok(value) if cache_result => {
            if pending_id.is_some() && !ours && current.is_some() {
                debug!(key = %key, "newer entry kept, result dropped");
                return;
            }
            let stored = cache
                .set(key.clone(), CacheSlot::ready(value.clone()), set_options)
                .map(|_| ());
            if let Err(error) = stored {
                warn!(key = %key, %error, "result not cached");
            }
        }
        _ => {
            if ours {
                cache.delete(key);
                debug!(key = %key, failed = result.is_err(), "in-flight slot released");
            }
        }
    }
}
