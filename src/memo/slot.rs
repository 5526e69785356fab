//! Shared cache handle and the slots stored in it.
//!
//! One cache holds results of many methods with different return types, so
//! values are stored type-erased and downcast on the way out.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::cache::{CacheStats, DisposeReason, TtlCache, TtlCacheOptions};
use crate::error::Result;
use crate::memo::CacheKey;

// == Cache Slot ==
/// A memoized value, or an operation still in flight.
#[derive(Clone)]
pub enum CacheSlot {
    Ready(Arc<dyn Any + Send + Sync>),
    Pending(PendingSlot),
}

/// In-flight async operation shared by every caller of the same key.
#[derive(Clone)]
pub struct PendingSlot {
    id: u64,
    operation: Arc<dyn Any + Send + Sync>,
}

impl CacheSlot {
    pub fn ready<T: Any + Send + Sync>(value: T) -> Self {
        CacheSlot::Ready(Arc::new(value))
    }

    pub(crate) fn pending<P: Any + Send + Sync>(id: u64, operation: P) -> Self {
        CacheSlot::Pending(PendingSlot {
            id,
            operation: Arc::new(operation),
        })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CacheSlot::Pending(_))
    }

    /// Clones the stored value if it is ready and of type `T`.
    pub fn ready_value<T: Any + Clone>(&self) -> Option<T> {
        match self {
            CacheSlot::Ready(value) => value.downcast_ref::<T>().cloned(),
            CacheSlot::Pending(_) => None,
        }
    }

    pub(crate) fn pending_operation<P: Any + Clone>(&self) -> Option<P> {
        match self {
            CacheSlot::Pending(pending) => pending.operation.downcast_ref::<P>().cloned(),
            CacheSlot::Ready(_) => None,
        }
    }

    pub(crate) fn pending_id(&self) -> Option<u64> {
        match self {
            CacheSlot::Pending(pending) => Some(pending.id),
            CacheSlot::Ready(_) => None,
        }
    }
}

impl fmt::Debug for CacheSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheSlot::Ready(_) => f.write_str("Ready(..)"),
            CacheSlot::Pending(pending) => write!(f, "Pending(#{})", pending.id),
        }
    }
}

pub type SharedCache = TtlCache<CacheKey, CacheSlot>;

// == Dispose Hook ==
/// Shareable dispose callback for a module's cache.
#[derive(Clone)]
pub struct DisposeHook(Arc<dyn Fn(CacheSlot, &CacheKey, DisposeReason) + Send + Sync>);

impl DisposeHook {
    pub fn new<F>(dispose: F) -> Self
    where
        F: Fn(CacheSlot, &CacheKey, DisposeReason) + Send + Sync + 'static,
    {
        Self(Arc::new(dispose))
    }

    pub fn call(&self, slot: CacheSlot, key: &CacheKey, reason: DisposeReason) {
        (self.0)(slot, key, reason)
    }
}

impl fmt::Debug for DisposeHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DisposeHook(..)")
    }
}

impl PartialEq for DisposeHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DisposeHook {}

// == Cache Handle ==
/// Cloneable handle to the cache instance owned by a registered module.
#[derive(Clone)]
pub struct CacheHandle {
    inner: Arc<Mutex<SharedCache>>,
}

impl CacheHandle {
    pub fn new(options: TtlCacheOptions) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(Mutex::new(TtlCache::new(options)?)),
        })
    }

    /// Locks the cache.
    ///
    /// The guard must not be held across an `.await` or while user code runs.
    pub fn lock(&self) -> MutexGuard<'_, SharedCache> {
        // A panic elsewhere never leaves the cache half-updated
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates a cache that reports every slot leaving it to `dispose`.
    ///
    /// The callback runs with the cache locked and must not use the handle.
    pub fn with_dispose<F>(options: TtlCacheOptions, dispose: F) -> Result<Self>
    where
        F: Fn(CacheSlot, &CacheKey, DisposeReason) + Send + 'static,
    {
        Ok(Self {
            inner: Arc::new(Mutex::new(TtlCache::with_dispose(options, dispose)?)),
        })
    }

    pub fn ptr_eq(&self, other: &CacheHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakCacheHandle {
        WeakCacheHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn purge_stale(&self) -> usize {
        self.lock().purge_stale()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("CacheHandle");
        match self.inner.try_lock() {
            Ok(cache) => out.field("cache", &*cache),
            Err(_) => out.field("cache", &"<locked>"),
        };
        out.finish()
    }
}

/// Handle held by in-flight operations so a pending slot does not keep its
/// own cache alive.
#[derive(Clone)]
pub(crate) struct WeakCacheHandle {
    inner: Weak<Mutex<SharedCache>>,
}

impl WeakCacheHandle {
    pub(crate) fn upgrade(&self) -> Option<CacheHandle> {
        self.inner.upgrade().map(|inner| CacheHandle { inner })
    }
}
