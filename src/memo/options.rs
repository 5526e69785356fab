//! Memoization policies and per-call overrides.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::cache::{GetOptions, SetOptions, Ttl};

/// Turns call arguments into the key suffix identifying one result.
pub type HashFunction<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

// == Cached Options ==
/// Policy attached to one synchronous cached method.
///
/// Unset cache options fall back to the module's cache defaults.
pub struct CachedOptions<A> {
    pub ttl: Option<Ttl>,
    /// Without a hash function every call shares the method's single key
    pub hash_function: Option<HashFunction<A>>,
    /// Honor `CacheArgumentOptions` passed with each call
    pub use_argument_options: bool,
    /// Isolated instances still read and write the class-wide key
    pub use_shared_cache: bool,
    pub update_age_on_get: Option<bool>,
    pub no_update_ttl: Option<bool>,
    pub no_dispose_on_set: Option<bool>,
}

impl<A> CachedOptions<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy whose only setting is a hash function.
    pub fn hashed<F>(hash_function: F) -> Self
    where
        F: Fn(&A) -> String + Send + Sync + 'static,
    {
        Self::new().hash_function(hash_function)
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    pub fn hash_function<F>(mut self, hash_function: F) -> Self
    where
        F: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.hash_function = Some(Arc::new(hash_function));
        self
    }

    pub fn use_argument_options(mut self, enabled: bool) -> Self {
        self.use_argument_options = enabled;
        self
    }

    pub fn use_shared_cache(mut self, enabled: bool) -> Self {
        self.use_shared_cache = enabled;
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = Some(enabled);
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = Some(enabled);
        self
    }

    pub fn no_dispose_on_set(mut self, enabled: bool) -> Self {
        self.no_dispose_on_set = Some(enabled);
        self
    }

    pub(crate) fn hash(&self, args: &A) -> Option<String> {
        self.hash_function.as_ref().map(|hash| hash(args))
    }

    // == Merge ==
    /// Resolves the effective policy of one call; call options win over
    /// this policy.
    pub(crate) fn merge(&self, method: &str, call: Option<&CacheArgumentOptions>) -> CallPolicy {
        let call = match call {
            Some(call) if self.use_argument_options => *call,
            Some(_) => {
                debug!(method, "argument options ignored, not enabled for this method");
                CacheArgumentOptions::default()
            }
            None => CacheArgumentOptions::default(),
        };

        CallPolicy {
            ttl: call.ttl.or(self.ttl),
            update_age_on_get: call.update_age_on_get.or(self.update_age_on_get),
            no_update_ttl: call.no_update_ttl.or(self.no_update_ttl),
            no_dispose_on_set: call.no_dispose_on_set.or(self.no_dispose_on_set),
            use_shared_cache: call.use_shared_cache.unwrap_or(self.use_shared_cache),
            ignore_cached: call.ignore_cached.unwrap_or(false),
        }
    }
}

impl<A> Default for CachedOptions<A> {
    fn default() -> Self {
        Self {
            ttl: None,
            hash_function: None,
            use_argument_options: false,
            use_shared_cache: false,
            update_age_on_get: None,
            no_update_ttl: None,
            no_dispose_on_set: None,
        }
    }
}

impl<A> Clone for CachedOptions<A> {
    fn clone(&self) -> Self {
        Self {
            ttl: self.ttl,
            hash_function: self.hash_function.clone(),
            use_argument_options: self.use_argument_options,
            use_shared_cache: self.use_shared_cache,
            update_age_on_get: self.update_age_on_get,
            no_update_ttl: self.no_update_ttl,
            no_dispose_on_set: self.no_dispose_on_set,
        }
    }
}

impl<A> fmt::Debug for CachedOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedOptions")
            .field("ttl", &self.ttl)
            .field("hash_function", &self.hash_function.is_some())
            .field("use_argument_options", &self.use_argument_options)
            .field("use_shared_cache", &self.use_shared_cache)
            .field("update_age_on_get", &self.update_age_on_get)
            .field("no_update_ttl", &self.no_update_ttl)
            .field("no_dispose_on_set", &self.no_dispose_on_set)
            .finish()
    }
}

impl<A> From<Ttl> for CachedOptions<A> {
    fn from(ttl: Ttl) -> Self {
        Self::new().ttl(ttl)
    }
}

impl<A> From<std::time::Duration> for CachedOptions<A> {
    fn from(duration: std::time::Duration) -> Self {
        Self::new().ttl(duration)
    }
}

// == Cached Async Options ==
/// Policy attached to one asynchronous cached method.
pub struct CachedAsyncOptions<A> {
    pub cached: CachedOptions<A>,
    /// Share the in-flight operation with concurrent callers of the same key
    pub cache_promise: bool,
    /// Keep the successful result once the operation completes
    pub cache_promise_result: bool,
}

impl<A> CachedAsyncOptions<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hashed<F>(hash_function: F) -> Self
    where
        F: Fn(&A) -> String + Send + Sync + 'static,
    {
        CachedOptions::hashed(hash_function).into()
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.cached = self.cached.ttl(ttl);
        self
    }

    pub fn hash_function<F>(mut self, hash_function: F) -> Self
    where
        F: Fn(&A) -> String + Send + Sync + 'static,
    {
        self.cached = self.cached.hash_function(hash_function);
        self
    }

    pub fn use_argument_options(mut self, enabled: bool) -> Self {
        self.cached = self.cached.use_argument_options(enabled);
        self
    }

    pub fn use_shared_cache(mut self, enabled: bool) -> Self {
        self.cached = self.cached.use_shared_cache(enabled);
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.cached = self.cached.update_age_on_get(enabled);
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.cached = self.cached.no_update_ttl(enabled);
        self
    }

    pub fn no_dispose_on_set(mut self, enabled: bool) -> Self {
        self.cached = self.cached.no_dispose_on_set(enabled);
        self
    }

    pub fn cache_promise(mut self, enabled: bool) -> Self {
        self.cache_promise = enabled;
        self
    }

    pub fn cache_promise_result(mut self, enabled: bool) -> Self {
        self.cache_promise_result = enabled;
        self
    }
}

impl<A> Default for CachedAsyncOptions<A> {
    fn default() -> Self {
        CachedOptions::default().into()
    }
}

impl<A> Clone for CachedAsyncOptions<A> {
    fn clone(&self) -> Self {
        Self {
            cached: self.cached.clone(),
            cache_promise: self.cache_promise,
            cache_promise_result: self.cache_promise_result,
        }
    }
}

impl<A> fmt::Debug for CachedAsyncOptions<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedAsyncOptions")
            .field("cached", &self.cached)
            .field("cache_promise", &self.cache_promise)
            .field("cache_promise_result", &self.cache_promise_result)
            .finish()
    }
}

impl<A> From<CachedOptions<A>> for CachedAsyncOptions<A> {
    fn from(cached: CachedOptions<A>) -> Self {
        Self {
            cached,
            cache_promise: true,
            cache_promise_result: true,
        }
    }
}

impl<A> From<Ttl> for CachedAsyncOptions<A> {
    fn from(ttl: Ttl) -> Self {
        CachedOptions::from(ttl).into()
    }
}

impl<A> From<std::time::Duration> for CachedAsyncOptions<A> {
    fn from(duration: std::time::Duration) -> Self {
        CachedOptions::from(duration).into()
    }
}

// == Argument Options ==
/// Overrides passed with a single call. Only honored by methods whose policy
/// sets `use_argument_options`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheArgumentOptions {
    pub ttl: Option<Ttl>,
    pub update_age_on_get: Option<bool>,
    #[serde(rename = "noUpdateTTL")]
    pub no_update_ttl: Option<bool>,
    pub no_dispose_on_set: Option<bool>,
    pub use_shared_cache: Option<bool>,
    /// Skip the lookup and always run the method, still storing the result
    pub ignore_cached: Option<bool>,
}

impl CacheArgumentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: impl Into<Ttl>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    pub fn update_age_on_get(mut self, enabled: bool) -> Self {
        self.update_age_on_get = Some(enabled);
        self
    }

    pub fn no_update_ttl(mut self, enabled: bool) -> Self {
        self.no_update_ttl = Some(enabled);
        self
    }

    pub fn no_dispose_on_set(mut self, enabled: bool) -> Self {
        self.no_dispose_on_set = Some(enabled);
        self
    }

    pub fn use_shared_cache(mut self, enabled: bool) -> Self {
        self.use_shared_cache = Some(enabled);
        self
    }

    pub fn ignore_cached(mut self, enabled: bool) -> Self {
        self.ignore_cached = Some(enabled);
        self
    }
}

// == Call Policy ==
/// Effective options of one call after merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CallPolicy {
    pub ttl: Option<Ttl>,
    pub update_age_on_get: Option<bool>,
    pub no_update_ttl: Option<bool>,
    pub no_dispose_on_set: Option<bool>,
    pub use_shared_cache: bool,
    pub ignore_cached: bool,
}

impl CallPolicy {
    pub fn get_options(&self) -> GetOptions {
        GetOptions {
            update_age_on_get: self.update_age_on_get,
            ttl: self.ttl,
        }
    }

    pub fn set_options(&self) -> SetOptions {
        SetOptions {
            ttl: self.ttl,
            no_update_ttl: self.no_update_ttl,
            no_dispose_on_set: self.no_dispose_on_set,
        }
    }
}
