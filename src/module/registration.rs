//! Module registration: one cache instance per registered module.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::{DisposeReason, TtlCacheOptions};
use crate::error::Result;
use crate::memo::{CacheBinding, CacheHandle, CacheKey, CacheSlot, DisposeHook};
use crate::module::{Cacheable, IsolationRegistry};
use crate::tasks;

// == Module Options ==
/// Options of a synchronously registered module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtlCacheModuleOptions {
    /// Whether the host should expose the module everywhere
    pub is_global: bool,
    #[serde(flatten)]
    pub cache: TtlCacheOptions,
    /// Called for every slot that leaves the module cache
    #[serde(skip)]
    pub dispose: Option<DisposeHook>,
}

impl TtlCacheModuleOptions {
    pub fn new(cache: TtlCacheOptions) -> Self {
        Self {
            is_global: false,
            cache,
            dispose: None,
        }
    }

    pub fn global(mut self, is_global: bool) -> Self {
        self.is_global = is_global;
        self
    }

    /// Reports evicted, overwritten, deleted and stale slots to `dispose`.
    ///
    /// The callback runs with the cache locked and must not use it.
    pub fn dispose<F>(mut self, dispose: F) -> Self
    where
        F: Fn(CacheSlot, &CacheKey, DisposeReason) + Send + Sync + 'static,
    {
        self.dispose = Some(DisposeHook::new(dispose));
        self
    }
}

impl From<TtlCacheOptions> for TtlCacheModuleOptions {
    fn from(cache: TtlCacheOptions) -> Self {
        Self::new(cache)
    }
}

// == Options Factory ==
/// Produces cache options at registration time, e.g. from a config service.
#[async_trait]
pub trait TtlCacheOptionsFactory: Send + Sync {
    async fn create_ttl_cache_options(&self) -> Result<TtlCacheOptions>;
}

enum OptionsSource {
    Factory(Box<dyn FnOnce() -> BoxFuture<'static, Result<TtlCacheOptions>> + Send>),
    Existing(Arc<dyn TtlCacheOptionsFactory>),
}

/// Options of an asynchronously registered module.
pub struct TtlCacheAsyncModuleOptions {
    is_global: bool,
    dispose: Option<DisposeHook>,
    source: OptionsSource,
}

impl TtlCacheAsyncModuleOptions {
    /// Resolves the cache options by running `factory` once.
    pub fn use_factory<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<TtlCacheOptions>> + Send + 'static,
    {
        Self {
            is_global: false,
            dispose: None,
            source: OptionsSource::Factory(Box::new(move || factory().boxed())),
        }
    }

    /// Resolves the cache options through an existing factory instance.
    pub fn use_existing(factory: Arc<dyn TtlCacheOptionsFactory>) -> Self {
        Self {
            is_global: false,
            dispose: None,
            source: OptionsSource::Existing(factory),
        }
    }

    /// Builds a fresh factory of type `F` and resolves the options through it.
    pub fn use_class<F>() -> Self
    where
        F: TtlCacheOptionsFactory + Default + 'static,
    {
        Self::use_existing(Arc::new(F::default()))
    }

    pub fn global(mut self, is_global: bool) -> Self {
        self.is_global = is_global;
        self
    }

    pub fn dispose<F>(mut self, dispose: F) -> Self
    where
        F: Fn(CacheSlot, &CacheKey, DisposeReason) + Send + Sync + 'static,
    {
        self.dispose = Some(DisposeHook::new(dispose));
        self
    }
}

impl fmt::Debug for TtlCacheAsyncModuleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            OptionsSource::Factory(_) => "factory",
            OptionsSource::Existing(_) => "existing",
        };
        f.debug_struct("TtlCacheAsyncModuleOptions")
            .field("is_global", &self.is_global)
            .field("dispose", &self.dispose)
            .field("source", &source)
            .finish()
    }
}

// == TTL Cache Module ==
/// A registered module: its options, the cache it owns and the isolation
/// counters of the services bound to it.
#[derive(Debug, Clone)]
pub struct TtlCacheModule {
    options: TtlCacheModuleOptions,
    cache: CacheHandle,
    isolation: Arc<IsolationRegistry>,
}

impl TtlCacheModule {
    // == Register ==
    /// Creates the module's cache from static options.
    ///
    /// # Errors
    /// `CacheError::InvalidOptions` when the cache options are rejected.
    pub fn register(options: TtlCacheModuleOptions) -> Result<Self> {
        let cache = match options.dispose.clone() {
            Some(hook) => {
                CacheHandle::with_dispose(options.cache.clone(), move |slot, key, reason| {
                    hook.call(slot, key, reason)
                })?
            }
            None => CacheHandle::new(options.cache.clone())?,
        };
        info!(
            max = ?options.cache.max,
            ttl = ?options.cache.ttl,
            is_global = options.is_global,
            dispose = options.dispose.is_some(),
            "TTL cache module registered"
        );
        Ok(Self {
            options,
            cache,
            isolation: Arc::new(IsolationRegistry::new()),
        })
    }

    /// Resolves the cache options asynchronously, then registers.
    ///
    /// # Errors
    /// Whatever the options factory returns, or the errors of `register`.
    pub async fn register_async(options: TtlCacheAsyncModuleOptions) -> Result<Self> {
        let cache = match options.source {
            OptionsSource::Factory(factory) => factory().await?,
            OptionsSource::Existing(factory) => factory.create_ttl_cache_options().await?,
        };
        Self::register(TtlCacheModuleOptions {
            is_global: options.is_global,
            cache,
            dispose: options.dispose,
        })
    }

    pub fn options(&self) -> &TtlCacheOptions {
        &self.options.cache
    }

    pub fn module_options(&self) -> &TtlCacheModuleOptions {
        &self.options
    }

    pub fn is_global(&self) -> bool {
        self.options.is_global
    }

    /// The raw cache, for services that manage entries themselves.
    pub fn cache(&self) -> CacheHandle {
        self.cache.clone()
    }

    pub fn isolation(&self) -> &IsolationRegistry {
        &self.isolation
    }

    // == Bind ==
    /// Binding for a new instance of `S`. Isolated types draw the next
    /// instance id.
    pub fn bind<S: Cacheable>(&self) -> CacheBinding {
        let instance_id = S::ISOLATED.then(|| self.isolation.next_id::<S>());
        CacheBinding::attached(self.cache.clone(), S::cache_name(), instance_id)
    }

    /// Starts the background purge of this module's cache.
    pub fn spawn_purge_task(&self, interval: Duration) -> JoinHandle<()> {
        tasks::spawn_purge_task(self.cache.clone(), interval)
    }
}
