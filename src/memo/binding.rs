//! The link between a service instance and its module's cache.

use crate::memo::{compose_key, CacheHandle, CacheKey};
use crate::module::Cacheable;

// == Cache Binding ==
/// Identifies one service instance to the cached methods it owns.
///
/// Built by `TtlCacheModule::bind`. A detached binding has no cache and its
/// cached methods simply run the wrapped function.
#[derive(Debug, Clone)]
pub struct CacheBinding {
    cache: Option<CacheHandle>,
    class_name: &'static str,
    instance_id: Option<u64>,
}

impl CacheBinding {
    pub(crate) fn attached(
        cache: CacheHandle,
        class_name: &'static str,
        instance_id: Option<u64>,
    ) -> Self {
        Self {
            cache: Some(cache),
            class_name,
            instance_id,
        }
    }

    /// Binding for an instance constructed outside any module.
    pub fn detached<S: Cacheable>() -> Self {
        Self {
            cache: None,
            class_name: S::cache_name(),
            instance_id: None,
        }
    }

    pub fn cache(&self) -> Option<&CacheHandle> {
        self.cache.as_ref()
    }

    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Per-instance id, only present for isolated services.
    pub fn instance_id(&self) -> Option<u64> {
        self.instance_id
    }

    pub fn is_detached(&self) -> bool {
        self.cache.is_none()
    }

    pub(crate) fn key(&self, method: &str, use_shared_cache: bool, hash: Option<&str>) -> CacheKey {
        let instance_id = if use_shared_cache {
            None
        } else {
            self.instance_id
        };
        compose_key(self.class_name, instance_id, method, hash)
    }
}
