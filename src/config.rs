//! Configuration Module
//!
//! Loads the cache module configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::{Ttl, TtlCacheOptions};
use crate::module::TtlCacheModuleOptions;

const DEFAULT_TTL: Ttl = Ttl::Millis(60_000);

/// Cache module configuration.
///
/// All values can be configured via environment variables; unparseable values
/// fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of entries, None = unbounded
    pub max_entries: Option<usize>,
    /// TTL for entries stored without one
    pub default_ttl: Ttl,
    pub update_age_on_get: bool,
    pub no_update_ttl: bool,
    pub no_dispose_on_set: bool,
    /// Register the module as global
    pub is_global: bool,
    /// Interval of the background purge, None = never purge in the background
    pub purge_interval: Option<Duration>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_CACHE_MAX` - Maximum cache entries (default: unbounded)
    /// - `TTL_CACHE_TTL` - Default TTL in milliseconds or `Infinity` (default: 60000)
    /// - `TTL_CACHE_UPDATE_AGE_ON_GET` - Refresh TTL on reads (default: false)
    /// - `TTL_CACHE_NO_UPDATE_TTL` - Keep TTL on overwrite (default: false)
    /// - `TTL_CACHE_NO_DISPOSE_ON_SET` - Skip dispose on overwrite (default: false)
    /// - `TTL_CACHE_GLOBAL` - Global module registration (default: true)
    /// - `TTL_CACHE_PURGE_INTERVAL_MS` - Background purge interval (default: off)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: parse_var("TTL_CACHE_MAX")
                .filter(|max| *max > 0)
                .or(defaults.max_entries),
            default_ttl: parse_var("TTL_CACHE_TTL").unwrap_or(defaults.default_ttl),
            update_age_on_get: parse_var("TTL_CACHE_UPDATE_AGE_ON_GET")
                .unwrap_or(defaults.update_age_on_get),
            no_update_ttl: parse_var("TTL_CACHE_NO_UPDATE_TTL").unwrap_or(defaults.no_update_ttl),
            no_dispose_on_set: parse_var("TTL_CACHE_NO_DISPOSE_ON_SET")
                .unwrap_or(defaults.no_dispose_on_set),
            is_global: parse_var("TTL_CACHE_GLOBAL").unwrap_or(defaults.is_global),
            purge_interval: parse_var("TTL_CACHE_PURGE_INTERVAL_MS")
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .or(defaults.purge_interval),
        }
    }

    pub fn cache_options(&self) -> TtlCacheOptions {
        TtlCacheOptions {
            max: self.max_entries,
            ttl: Some(self.default_ttl),
            update_age_on_get: self.update_age_on_get,
            no_update_ttl: self.no_update_ttl,
            no_dispose_on_set: self.no_dispose_on_set,
        }
    }

    pub fn module_options(&self) -> TtlCacheModuleOptions {
        TtlCacheModuleOptions::new(self.cache_options()).global(self.is_global)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: None,
            default_ttl: DEFAULT_TTL,
            update_age_on_get: false,
            no_update_ttl: false,
            no_dispose_on_set: false,
            is_global: true,
            purge_interval: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
