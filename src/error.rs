//! Error types for the TTL cache
//!
//! Provides unified error handling using thiserror. Cache misses are never
//! errors; these variants cover caller contract violations and option
//! resolution failures.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and the registration layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A TTL that is negative, fractional, NaN or otherwise unparseable
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),

    /// No TTL was given for the entry and the cache has no default
    #[error("TTL must be set either on the cache or for the entry")]
    MissingTtl,

    /// Cache construction options are inconsistent
    #[error("Invalid cache options: {0}")]
    InvalidOptions(String),

    /// An asynchronous options factory failed to produce options
    #[error("Options factory failed: {0}")]
    OptionsFactory(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CacheError::InvalidTtl("-1".to_string()).to_string(),
            "Invalid TTL: -1"
        );
        assert_eq!(
            CacheError::MissingTtl.to_string(),
            "TTL must be set either on the cache or for the entry"
        );
        assert!(CacheError::InvalidOptions("max".to_string())
            .to_string()
            .contains("max"));
    }
}
