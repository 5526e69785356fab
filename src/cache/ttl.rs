//! TTL Module
//!
//! A time-to-live is either a whole number of milliseconds or `Infinite`.
//! Malformed inputs (negative, fractional, NaN) are rejected at the
//! conversion boundary so the engine only ever sees valid values.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CacheError, Result};

// == Ttl ==
/// Time-to-live of a cache entry.
///
/// Ordering puts every finite TTL before `Infinite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ttl {
    /// Expires after this many milliseconds
    Millis(u64),
    /// Never expires
    Infinite,
}

impl Ttl {
    /// A TTL of zero; also what remaining-TTL queries report for missing keys.
    pub const ZERO: Ttl = Ttl::Millis(0);

    pub const fn from_millis(ms: u64) -> Self {
        Ttl::Millis(ms)
    }

    pub const fn from_secs(secs: u64) -> Self {
        Ttl::Millis(secs.saturating_mul(1000))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }

    /// Milliseconds, or `None` for an infinite TTL.
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Ttl::Millis(ms) => Some(*ms),
            Ttl::Infinite => None,
        }
    }

    /// Duration, or `None` for an infinite TTL.
    pub fn as_duration(&self) -> Option<Duration> {
        self.as_millis().map(Duration::from_millis)
    }
}

impl From<Duration> for Ttl {
    /// Sub-millisecond precision is truncated.
    fn from(duration: Duration) -> Self {
        Ttl::Millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl TryFrom<f64> for Ttl {
    type Error = CacheError;

    /// Accepts non-negative integers and positive infinity.
    fn try_from(value: f64) -> Result<Self> {
        if value == f64::INFINITY {
            return Ok(Ttl::Infinite);
        }
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(CacheError::InvalidTtl(format!(
                "{value} is not a non-negative integer or Infinity"
            )));
        }
        if value > u64::MAX as f64 {
            return Err(CacheError::InvalidTtl(format!("{value} is out of range")));
        }
        Ok(Ttl::Millis(value as u64))
    }
}

impl FromStr for Ttl {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("infinity") || trimmed.eq_ignore_ascii_case("inf") {
            return Ok(Ttl::Infinite);
        }
        if let Ok(ms) = trimmed.parse::<u64>() {
            return Ok(Ttl::Millis(ms));
        }
        trimmed
            .parse::<f64>()
            .map_err(|_| CacheError::InvalidTtl(format!("cannot parse '{trimmed}'")))
            .and_then(Ttl::try_from)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ttl::Millis(ms) => write!(f, "{ms}ms"),
            Ttl::Infinite => f.write_str("Infinity"),
        }
    }
}

// == Serde ==
// Finite TTLs serialize as integer milliseconds; infinity as the string "Infinity".
impl Serialize for Ttl {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Ttl::Millis(ms) => serializer.serialize_u64(*ms),
            Ttl::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}

struct TtlVisitor;

impl<'de> Visitor<'de> for TtlVisitor {
    type Value = Ttl;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer number of milliseconds or \"Infinity\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Ttl, E> {
        Ok(Ttl::Millis(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Ttl, E> {
        u64::try_from(v)
            .map(Ttl::Millis)
            .map_err(|_| E::custom(CacheError::InvalidTtl(format!("{v} is negative"))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<Ttl, E> {
        Ttl::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Ttl, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Ttl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TtlVisitor)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_from_f64() {
        assert_eq!(Ttl::try_from(250.0).unwrap(), Ttl::Millis(250));
        assert_eq!(Ttl::try_from(f64::INFINITY).unwrap(), Ttl::Infinite);
        assert!(Ttl::try_from(-1.0).is_err());
        assert!(Ttl::try_from(1.5).is_err());
        assert!(Ttl::try_from(f64::NAN).is_err());
        assert!(Ttl::try_from(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_ttl_from_str() {
        assert_eq!("1000".parse::<Ttl>().unwrap(), Ttl::Millis(1000));
        assert_eq!("Infinity".parse::<Ttl>().unwrap(), Ttl::Infinite);
        assert_eq!(" inf ".parse::<Ttl>().unwrap(), Ttl::Infinite);
        assert_eq!("20.0".parse::<Ttl>().unwrap(), Ttl::Millis(20));
        assert!(matches!("-5".parse::<Ttl>(), Err(CacheError::InvalidTtl(_))));
        assert!(matches!("soon".parse::<Ttl>(), Err(CacheError::InvalidTtl(_))));
    }

    #[test]
    fn test_ttl_ordering() {
        assert!(Ttl::Millis(u64::MAX) < Ttl::Infinite);
        assert!(Ttl::ZERO < Ttl::Millis(1));
    }

    #[test]
    fn test_ttl_from_duration() {
        assert_eq!(Ttl::from(Duration::from_millis(1500)), Ttl::Millis(1500));
        assert_eq!(Ttl::from_secs(2), Ttl::Millis(2000));
        assert_eq!(Ttl::Millis(30).as_duration(), Some(Duration::from_millis(30)));
        assert_eq!(Ttl::Infinite.as_duration(), None);
    }

    #[test]
    fn test_ttl_serde() {
        assert_eq!(serde_json::to_string(&Ttl::Millis(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&Ttl::Infinite).unwrap(), "\"Infinity\"");

        let ttl: Ttl = serde_json::from_str("5000").unwrap();
        assert_eq!(ttl, Ttl::Millis(5000));
        let ttl: Ttl = serde_json::from_str("\"Infinity\"").unwrap();
        assert_eq!(ttl, Ttl::Infinite);

        assert!(serde_json::from_str::<Ttl>("-3").is_err());
        assert!(serde_json::from_str::<Ttl>("2.5").is_err());
    }

    #[test]
    fn test_ttl_display() {
        assert_eq!(Ttl::Millis(10).to_string(), "10ms");
        assert_eq!(Ttl::Infinite.to_string(), "Infinity");
    }
}
