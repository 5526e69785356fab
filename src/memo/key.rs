//! Cache key composition.
//!
//! A key reads `__<class>[_<instance id>].<method>[:<hash>]__`. Class and
//! method names are percent-escaped so the separators stay unambiguous.

use std::borrow::{Borrow, Cow};
use std::fmt;

// == Cache Key ==
/// Sanitized key under which a memoized result is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Borrow<str> for CacheKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Wrap ==
/// Wraps an already composed key.
pub fn wrap_cache_key(raw: &str) -> CacheKey {
    CacheKey(format!("__{raw}__"))
}

// == Compose ==
/// Builds the key for one call.
///
/// `instance_id` is only given for isolated instances that did not ask for
/// the shared cache.
pub fn compose_key(
    class_name: &str,
    instance_id: Option<u64>,
    method: &str,
    hash: Option<&str>,
) -> CacheKey {
    let mut raw = escape(class_name, &['%', '.', ':', '_']).into_owned();
    if let Some(id) = instance_id {
        raw.push('_');
        raw.push_str(&id.to_string());
    }
    raw.push('.');
    raw.push_str(&escape(method, &['%', '.', ':']));
    if let Some(hash) = hash {
        raw.push(':');
        raw.push_str(hash);
    }
    wrap_cache_key(&raw)
}

fn escape<'a>(component: &'a str, reserved: &[char]) -> Cow<'a, str> {
    if !component.contains(reserved) {
        return Cow::Borrowed(component);
    }
    let mut out = String::with_capacity(component.len() + 8);
    for c in component.chars() {
        if reserved.contains(&c) {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
