//! Services that own cached methods.

use std::any::type_name;

// == Cacheable ==
/// Implemented by every service whose methods are cached.
///
/// ```
/// use ttl_memo::module::Cacheable;
///
/// struct UserService;
///
/// impl Cacheable for UserService {
///     const ISOLATED: bool = true;
/// }
///
/// assert_eq!(UserService::cache_name(), "UserService");
/// ```
pub trait Cacheable: 'static {
    /// Give each instance its own key namespace.
    const ISOLATED: bool = false;

    /// First component of every key this service produces.
    fn cache_name() -> &'static str {
        short_type_name::<Self>()
    }
}

/// `type_name` without module path or generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
