//! Process-wide registry instance
//!
//! Created on first access and alive until process exit. Code that wants an
//! isolated registry (tests, plugins) constructs its own `Registry` instead.

use std::any::type_name;
use std::sync::LazyLock;

use rtti_sdk::TypeIdentity;

use super::Registry;
use crate::reflect::Reflect;

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

/// The process-wide registry
pub fn global() -> &'static Registry {
    &GLOBAL
}

/// Identity of `T` in the process-wide registry
///
/// # Panics
///
/// Panics when registering `T` hits a capacity limit (or the registry was
/// already poisoned by one). Reflection data is foundational; continuing with
/// a partial registry is not supported.
pub fn type_of<T: Reflect>() -> TypeIdentity {
    match GLOBAL.type_of::<T>() {
        Ok(id) => id,
        Err(err) => panic!("fatal reflection error while registering {}: {}", type_name::<T>(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_is_shared() {
        let id = type_of::<u16>();
        assert_eq!(global().type_of::<u16>(), Ok(id));
        assert!(std::ptr::eq(global(), global()));
    }
}
