//! Registry configuration

use crate::defaults::{DEFAULT_MAX_INHERIT_TYPES, DEFAULT_MAX_TYPE_COUNT};

/// Capacity limits for a registry
///
/// Exceeding either limit is a fatal configuration error: the registration
/// fails and the registry refuses every later registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    /// Maximum number of distinct registered types
    pub max_types: usize,

    /// Maximum number of direct + transitive base (or derived) types per type
    pub max_inherit_types: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_types: DEFAULT_MAX_TYPE_COUNT,
            max_inherit_types: DEFAULT_MAX_INHERIT_TYPES,
        }
    }
}

impl RegistryLimits {
    /// Create limits with a specific type capacity
    pub fn with_max_types(max_types: usize) -> Self {
        Self {
            max_types,
            ..Default::default()
        }
    }

    /// Create limits with a specific per-type inheritance capacity
    pub fn with_max_inherit_types(max_inherit_types: usize) -> Self {
        Self {
            max_inherit_types,
            ..Default::default()
        }
    }
}

/// Options for creating a Registry
#[derive(Debug, Clone, Default)]
pub struct RegistryOptions {
    /// Capacity limits
    pub limits: RegistryLimits,
}

impl RegistryOptions {
    /// Options with the given limits
    pub fn with_limits(limits: RegistryLimits) -> Self {
        Self { limits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = RegistryLimits::default();
        assert_eq!(limits.max_types, DEFAULT_MAX_TYPE_COUNT);
        assert_eq!(limits.max_inherit_types, DEFAULT_MAX_INHERIT_TYPES);
    }

    #[test]
    fn test_limit_helpers() {
        assert_eq!(RegistryLimits::with_max_types(4).max_types, 4);
        assert_eq!(
            RegistryLimits::with_max_types(4).max_inherit_types,
            DEFAULT_MAX_INHERIT_TYPES
        );
        assert_eq!(RegistryLimits::with_max_inherit_types(2).max_inherit_types, 2);
    }
}
