//! Registry and invocation errors

use rtti_sdk::{TypeIdentity, VariantError};
use thiserror::Error;

/// Result type for registration operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for descriptor invocation
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Registration failures
///
/// The capacity variants are fatal: once one is returned the registry is
/// poisoned and every later registration fails with `Poisoned`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Too many distinct types
    #[error("Type capacity exceeded: at most {limit} types can be registered")]
    CapacityExceeded {
        /// Configured maximum type count
        limit: usize,
    },

    /// Too many base or derived relationships for one type
    #[error("Inheritance capacity exceeded for {type_name}: at most {limit} related types")]
    InheritanceLimitExceeded {
        /// Type whose relationship list overflowed
        type_name: String,
        /// Configured maximum relationship count
        limit: usize,
    },

    /// A previous fatal error left the registry untrustworthy
    #[error("Registry is poisoned by an earlier capacity violation")]
    Poisoned,

    /// A canonical key is already taken by a different native type
    #[error("Canonical key {0} is already registered for another type")]
    KeyConflict(String),

    /// Registration referenced an identity this registry never issued
    #[error("Unknown type identity {0:?}")]
    UnknownType(TypeIdentity),
}

impl RegistryError {
    /// Check if this error poisons the registry
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RegistryError::CapacityExceeded { .. } | RegistryError::InheritanceLimitExceeded { .. }
        )
    }
}

/// Failures raised while invoking a member descriptor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// Wrong number of arguments
    #[error("Argument count mismatch: expected {expected}, got {got}")]
    ArgumentCount {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Argument at `index` has the wrong type
    #[error("Argument {index} has wrong type: expected {expected}, got {got}")]
    ArgumentType {
        /// Zero-based argument position
        index: usize,
        /// Declared parameter type name
        expected: String,
        /// Supplied value type name
        got: String,
    },

    /// Instance is not of the declaring type
    #[error("Instance type mismatch: expected {expected}")]
    InstanceType {
        /// Declaring type name
        expected: String,
    },

    /// Member needs an instance but none (or a shared one) was given
    #[error("Member {0} requires a mutable instance")]
    MissingInstance(String),

    /// Write to a read-only property
    #[error("Property {0} is read-only")]
    ReadOnly(String),

    /// No member matched the requested name and argument types
    #[error("No member {0} matches the given arguments")]
    NoMatch(String),

    /// Variant access failed while marshalling a value
    #[error(transparent)]
    Variant(#[from] VariantError),
}
