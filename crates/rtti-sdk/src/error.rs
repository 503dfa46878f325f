//! Error types for variant access

/// Result type for variant operations
pub type VariantResult<T> = Result<T, VariantError>;

/// Variant access errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    /// The variant holds no value
    #[error("Variant is empty")]
    Empty,

    /// Requested extraction type does not match the stored value
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Requested type name
        expected: String,
        /// Stored type name
        got: String,
    },

    /// The stored value cannot be duplicated
    #[error("Value of type {type_name} is not copyable")]
    NotCopyable {
        /// Stored type name
        type_name: String,
    },
}
