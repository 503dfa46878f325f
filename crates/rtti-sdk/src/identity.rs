//! Type identities handed out by the reflection registry.
//!
//! Identities are dense and 1-based. `0` is reserved for "invalid / not
//! registered", so a default-constructed identity never aliases a real type.

use std::fmt;

/// Dense integer naming a registered type for the lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct TypeIdentity(u32);

impl TypeIdentity {
    /// The reserved "unregistered" identity
    pub const INVALID: TypeIdentity = TypeIdentity(0);

    /// Create from a raw id (only the registry should mint new ids)
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw id value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Zero-based slot for dense tables, `None` for the invalid identity
    #[inline]
    pub const fn index(self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0 as usize - 1)
        }
    }

    /// Identity for a zero-based table slot
    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// Check if this identity names a registered type
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "TypeIdentity({})", self.0)
        } else {
            write!(f, "TypeIdentity::INVALID")
        }
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identity() {
        let id = TypeIdentity::default();
        assert_eq!(id, TypeIdentity::INVALID);
        assert!(!id.is_valid());
        assert_eq!(id.index(), None);
    }

    #[test]
    fn test_index_mapping() {
        let id = TypeIdentity::from_index(0);
        assert_eq!(id.as_u32(), 1);
        assert!(id.is_valid());
        assert_eq!(id.index(), Some(0));
        assert_eq!(TypeIdentity::from_index(41).as_u32(), 42);
    }

    #[test]
    fn test_debug_format() {
        assert_eq!(format!("{:?}", TypeIdentity::from_raw(7)), "TypeIdentity(7)");
        assert_eq!(format!("{:?}", TypeIdentity::INVALID), "TypeIdentity::INVALID");
    }
}
