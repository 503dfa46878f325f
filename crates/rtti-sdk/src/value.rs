//! Variant: type-erased value container
//!
//! A `Variant` owns exactly one value of some registered type together with
//! that type's `TypeIdentity`. Whether the value may be duplicated is decided
//! when the variant is built:
//!
//! - `Variant::new` requires `T: Clone`; `try_clone` deep-copies the value
//! - `Variant::move_only` accepts any `T`; `try_clone` fails with `NotCopyable`
//!
//! Extraction is exact: `get::<T>()` only succeeds when `T` is the stored
//! type. Conversion to other types goes through the registry's converter
//! table.

use std::any::{type_name, Any};
use std::fmt;

use crate::error::{VariantError, VariantResult};
use crate::identity::TypeIdentity;

/// Object-safe view of a stored value
trait Payload: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn try_clone(&self) -> Option<Box<dyn Payload>>;
    fn is_copyable(&self) -> bool;
    fn type_name(&self) -> &'static str;
}

struct Copyable<T>(T);

impl<T: Any + Clone + Send + Sync> Payload for Copyable<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.0
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        Box::new(self.0)
    }

    fn try_clone(&self) -> Option<Box<dyn Payload>> {
        Some(Box::new(Copyable(self.0.clone())))
    }

    fn is_copyable(&self) -> bool {
        true
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

struct MoveOnly<T>(T);

impl<T: Any + Send + Sync> Payload for MoveOnly<T> {
    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        &mut self.0
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        Box::new(self.0)
    }

    fn try_clone(&self) -> Option<Box<dyn Payload>> {
        None
    }

    fn is_copyable(&self) -> bool {
        false
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Type-erased container carrying a value across the reflection boundary.
pub struct Variant {
    type_id: TypeIdentity,
    payload: Option<Box<dyn Payload>>,
}

impl Variant {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Wrap a copyable value
    pub fn new<T: Any + Clone + Send + Sync>(type_id: TypeIdentity, value: T) -> Self {
        Self {
            type_id,
            payload: Some(Box::new(Copyable(value))),
        }
    }

    /// Wrap a value that cannot be duplicated
    pub fn move_only<T: Any + Send + Sync>(type_id: TypeIdentity, value: T) -> Self {
        Self {
            type_id,
            payload: Some(Box::new(MoveOnly(value))),
        }
    }

    /// The empty variant (no value, invalid type)
    pub const fn empty() -> Self {
        Self {
            type_id: TypeIdentity::INVALID,
            payload: None,
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Identity of the stored value's type
    #[inline]
    pub fn type_id(&self) -> TypeIdentity {
        self.type_id
    }

    /// Check if the variant holds a value
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.payload.is_some()
    }

    /// Check if the stored value is exactly `T`
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is_some_and(|value| value.is::<T>())
    }

    /// Check if `try_clone` would succeed
    pub fn is_copyable(&self) -> bool {
        self.payload
            .as_ref()
            .map_or(true, |payload| payload.is_copyable())
    }

    /// Rust type name of the stored value, for diagnostics
    pub fn value_type_name(&self) -> &'static str {
        self.payload
            .as_ref()
            .map(|payload| payload.type_name())
            .unwrap_or("<empty>")
    }

    // ========================================================================
    // Access
    // ========================================================================

    /// Borrow the stored value as `&dyn Any`
    pub fn as_any(&self) -> Option<&dyn Any> {
        self.payload.as_ref().map(|payload| payload.as_any())
    }

    /// Mutably borrow the stored value as `&mut dyn Any`
    pub fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        self.payload.as_mut().map(|payload| payload.as_any_mut())
    }

    /// Borrow the stored value if it is exactly `T`
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.as_any()?.downcast_ref::<T>()
    }

    /// Mutably borrow the stored value if it is exactly `T`
    pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut()?.downcast_mut::<T>()
    }

    /// Copy the stored value out if it is exactly `T`
    pub fn extract<T: Any + Clone>(&self) -> VariantResult<T> {
        if !self.is_valid() {
            return Err(VariantError::Empty);
        }
        self.get::<T>()
            .cloned()
            .ok_or_else(|| VariantError::TypeMismatch {
                expected: type_name::<T>().to_string(),
                got: self.value_type_name().to_string(),
            })
    }

    /// Move the stored value out if it is exactly `T`; otherwise hand the
    /// variant back unchanged
    pub fn take<T: Any>(self) -> Result<T, Variant> {
        if !self.is::<T>() {
            return Err(self);
        }
        let type_id = self.type_id;
        match self.payload.map(|payload| payload.into_any().downcast::<T>()) {
            Some(Ok(value)) => Ok(*value),
            _ => Err(Variant {
                type_id,
                payload: None,
            }),
        }
    }

    /// Duplicate the variant, failing for move-only values
    pub fn try_clone(&self) -> VariantResult<Variant> {
        match &self.payload {
            None => Ok(Variant::empty()),
            Some(payload) => match payload.try_clone() {
                Some(copy) => Ok(Variant {
                    type_id: self.type_id,
                    payload: Some(copy),
                }),
                None => Err(VariantError::NotCopyable {
                    type_name: payload.type_name().to_string(),
                }),
            },
        }
    }

    /// Drop the stored value, leaving the variant empty
    pub fn clear(&mut self) {
        self.payload = None;
        self.type_id = TypeIdentity::INVALID;
    }
}

impl Default for Variant {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "Variant({:?}: {})", self.type_id, payload.type_name()),
            None => write!(f, "Variant::Empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeIdentity = TypeIdentity::from_raw(1);

    struct Handle(u32);

    #[test]
    fn test_empty() {
        let v = Variant::empty();
        assert!(!v.is_valid());
        assert_eq!(v.type_id(), TypeIdentity::INVALID);
        assert_eq!(v.extract::<i32>(), Err(VariantError::Empty));
        assert!(v.try_clone().is_ok());
    }

    #[test]
    fn test_exact_extraction() {
        let v = Variant::new(INT, 42i32);
        assert!(v.is::<i32>());
        assert_eq!(v.get::<i32>(), Some(&42));
        assert_eq!(v.extract::<i32>(), Ok(42));
        assert_eq!(v.type_id(), INT);
    }

    #[test]
    fn test_mismatch_is_reported() {
        let v = Variant::new(INT, 42i32);
        assert!(v.get::<i64>().is_none());
        match v.extract::<String>() {
            Err(VariantError::TypeMismatch { expected, got }) => {
                assert!(expected.contains("String"));
                assert_eq!(got, "i32");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_get_mut() {
        let mut v = Variant::new(INT, 1i32);
        *v.get_mut::<i32>().unwrap() += 41;
        assert_eq!(v.get::<i32>(), Some(&42));
    }

    #[test]
    fn test_clone_copies_value() {
        let original = Variant::new(INT, String::from("abc"));
        let mut copy = original.try_clone().unwrap();
        copy.get_mut::<String>().unwrap().push('d');
        assert_eq!(original.get::<String>().unwrap(), "abc");
        assert_eq!(copy.get::<String>().unwrap(), "abcd");
    }

    #[test]
    fn test_copyability_does_not_clone() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        static CLONES: AtomicUsize = AtomicUsize::new(0);

        struct Counted;

        impl Clone for Counted {
            fn clone(&self) -> Self {
                CLONES.fetch_add(1, Ordering::SeqCst);
                Counted
            }
        }

        let v = Variant::new(INT, Counted);
        assert!(v.is_copyable());
        assert!(Variant::empty().is_copyable());
        assert_eq!(CLONES.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_move_only_clone_fails() {
        let v = Variant::move_only(INT, Handle(3));
        assert!(!v.is_copyable());
        assert!(matches!(v.try_clone(), Err(VariantError::NotCopyable { .. })));
        assert_eq!(v.get::<Handle>().map(|h| h.0), Some(3));
    }

    #[test]
    fn test_take() {
        let v = Variant::move_only(INT, Handle(9));
        let v = v.take::<i32>().unwrap_err();
        assert!(v.is_valid());
        let handle = v.take::<Handle>().ok().unwrap();
        assert_eq!(handle.0, 9);
    }

    #[test]
    fn test_clear() {
        let mut v = Variant::new(INT, 5u8);
        v.clear();
        assert!(!v.is_valid());
        assert_eq!(format!("{:?}", v), "Variant::Empty");
    }
}
