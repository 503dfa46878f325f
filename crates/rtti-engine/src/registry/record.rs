//! Per-type records
//!
//! A `TypeRegistration` is what a caller hands to `Registry::register_type`;
//! a `TypeRecord` is what the database keeps for each issued identity.

use std::any::TypeId;
use std::sync::Arc;

use rtti_sdk::{TypeIdentity, VariantFactory};
use rustc_hash::FxHashMap;

use super::converter::TypeConverter;
use super::inheritance::BaseClassInfo;
use super::Registry;
use crate::descriptor::{ConstructorDescriptor, DestructorDescriptor, EnumerationDescriptor};
use crate::error::RegistryResult;
use crate::metadata::MetadataStore;
use crate::reflect::Reflect;

/// Classification flags of a registered type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeClassification {
    /// Class (struct) type
    pub is_class: bool,
    /// Enumeration
    pub is_enum: bool,
    /// Array or sequence
    pub is_array: bool,
    /// Pointer-like (owning or shared)
    pub is_pointer: bool,
    /// Built-in scalar
    pub is_primitive: bool,
    /// Function pointer
    pub is_function_pointer: bool,
    /// Pointer to a data member
    pub is_member_object_pointer: bool,
    /// Pointer to a member function
    pub is_member_function_pointer: bool,
}

impl TypeClassification {
    /// Class type
    pub const fn class() -> Self {
        Self {
            is_class: true,
            is_enum: false,
            is_array: false,
            is_pointer: false,
            is_primitive: false,
            is_function_pointer: false,
            is_member_object_pointer: false,
            is_member_function_pointer: false,
        }
    }

    /// Enumeration type
    pub const fn enumeration() -> Self {
        Self {
            is_class: false,
            is_enum: true,
            ..Self::none()
        }
    }

    /// Built-in scalar
    pub const fn primitive() -> Self {
        Self {
            is_primitive: true,
            ..Self::none()
        }
    }

    /// Pointer-like type
    pub const fn pointer() -> Self {
        Self {
            is_pointer: true,
            ..Self::none()
        }
    }

    /// Array type
    pub const fn array() -> Self {
        Self {
            is_array: true,
            ..Self::none()
        }
    }

    /// Function pointer type
    pub const fn function_pointer() -> Self {
        Self {
            is_function_pointer: true,
            ..Self::none()
        }
    }

    /// No flags set
    pub const fn none() -> Self {
        Self {
            is_class: false,
            is_enum: false,
            is_array: false,
            is_pointer: false,
            is_primitive: false,
            is_function_pointer: false,
            is_member_object_pointer: false,
            is_member_function_pointer: false,
        }
    }
}

/// Everything needed to register one type
#[derive(Clone)]
pub struct TypeRegistration {
    /// Canonical key; the sole identity criterion
    pub canonical_key: String,
    /// Raw (pointer-stripped) type, or INVALID when the type is its own raw type
    pub raw_type: TypeIdentity,
    /// Direct base classes with their upcasts
    pub bases: Vec<BaseClassInfo>,
    /// Classification flags
    pub classification: TypeClassification,
    /// Factory boxing values of this type
    pub variant_factory: Option<VariantFactory>,
    /// Pointer depth (0 for non-pointers)
    pub pointer_depth: usize,
    /// Native Rust type, when the type can report its own identity at run time
    pub native_type: Option<TypeId>,
}

impl TypeRegistration {
    /// Registration of a plain class with the given key
    pub fn new(canonical_key: impl Into<String>) -> Self {
        Self {
            canonical_key: canonical_key.into(),
            raw_type: TypeIdentity::INVALID,
            bases: Vec::new(),
            classification: TypeClassification::class(),
            variant_factory: None,
            pointer_depth: 0,
            native_type: None,
        }
    }

    /// Registration derived from a `Reflect` implementation
    ///
    /// May register the raw type and base types first.
    pub fn of<T: Reflect>(registry: &Registry) -> RegistryResult<Self> {
        Ok(Self {
            canonical_key: T::canonical_key().into_owned(),
            raw_type: T::raw_type(registry)?,
            bases: T::bases(registry)?,
            classification: T::classification(),
            variant_factory: T::variant_factory(),
            pointer_depth: T::pointer_depth(),
            native_type: Some(TypeId::of::<T>()),
        })
    }

    /// Set the raw type
    pub fn with_raw_type(mut self, raw_type: TypeIdentity) -> Self {
        self.raw_type = raw_type;
        self
    }

    /// Add a direct base
    pub fn with_base(mut self, base: BaseClassInfo) -> Self {
        self.bases.push(base);
        self
    }

    /// Set the classification
    pub fn with_classification(mut self, classification: TypeClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Set the variant factory
    pub fn with_variant_factory(mut self, factory: VariantFactory) -> Self {
        self.variant_factory = Some(factory);
        self
    }

    /// Set the pointer depth
    pub fn with_pointer_depth(mut self, depth: usize) -> Self {
        self.pointer_depth = depth;
        self
    }

    /// Set the native type
    pub fn with_native_type(mut self, native_type: TypeId) -> Self {
        self.native_type = Some(native_type);
        self
    }
}

/// Name tables for properties and methods
///
/// Values index into the database's descriptor arenas. Methods map to
/// every overload registered under the name, in registration order.
#[derive(Debug, Default)]
pub(crate) struct MemberTable {
    pub properties: FxHashMap<String, usize>,
    pub methods: FxHashMap<String, Vec<usize>>,
}

/// Class-only data of a type record
#[derive(Debug, Default)]
pub(crate) struct ClassData {
    pub constructors: Vec<Arc<ConstructorDescriptor>>,
    pub members: MemberTable,
}

/// Stored record for one type identity
pub(crate) struct TypeRecord {
    pub name: String,
    /// Resolved raw type; equal to the record's own identity for raw types
    pub raw_type: TypeIdentity,
    pub bases: Vec<BaseClassInfo>,
    /// Transitive bases, breadth-first, without duplicates
    pub ancestors: Vec<TypeIdentity>,
    /// Transitive derived types, in registration order
    pub derived: Vec<TypeIdentity>,
    pub classification: TypeClassification,
    pub pointer_depth: usize,
    pub variant_factory: Option<VariantFactory>,
    pub native_type: Option<TypeId>,
    pub metadata: MetadataStore,
    pub class_data: Option<ClassData>,
    pub destructor: Option<Arc<DestructorDescriptor>>,
    pub enumeration: Option<Arc<EnumerationDescriptor>>,
    pub converters: Vec<Arc<TypeConverter>>,
}

impl TypeRecord {
    /// Class data, created on first use
    pub fn class_data_mut(&mut self) -> &mut ClassData {
        self.class_data.get_or_insert_with(ClassData::default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_helpers() {
        assert!(TypeClassification::class().is_class);
        let e = TypeClassification::enumeration();
        assert!(e.is_enum && !e.is_class);
        assert!(TypeClassification::primitive().is_primitive);
        assert!(TypeClassification::pointer().is_pointer);
        assert!(TypeClassification::array().is_array);
        assert_eq!(TypeClassification::none(), TypeClassification::default());
    }

    #[test]
    fn test_registration_builder() {
        let reg = TypeRegistration::new("Shape")
            .with_pointer_depth(1)
            .with_classification(TypeClassification::pointer())
            .with_raw_type(TypeIdentity::from_raw(2));
        assert_eq!(reg.canonical_key, "Shape");
        assert_eq!(reg.pointer_depth, 1);
        assert!(reg.classification.is_pointer);
        assert_eq!(reg.raw_type, TypeIdentity::from_raw(2));
        assert!(reg.native_type.is_none());
    }
}
