//! Destructor descriptors

use rtti_sdk::{TypeIdentity, Variant};

/// Destroys instances of one class held in variants
///
/// Registered automatically with the first constructor of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestructorDescriptor {
    declaring_type: TypeIdentity,
}

impl DestructorDescriptor {
    /// Destructor for the given type
    pub fn new(declaring_type: TypeIdentity) -> Self {
        Self { declaring_type }
    }

    /// The type this destructor destroys
    pub fn declaring_type(&self) -> TypeIdentity {
        self.declaring_type
    }

    /// Drop the instance held by `value`, leaving the variant empty.
    ///
    /// Returns false (and leaves the variant alone) when it is empty or
    /// holds some other type.
    pub fn destroy(&self, value: &mut Variant) -> bool {
        if !value.is_valid() || value.type_id() != self.declaring_type {
            return false;
        }
        value.clear();
        true
    }
}
