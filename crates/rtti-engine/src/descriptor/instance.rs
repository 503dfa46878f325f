//! Instance handles passed to member invokers

use std::any::Any;

/// The object a property or method is applied to
///
/// Free (global) members are invoked with `Instance::Static`. Members that
/// only read their object accept either `Ref` or `Mut`; members that mutate
/// it require `Mut`.
pub enum Instance<'a> {
    /// No object (free functions and global properties)
    Static,
    /// Shared access to an object
    Ref(&'a dyn Any),
    /// Exclusive access to an object
    Mut(&'a mut dyn Any),
}

impl<'a> Instance<'a> {
    /// Check if this is the static (object-less) instance
    pub fn is_static(&self) -> bool {
        matches!(self, Instance::Static)
    }

    /// Borrow the object as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Instance::Static => None,
            Instance::Ref(object) => object.downcast_ref::<T>(),
            Instance::Mut(object) => object.downcast_ref::<T>(),
        }
    }

    /// Mutably borrow the object as `T` (only for `Mut`)
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        match self {
            Instance::Mut(object) => object.downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Borrow the object as `&dyn Any`
    pub fn as_any(&self) -> Option<&dyn Any> {
        match self {
            Instance::Static => None,
            Instance::Ref(object) => Some(*object),
            Instance::Mut(object) => Some(&**object),
        }
    }

    /// Reborrow for a shorter lifetime, so one handle can serve several calls
    pub fn reborrow(&mut self) -> Instance<'_> {
        match self {
            Instance::Static => Instance::Static,
            Instance::Ref(object) => Instance::Ref(*object),
            Instance::Mut(object) => Instance::Mut(&mut **object),
        }
    }
}

impl<'a> From<&'a dyn Any> for Instance<'a> {
    fn from(object: &'a dyn Any) -> Self {
        Instance::Ref(object)
    }
}

impl<'a> From<&'a mut dyn Any> for Instance<'a> {
    fn from(object: &'a mut dyn Any) -> Self {
        Instance::Mut(object)
    }
}
