//! Per-type variant factories
//!
//! Every registered type stores one `VariantFactory`. The registry uses it to
//! box a value it only knows as `Box<dyn Any>` into a `Variant` without the
//! concrete type leaking into the caller. Copyability is fixed when the
//! factory is chosen, not tested per call.

use std::any::Any;

use crate::identity::TypeIdentity;
use crate::value::Variant;

/// Boxed value as handed to a factory
pub type BoxedValue = Box<dyn Any + Send + Sync>;

/// Wraps a boxed value of the factory's type, or returns the box unchanged
/// when it holds some other type
pub type VariantFactory = fn(TypeIdentity, BoxedValue) -> Result<Variant, BoxedValue>;

fn copyable<T: Any + Clone + Send + Sync>(
    type_id: TypeIdentity,
    value: BoxedValue,
) -> Result<Variant, BoxedValue> {
    value
        .downcast::<T>()
        .map(|value| Variant::new(type_id, *value))
}

fn move_only<T: Any + Send + Sync>(
    type_id: TypeIdentity,
    value: BoxedValue,
) -> Result<Variant, BoxedValue> {
    value
        .downcast::<T>()
        .map(|value| Variant::move_only(type_id, *value))
}

/// Factory producing copyable variants of `T`
pub fn copyable_factory<T: Any + Clone + Send + Sync>() -> VariantFactory {
    copyable::<T>
}

/// Factory producing move-only variants of `T`
pub fn move_only_factory<T: Any + Send + Sync>() -> VariantFactory {
    move_only::<T>
}
