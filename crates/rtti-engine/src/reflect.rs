//! The canonical-key contract
//!
//! A type takes part in reflection by implementing [`Reflect`]. The registry
//! never inspects type structure: the canonical key is the sole identity
//! criterion, and the remaining items describe how the type is classified,
//! which raw type and bases it has, and how its values are boxed.
//!
//! Most class types only need an empty impl:
//!
//! ```ignore
//! #[derive(Clone)]
//! struct Shape { width: f64 }
//!
//! impl Reflect for Shape {
//!     fn variant_factory() -> Option<VariantFactory> {
//!         Some(copyable_factory::<Self>())
//!     }
//! }
//! ```

use std::any::{type_name, Any};
use std::borrow::Cow;
use std::sync::Arc;

use rtti_sdk::{copyable_factory, move_only_factory, TypeIdentity, VariantFactory};

use crate::error::RegistryResult;
use crate::registry::{BaseClassInfo, Registry, TypeClassification};

/// A type that can be registered for reflection
pub trait Reflect: Any + Send + Sync + Sized {
    /// Deterministic, process-unique key for the type
    fn canonical_key() -> Cow<'static, str> {
        Cow::Borrowed(type_name::<Self>())
    }

    /// Classification flags
    fn classification() -> TypeClassification {
        TypeClassification::class()
    }

    /// Number of pointer layers around the raw type
    fn pointer_depth() -> usize {
        0
    }

    /// Raw type with pointer layers stripped; `INVALID` means the type is its
    /// own raw type
    fn raw_type(_registry: &Registry) -> RegistryResult<TypeIdentity> {
        Ok(TypeIdentity::INVALID)
    }

    /// Direct base classes
    fn bases(_registry: &Registry) -> RegistryResult<Vec<BaseClassInfo>> {
        Ok(Vec::new())
    }

    /// Factory boxing values of the type; move-only unless overridden
    fn variant_factory() -> Option<VariantFactory> {
        Some(move_only_factory::<Self>())
    }
}

macro_rules! reflect_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn classification() -> TypeClassification {
                    TypeClassification::primitive()
                }

                fn variant_factory() -> Option<VariantFactory> {
                    Some(copyable_factory::<Self>())
                }
            }
        )*
    };
}

reflect_primitive!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

impl Reflect for () {
    fn variant_factory() -> Option<VariantFactory> {
        Some(copyable_factory::<Self>())
    }
}

impl Reflect for String {
    fn variant_factory() -> Option<VariantFactory> {
        Some(copyable_factory::<Self>())
    }
}

/// Raw type of the pointee, registering it first
fn pointee_raw_type<T: Reflect>(registry: &Registry) -> RegistryResult<TypeIdentity> {
    let inner = registry.type_of::<T>()?;
    Ok(registry.raw_type(inner).unwrap_or(inner))
}

impl<T: Reflect> Reflect for Box<T> {
    fn canonical_key() -> Cow<'static, str> {
        Cow::Owned(format!("Box<{}>", T::canonical_key()))
    }

    fn classification() -> TypeClassification {
        TypeClassification::pointer()
    }

    fn pointer_depth() -> usize {
        T::pointer_depth() + 1
    }

    fn raw_type(registry: &Registry) -> RegistryResult<TypeIdentity> {
        pointee_raw_type::<T>(registry)
    }
}

impl<T: Reflect> Reflect for Arc<T> {
    fn canonical_key() -> Cow<'static, str> {
        Cow::Owned(format!("Arc<{}>", T::canonical_key()))
    }

    fn classification() -> TypeClassification {
        TypeClassification::pointer()
    }

    fn pointer_depth() -> usize {
        T::pointer_depth() + 1
    }

    fn raw_type(registry: &Registry) -> RegistryResult<TypeIdentity> {
        pointee_raw_type::<T>(registry)
    }

    fn variant_factory() -> Option<VariantFactory> {
        Some(copyable_factory::<Self>())
    }
}

impl<T: Reflect + Clone> Reflect for Vec<T> {
    fn canonical_key() -> Cow<'static, str> {
        Cow::Owned(format!("Vec<{}>", T::canonical_key()))
    }

    fn classification() -> TypeClassification {
        TypeClassification::array()
    }

    fn variant_factory() -> Option<VariantFactory> {
        Some(copyable_factory::<Self>())
    }
}

impl<T: Reflect + Clone> Reflect for Option<T> {
    fn canonical_key() -> Cow<'static, str> {
        Cow::Owned(format!("Option<{}>", T::canonical_key()))
    }

    fn variant_factory() -> Option<VariantFactory> {
        Some(copyable_factory::<Self>())
    }
}
