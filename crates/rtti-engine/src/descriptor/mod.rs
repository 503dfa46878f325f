//! Member descriptors
//!
//! Immutable, type-erased records describing one constructor, destructor,
//! property, method or enumeration of a registered type. Each descriptor
//! knows its declaring type, its parameter and value types, its policy and
//! an opaque invoker. Once handed to the registry a descriptor is shared
//! behind an `Arc` and never mutated again.
//!
//! Descriptors can be built from raw invokers (`new`) or from ordinary Rust
//! functions and field accessors (`from_fn*`, `from_ref*`, `from_mut*`,
//! `free*`, `field`, ...). The typed builders resolve every parameter and
//! return type against a registry up front, so invocation only compares
//! identities.

mod constructor;
mod destructor;
mod enumeration;
mod instance;
mod method;
mod policy;
mod property;

use std::any::{type_name, Any};

use rtti_sdk::{TypeIdentity, Variant, VariantError, VariantFactory};

use crate::error::{InvokeError, InvokeResult, RegistryResult};
use crate::reflect::Reflect;
use crate::registry::Registry;

pub use constructor::{ConstructorDescriptor, ConstructorInvoker};
pub use destructor::DestructorDescriptor;
pub use enumeration::EnumerationDescriptor;
pub use instance::Instance;
pub use method::{MethodDescriptor, MethodInvoker};
pub use policy::{AccessPolicy, MethodPolicy};
pub use property::{Getter, PropertyDescriptor, Setter};

/// Anything invocable with an ordered parameter list
pub trait Signature {
    /// Declared parameter types, in order
    fn parameter_types(&self) -> &[TypeIdentity];
}

/// Boxes results of one registered type through that type's variant factory
#[derive(Clone, Copy)]
pub struct ValueBoxer {
    type_id: TypeIdentity,
    factory: Option<VariantFactory>,
}

impl ValueBoxer {
    /// Resolve `T` in the registry and capture its factory
    pub fn of<T: Reflect>(registry: &Registry) -> RegistryResult<Self> {
        let type_id = registry.type_of::<T>()?;
        Ok(Self {
            type_id,
            factory: registry.variant_factory(type_id),
        })
    }

    /// Identity of the boxed type
    pub fn type_id(&self) -> TypeIdentity {
        self.type_id
    }

    /// Box a value into a variant
    pub fn wrap<T: Any + Send + Sync>(&self, value: T) -> InvokeResult<Variant> {
        match self.factory {
            Some(factory) => factory(self.type_id, Box::new(value)).map_err(|_| {
                InvokeError::Variant(VariantError::TypeMismatch {
                    expected: format!("{:?}", self.type_id),
                    got: type_name::<T>().to_string(),
                })
            }),
            None => Ok(Variant::move_only(self.type_id, value)),
        }
    }
}

/// Verify argument count and exact argument types against a parameter list
pub fn check_arguments(params: &[TypeIdentity], args: &[Variant]) -> InvokeResult<()> {
    if params.len() != args.len() {
        return Err(InvokeError::ArgumentCount {
            expected: params.len(),
            got: args.len(),
        });
    }
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if arg.type_id() != *param {
            return Err(InvokeError::ArgumentType {
                index,
                expected: format!("{:?}", param),
                got: arg.value_type_name().to_string(),
            });
        }
    }
    Ok(())
}

/// Copy argument `index` out as `T`
pub fn arg<T: Any + Clone>(args: &[Variant], index: usize) -> InvokeResult<T> {
    let value = args.get(index).ok_or(InvokeError::ArgumentCount {
        expected: index + 1,
        got: args.len(),
    })?;
    value.extract::<T>().map_err(|_| InvokeError::ArgumentType {
        index,
        expected: type_name::<T>().to_string(),
        got: value.value_type_name().to_string(),
    })
}

fn instance_error<C>() -> InvokeError {
    InvokeError::InstanceType {
        expected: type_name::<C>().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeIdentity = TypeIdentity::from_raw(1);
    const TEXT: TypeIdentity = TypeIdentity::from_raw(2);

    #[test]
    fn test_check_arguments_count() {
        let args = vec![Variant::new(INT, 1i32)];
        assert_eq!(
            check_arguments(&[INT, INT], &args),
            Err(InvokeError::ArgumentCount {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn test_check_arguments_types() {
        let args = vec![Variant::new(INT, 1i32), Variant::new(TEXT, "x".to_string())];
        assert!(check_arguments(&[INT, TEXT], &args).is_ok());
        assert!(matches!(
            check_arguments(&[INT, INT], &args),
            Err(InvokeError::ArgumentType { index: 1, .. })
        ));
    }

    #[test]
    fn test_arg_extraction() {
        let args = vec![Variant::new(INT, 7i32)];
        assert_eq!(arg::<i32>(&args, 0), Ok(7));
        assert!(matches!(
            arg::<String>(&args, 0),
            Err(InvokeError::ArgumentType { index: 0, .. })
        ));
        assert!(matches!(
            arg::<i32>(&args, 1),
            Err(InvokeError::ArgumentCount { .. })
        ));
    }
}
