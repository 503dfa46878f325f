//! Method descriptors

use std::fmt;
use std::sync::Arc;

use rtti_sdk::{TypeIdentity, Variant};

use super::{arg, check_arguments, instance_error, Instance, MethodPolicy, Signature, ValueBoxer};
use crate::error::{InvokeError, InvokeResult, RegistryResult};
use crate::metadata::{Metadata, MetadataKey, MetadataStore};
use crate::reflect::Reflect;
use crate::registry::Registry;

/// Calls a method on an instance with an argument list
pub type MethodInvoker =
    Arc<dyn Fn(Instance<'_>, &[Variant]) -> InvokeResult<Variant> + Send + Sync>;

/// One method (or free function) of a type
pub struct MethodDescriptor {
    name: String,
    declaring_type: Option<TypeIdentity>,
    return_type: TypeIdentity,
    parameter_types: Vec<TypeIdentity>,
    policy: MethodPolicy,
    invoker: MethodInvoker,
    metadata: MetadataStore,
}

impl MethodDescriptor {
    /// Create a method from a raw invoker
    ///
    /// `declaring_type` is `None` for free functions.
    pub fn new(
        name: impl Into<String>,
        declaring_type: Option<TypeIdentity>,
        return_type: TypeIdentity,
        parameter_types: Vec<TypeIdentity>,
        invoker: impl Fn(Instance<'_>, &[Variant]) -> InvokeResult<Variant> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            return_type,
            parameter_types,
            policy: MethodPolicy::ReturnValue,
            invoker: Arc::new(invoker),
            metadata: MetadataStore::new(),
        }
    }

    /// Change the invocation policy.
    ///
    /// `DiscardReturn` turns the declared return type into the invalid
    /// (void) identity.
    pub fn with_policy(mut self, policy: MethodPolicy) -> Self {
        self.policy = policy;
        if policy == MethodPolicy::DiscardReturn {
            self.return_type = TypeIdentity::INVALID;
        }
        self
    }

    /// Attach metadata (merged key by key)
    pub fn with_metadata(mut self, data: Vec<Metadata>) -> Self {
        self.metadata.merge(data);
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring type, `None` for free functions
    pub fn declaring_type(&self) -> Option<TypeIdentity> {
        self.declaring_type
    }

    /// Declared return type
    pub fn return_type(&self) -> TypeIdentity {
        self.return_type
    }

    /// Invocation policy
    pub fn policy(&self) -> MethodPolicy {
        self.policy
    }

    /// Check if this is a free function
    pub fn is_static(&self) -> bool {
        self.declaring_type.is_none()
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: impl Into<MetadataKey>) -> Option<Arc<Variant>> {
        self.metadata.get(&key.into())
    }

    /// Call the method, checking arguments against the signature
    pub fn invoke(&self, instance: Instance<'_>, args: &[Variant]) -> InvokeResult<Variant> {
        check_arguments(&self.parameter_types, args)?;
        let result = (self.invoker)(instance, args)?;
        match self.policy {
            MethodPolicy::ReturnValue => Ok(result),
            MethodPolicy::DiscardReturn => Ok(Variant::empty()),
        }
    }
}

impl Signature for MethodDescriptor {
    fn parameter_types(&self) -> &[TypeIdentity] {
        &self.parameter_types
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("return_type", &self.return_type)
            .field("parameter_types", &self.parameter_types)
            .field("policy", &self.policy)
            .finish()
    }
}

macro_rules! typed_methods {
    ($($by_ref:ident, $by_mut:ident, $free:ident => ($($A:ident : $i:tt),*));* $(;)?) => {
        impl MethodDescriptor {
            $(
                /// Method taking `&self` with the matching arity
                pub fn $by_ref<C, $($A,)* R, F>(
                    registry: &Registry,
                    name: impl Into<String>,
                    f: F,
                ) -> RegistryResult<Self>
                where
                    C: Reflect,
                    $($A: Reflect + Clone,)*
                    R: Reflect,
                    F: Fn(&C $(, $A)*) -> R + Send + Sync + 'static,
                {
                    let declaring = registry.type_of::<C>()?;
                    let boxer = ValueBoxer::of::<R>(registry)?;
                    let params = vec![$(registry.type_of::<$A>()?),*];
                    Ok(Self::new(name, Some(declaring), boxer.type_id(), params, move |instance, args| {
                        let _ = args;
                        let this = instance.downcast_ref::<C>().ok_or_else(instance_error::<C>)?;
                        boxer.wrap(f(this $(, arg::<$A>(args, $i)?)*))
                    }))
                }

                /// Method taking `&mut self` with the matching arity
                pub fn $by_mut<C, $($A,)* R, F>(
                    registry: &Registry,
                    name: impl Into<String>,
                    f: F,
                ) -> RegistryResult<Self>
                where
                    C: Reflect,
                    $($A: Reflect + Clone,)*
                    R: Reflect,
                    F: Fn(&mut C $(, $A)*) -> R + Send + Sync + 'static,
                {
                    let name = name.into();
                    let declaring = registry.type_of::<C>()?;
                    let boxer = ValueBoxer::of::<R>(registry)?;
                    let params = vec![$(registry.type_of::<$A>()?),*];
                    let method_name = name.clone();
                    Ok(Self::new(name, Some(declaring), boxer.type_id(), params, move |mut instance, args| {
                        let _ = args;
                        if instance.downcast_ref::<C>().is_none() {
                            return Err(instance_error::<C>());
                        }
                        let this = instance
                            .downcast_mut::<C>()
                            .ok_or_else(|| InvokeError::MissingInstance(method_name.clone()))?;
                        boxer.wrap(f(this $(, arg::<$A>(args, $i)?)*))
                    }))
                }

                /// Free function with the matching arity
                pub fn $free<$($A,)* R, F>(
                    registry: &Registry,
                    name: impl Into<String>,
                    f: F,
                ) -> RegistryResult<Self>
                where
                    $($A: Reflect + Clone,)*
                    R: Reflect,
                    F: Fn($($A),*) -> R + Send + Sync + 'static,
                {
                    let boxer = ValueBoxer::of::<R>(registry)?;
                    let params = vec![$(registry.type_of::<$A>()?),*];
                    Ok(Self::new(name, None, boxer.type_id(), params, move |_instance, args| {
                        let _ = args;
                        boxer.wrap(f($(arg::<$A>(args, $i)?),*))
                    }))
                }
            )*
        }
    };
}

typed_methods! {
    from_ref0, from_mut0, free0 => ();
    from_ref1, from_mut1, free1 => (A0: 0);
    from_ref2, from_mut2, free2 => (A0: 0, A1: 1);
    from_ref3, from_mut3, free3 => (A0: 0, A1: 1, A2: 2);
}
