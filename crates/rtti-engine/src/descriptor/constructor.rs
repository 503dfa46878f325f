//! Constructor descriptors

use std::fmt;
use std::sync::Arc;

use rtti_sdk::{TypeIdentity, Variant};

use super::{arg, check_arguments, Signature, ValueBoxer};
use crate::error::{InvokeResult, RegistryResult};
use crate::metadata::{Metadata, MetadataKey, MetadataStore};
use crate::reflect::Reflect;
use crate::registry::Registry;

/// Builds a new instance from an argument list
pub type ConstructorInvoker = Arc<dyn Fn(&[Variant]) -> InvokeResult<Variant> + Send + Sync>;

/// One constructor of a class
pub struct ConstructorDescriptor {
    declaring_type: TypeIdentity,
    parameter_types: Vec<TypeIdentity>,
    invoker: ConstructorInvoker,
    metadata: MetadataStore,
}

impl ConstructorDescriptor {
    /// Create a constructor from a raw invoker
    pub fn new(
        declaring_type: TypeIdentity,
        parameter_types: Vec<TypeIdentity>,
        invoker: impl Fn(&[Variant]) -> InvokeResult<Variant> + Send + Sync + 'static,
    ) -> Self {
        Self {
            declaring_type,
            parameter_types,
            invoker: Arc::new(invoker),
            metadata: MetadataStore::new(),
        }
    }

    /// Attach metadata (merged key by key)
    pub fn with_metadata(mut self, data: Vec<Metadata>) -> Self {
        self.metadata.merge(data);
        self
    }

    /// The type this constructor instantiates
    pub fn declaring_type(&self) -> TypeIdentity {
        self.declaring_type
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: impl Into<MetadataKey>) -> Option<Arc<Variant>> {
        self.metadata.get(&key.into())
    }

    /// Construct a new instance, checking arguments against the signature
    pub fn invoke(&self, args: &[Variant]) -> InvokeResult<Variant> {
        check_arguments(&self.parameter_types, args)?;
        (self.invoker)(args)
    }
}

impl Signature for ConstructorDescriptor {
    fn parameter_types(&self) -> &[TypeIdentity] {
        &self.parameter_types
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("declaring_type", &self.declaring_type)
            .field("parameter_types", &self.parameter_types)
            .finish()
    }
}

macro_rules! typed_constructors {
    ($($name:ident => ($($A:ident : $i:tt),*)),* $(,)?) => {
        impl ConstructorDescriptor {
            $(
                /// Constructor backed by a Rust function with the matching arity
                pub fn $name<C, $($A,)* F>(registry: &Registry, f: F) -> RegistryResult<Self>
                where
                    C: Reflect,
                    $($A: Reflect + Clone,)*
                    F: Fn($($A),*) -> C + Send + Sync + 'static,
                {
                    let boxer = ValueBoxer::of::<C>(registry)?;
                    let params = vec![$(registry.type_of::<$A>()?),*];
                    Ok(Self::new(boxer.type_id(), params, move |args| {
                        let _ = args;
                        boxer.wrap(f($(arg::<$A>(args, $i)?),*))
                    }))
                }
            )*
        }
    };
}

typed_constructors! {
    from_fn0 => (),
    from_fn1 => (A0: 0),
    from_fn2 => (A0: 0, A1: 1),
    from_fn3 => (A0: 0, A1: 1, A2: 2),
}
