//! rtti Engine - runtime type reflection registry
//!
//! This crate provides the reflection database and everything around it:
//! - **Registry**: identity assignment, member tables, inheritance graph and
//!   converter tables behind one synchronized handle (`registry` module)
//! - **Descriptors**: constructors, destructors, properties, methods and
//!   enumerations as immutable, type-erased records (`descriptor` module)
//! - **Reflect**: the canonical-key contract a type implements to take part
//!   in reflection (`reflect` module)
//! - **Metadata**: integer- or string-keyed values attached to types and
//!   members (`metadata` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use rtti_engine::{Instance, MethodDescriptor, Reflect, Registry};
//!
//! #[derive(Clone)]
//! struct Shape { width: i32 }
//! impl Reflect for Shape {}
//!
//! let registry = Registry::new();
//! let shape = registry.type_of::<Shape>()?;
//! registry.register_method(
//!     shape,
//!     MethodDescriptor::from_ref0::<Shape, i32, _>(&registry, "width", |s| s.width)?,
//! )?;
//!
//! let value = registry.invoke(shape, "width", Instance::Ref(&Shape { width: 4 }), &[])?;
//! assert_eq!(value.extract::<i32>(), Ok(4));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Built-in capacity constants
pub mod defaults;

/// Member descriptors and invocation
pub mod descriptor;

/// Registry and invocation errors
pub mod error;

/// Metadata keys, entries and stores
pub mod metadata;

/// Registry configuration
pub mod options;

/// The canonical-key contract
pub mod reflect;

/// Reflection database, overload resolution, inheritance and converters
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use descriptor::{
    AccessPolicy, ConstructorDescriptor, DestructorDescriptor, EnumerationDescriptor, Instance,
    MethodDescriptor, MethodPolicy, PropertyDescriptor, Signature,
};
pub use error::{InvokeError, InvokeResult, RegistryError, RegistryResult};
pub use metadata::{Metadata, MetadataKey, MetadataStore};
pub use options::{RegistryLimits, RegistryOptions};
pub use reflect::Reflect;
pub use registry::{
    global, type_of, BaseClassInfo, Registry, Scope, TypeClassification, TypeConverter,
    TypeRegistration,
};

pub use rtti_sdk::{
    copyable_factory, move_only_factory, BoxedValue, TypeIdentity, Variant, VariantError,
    VariantFactory, VariantResult,
};
