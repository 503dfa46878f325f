//! rtti SDK - value-level types shared by the reflection registry and its clients
//!
//! This crate provides the pieces that travel across the reflection boundary
//! without pulling in the registry itself:
//!
//! - [`TypeIdentity`]: dense, 1-based id of a registered type
//! - [`Variant`]: type-erased container owning one value of a registered type
//! - [`VariantFactory`]: per-type function boxing a value into a `Variant`
//!
//! # Example
//!
//! ```ignore
//! use rtti_sdk::{TypeIdentity, Variant};
//!
//! let id = TypeIdentity::from_raw(1);
//! let v = Variant::new(id, 42i32);
//! assert_eq!(v.extract::<i32>(), Ok(42));
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod factory;
pub mod identity;
pub mod value;

pub use error::{VariantError, VariantResult};
pub use factory::{copyable_factory, move_only_factory, BoxedValue, VariantFactory};
pub use identity::TypeIdentity;
pub use value::Variant;
