//! Reflection registry
//!
//! `Registry` is the synchronized handle over the reflection database:
//!
//! - the database sits behind a `parking_lot::RwLock`; its write half is the
//!   global registration lock, its read half serves lookups concurrently
//! - custom display names live behind their own `Mutex`, never held together
//!   with the database lock
//! - a `DashMap` from native `TypeId` to `TypeIdentity` lets `type_of` skip
//!   the lock entirely once a type is published
//! - an atomic count of issued identities lets `register_custom_name`
//!   validate an identity without touching the database lock
//!
//! Lookups hand out `Arc`-shared descriptors, so invokers always run after
//! every lock is released. Log events are emitted after release as well: a
//! subscriber may read the registry.

mod converter;
mod database;
mod global;
mod inheritance;
pub mod overload;
mod record;

use std::any::{type_name, Any, TypeId};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rtti_sdk::{BoxedValue, TypeIdentity, Variant, VariantError, VariantFactory, VariantResult};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, error, trace, warn};

use crate::descriptor::{
    ConstructorDescriptor, DestructorDescriptor, EnumerationDescriptor, Instance, MethodDescriptor,
    PropertyDescriptor,
};
use crate::error::{InvokeError, InvokeResult, RegistryError, RegistryResult};
use crate::metadata::{Metadata, MetadataKey};
use crate::options::{RegistryLimits, RegistryOptions};
use crate::reflect::Reflect;

pub use converter::{ConvertFn, TypeConverter};
pub use global::{global, type_of};
pub use inheritance::{BaseClassInfo, UpcastFn, UpcastMutFn};
pub use record::{TypeClassification, TypeRegistration};

use database::ReflectionDatabase;

type NativeCache = DashMap<TypeId, TypeIdentity, BuildHasherDefault<FxHasher>>;

/// Where a member lives: on a type, or in the global (free) tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Free properties and functions
    Global,
    /// Members of a type (and, for lookups, of its ancestors)
    Type(TypeIdentity),
}

impl From<TypeIdentity> for Scope {
    fn from(id: TypeIdentity) -> Self {
        Scope::Type(id)
    }
}

impl From<Option<TypeIdentity>> for Scope {
    fn from(id: Option<TypeIdentity>) -> Self {
        id.map_or(Scope::Global, Scope::Type)
    }
}

/// Process-wide store of runtime type information
pub struct Registry {
    database: RwLock<ReflectionDatabase>,
    custom_names: Mutex<FxHashMap<TypeIdentity, String>>,
    native: NativeCache,
    /// Identities issued so far; written under the database write lock
    issued: AtomicUsize,
    /// Set together with the database's poison flag
    poisoned: AtomicBool,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with default limits
    pub fn new() -> Self {
        Self::with_options(RegistryOptions::default())
    }

    /// Create a registry with explicit options
    pub fn with_options(options: RegistryOptions) -> Self {
        Self {
            database: RwLock::new(ReflectionDatabase::new(options.limits)),
            custom_names: Mutex::new(FxHashMap::default()),
            native: NativeCache::default(),
            issued: AtomicUsize::new(0),
            poisoned: AtomicBool::new(false),
        }
    }

    /// Configured capacity limits
    pub fn limits(&self) -> RegistryLimits {
        self.database.read().limits()
    }

    /// Check if a capacity violation has made the registry refuse registrations
    pub fn is_poisoned(&self) -> bool {
        self.database.read().is_poisoned()
    }

    // ========================================================================
    // Type registration
    // ========================================================================

    /// Identity of `T`, registering it (and its raw and base types) on first use
    pub fn type_of<T: Reflect>(&self) -> RegistryResult<TypeIdentity> {
        if let Some(id) = self.native_identity::<T>() {
            return Ok(id);
        }
        trace!(type_name = type_name::<T>(), "resolving type");
        let registration = TypeRegistration::of::<T>(self)?;
        self.register_type(registration)
    }

    /// Register a type, or return the identity already issued for its key
    pub fn register_type(&self, registration: TypeRegistration) -> RegistryResult<TypeIdentity> {
        let native = registration.native_type;
        let key = registration.canonical_key.clone();
        let outcome = {
            let mut database = self.database.write();
            let outcome = database.register_type(registration);
            match &outcome {
                Ok(registered) => {
                    if let Some(native) = native {
                        self.native.entry(native).or_insert(registered.id);
                    }
                    self.issued.store(database.type_count(), Ordering::Release);
                }
                Err(err) if err.is_fatal() => self.poisoned.store(true, Ordering::Release),
                Err(_) => {}
            }
            outcome
        };

        match &outcome {
            Ok(registered) if registered.created => {
                debug!(id = registered.id.as_u32(), name = %key, "registered type");
            }
            Err(err) if err.is_fatal() => error!(error = %err, "reflection registry poisoned"),
            Err(RegistryError::KeyConflict(_)) => {
                warn!(name = %key, "canonical key shared by two native types");
            }
            _ => {}
        }
        outcome.map(|registered| registered.id)
    }

    /// Register a constructor; the destructor of its declaring type is
    /// registered with the first one
    pub fn register_constructor(
        &self,
        id: TypeIdentity,
        constructor: ConstructorDescriptor,
    ) -> RegistryResult<()> {
        self.database.write().add_constructor(id, constructor)?;
        debug!(id = id.as_u32(), "registered constructor");
        Ok(())
    }

    /// Register a destructor; the first one registered for a type is kept
    pub fn register_destructor(
        &self,
        id: TypeIdentity,
        destructor: DestructorDescriptor,
    ) -> RegistryResult<()> {
        if self.database.write().add_destructor(id, destructor)? {
            debug!(id = id.as_u32(), "registered destructor");
        }
        Ok(())
    }

    /// Register the named values of an enum type
    pub fn register_enumeration(
        &self,
        id: TypeIdentity,
        enumeration: EnumerationDescriptor,
    ) -> RegistryResult<()> {
        self.database.write().add_enumeration(id, enumeration)?;
        debug!(id = id.as_u32(), "registered enumeration");
        Ok(())
    }

    /// Register a property on a type or globally; the last registration of a
    /// name wins
    pub fn register_property(
        &self,
        scope: impl Into<Scope>,
        property: PropertyDescriptor,
    ) -> RegistryResult<()> {
        let scope = scope.into();
        let name = property.name().to_string();
        self.database.write().add_property(scope, property)?;
        debug!(?scope, name = %name, "registered property");
        Ok(())
    }

    /// Register a method on a type or globally
    ///
    /// Returns `Ok(false)` when an overload with the same name and parameter
    /// types is already registered; the existing one is kept.
    pub fn register_method(
        &self,
        scope: impl Into<Scope>,
        method: MethodDescriptor,
    ) -> RegistryResult<bool> {
        let scope = scope.into();
        let name = method.name().to_string();
        let inserted = self.database.write().add_method(scope, method)?;
        if inserted {
            debug!(?scope, name = %name, "registered method");
        } else {
            debug!(?scope, name = %name, "ignored duplicate method overload");
        }
        Ok(inserted)
    }

    /// Give a type a display name
    pub fn register_custom_name(&self, id: TypeIdentity, name: impl Into<String>) -> RegistryResult<()> {
        if self.poisoned.load(Ordering::Acquire) {
            return Err(RegistryError::Poisoned);
        }
        // Identities are dense, so every index below the issued count is live
        let issued = self.issued.load(Ordering::Acquire);
        if !id.index().is_some_and(|index| index < issued) {
            return Err(RegistryError::UnknownType(id));
        }
        let name = name.into();
        debug!(id = id.as_u32(), name = %name, "registered custom name");
        self.custom_names.lock().insert(id, name);
        Ok(())
    }

    /// Attach metadata to a type, merged key by key
    pub fn register_metadata(&self, id: TypeIdentity, data: Vec<Metadata>) -> RegistryResult<()> {
        self.database.write().add_metadata(id, data)
    }

    /// Register a converter on its source type
    ///
    /// Converters are not de-duplicated; the first one registered for a
    /// target wins on lookup.
    pub fn register_type_converter(&self, converter: TypeConverter) -> RegistryResult<()> {
        let (source, target) = (converter.source(), converter.target());
        self.database.write().add_converter(converter)?;
        debug!(source = source.as_u32(), target = target.as_u32(), "registered converter");
        Ok(())
    }

    // ========================================================================
    // Type queries
    // ========================================================================

    /// Display name of a type: its custom name if any, else its canonical key
    pub fn type_name(&self, id: TypeIdentity) -> Option<String> {
        if let Some(name) = self.custom_names.lock().get(&id) {
            return Some(name.clone());
        }
        self.database.read().record(id).map(|record| record.name.clone())
    }

    /// Find a type by custom name or canonical key
    pub fn type_by_name(&self, name: &str) -> Option<TypeIdentity> {
        let custom = self
            .custom_names
            .lock()
            .iter()
            .find(|(_, custom)| custom.as_str() == name)
            .map(|(&id, _)| id);
        custom.or_else(|| self.database.read().lookup(name))
    }

    /// Raw (pointer-stripped) type; a raw type is its own raw type
    pub fn raw_type(&self, id: TypeIdentity) -> Option<TypeIdentity> {
        self.database.read().raw_of(id)
    }

    /// Classification flags
    pub fn classification(&self, id: TypeIdentity) -> Option<TypeClassification> {
        self.database.read().record(id).map(|record| record.classification)
    }

    /// Pointer depth (0 for non-pointers)
    pub fn pointer_depth(&self, id: TypeIdentity) -> Option<usize> {
        self.database.read().record(id).map(|record| record.pointer_depth)
    }

    /// Check if instances of the type can report their own identity
    pub fn has_dynamic_identity(&self, id: TypeIdentity) -> bool {
        self.database
            .read()
            .record(id)
            .is_some_and(|record| record.native_type.is_some())
    }

    /// All registered identities, in issue order
    pub fn types(&self) -> Vec<TypeIdentity> {
        (0..self.type_count()).map(TypeIdentity::from_index).collect()
    }

    /// Number of registered types
    pub fn type_count(&self) -> usize {
        self.database.read().type_count()
    }

    /// Direct and transitive bases, nearest first
    pub fn base_types(&self, id: TypeIdentity) -> Vec<TypeIdentity> {
        self.database
            .read()
            .record(id)
            .map(|record| record.ancestors.clone())
            .unwrap_or_default()
    }

    /// Direct and transitive derived types, in registration order
    pub fn derived_types(&self, id: TypeIdentity) -> Vec<TypeIdentity> {
        self.database
            .read()
            .record(id)
            .map(|record| record.derived.clone())
            .unwrap_or_default()
    }

    /// Check if `derived` is `base` or inherits from it
    pub fn is_derived_from(&self, derived: TypeIdentity, base: TypeIdentity) -> bool {
        inheritance::is_derived_from(self.database.read().records(), derived, base)
    }

    /// Metadata value attached to a type
    pub fn metadata(&self, id: TypeIdentity, key: impl Into<MetadataKey>) -> Option<Arc<Variant>> {
        self.database.read().metadata(id, &key.into())
    }

    /// Variant factory of a type
    pub fn variant_factory(&self, id: TypeIdentity) -> Option<VariantFactory> {
        self.database.read().record(id)?.variant_factory
    }

    /// Box a value into a variant through the type's factory
    ///
    /// The box comes back unchanged when the type is unknown, has no factory,
    /// or the value is of some other type.
    pub fn create_variant(&self, id: TypeIdentity, value: BoxedValue) -> Result<Variant, BoxedValue> {
        match self.variant_factory(id) {
            Some(factory) => factory(id, value),
            None => Err(value),
        }
    }

    // ========================================================================
    // Member queries
    // ========================================================================

    /// Constructors of a type
    pub fn constructors(&self, id: TypeIdentity) -> Vec<Arc<ConstructorDescriptor>> {
        self.database.read().constructors(id)
    }

    /// Constructor accepting exactly the given argument types
    pub fn find_constructor(
        &self,
        id: TypeIdentity,
        args: &[TypeIdentity],
    ) -> Option<Arc<ConstructorDescriptor>> {
        self.database.read().find_constructor(id, args)
    }

    /// Destructor of a type
    pub fn destructor(&self, id: TypeIdentity) -> Option<Arc<DestructorDescriptor>> {
        self.database.read().record(id)?.destructor.clone()
    }

    /// Named values of an enum type
    pub fn enumeration(&self, id: TypeIdentity) -> Option<Arc<EnumerationDescriptor>> {
        self.database.read().record(id)?.enumeration.clone()
    }

    /// Property by name
    pub fn find_property(&self, name: &str, scope: impl Into<Scope>) -> Option<Arc<PropertyDescriptor>> {
        self.database.read().find_property(name, scope.into())
    }

    /// First registered method with the given name
    pub fn find_method(&self, name: &str, scope: impl Into<Scope>) -> Option<Arc<MethodDescriptor>> {
        self.database.read().find_method(name, scope.into())
    }

    /// Overload with the given name accepting exactly the given argument types
    pub fn find_method_with_args(
        &self,
        name: &str,
        args: &[TypeIdentity],
        scope: impl Into<Scope>,
    ) -> Option<Arc<MethodDescriptor>> {
        self.database.read().find_method_with_args(name, args, scope.into())
    }

    /// Properties of a type including inherited ones
    pub fn properties(&self, id: TypeIdentity) -> Vec<Arc<PropertyDescriptor>> {
        self.database.read().properties(Scope::Type(id))
    }

    /// Methods of a type including inherited ones
    pub fn methods(&self, id: TypeIdentity) -> Vec<Arc<MethodDescriptor>> {
        self.database.read().methods(Scope::Type(id))
    }

    /// Global properties
    pub fn global_properties(&self) -> Vec<Arc<PropertyDescriptor>> {
        self.database.read().properties(Scope::Global)
    }

    /// Global functions
    pub fn global_methods(&self) -> Vec<Arc<MethodDescriptor>> {
        self.database.read().methods(Scope::Global)
    }

    /// First converter registered from `source` to `target`
    pub fn get_converter(&self, source: TypeIdentity, target: TypeIdentity) -> Option<Arc<TypeConverter>> {
        self.database.read().get_converter(source, target)
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Construct an instance with the constructor matching the arguments
    pub fn create(&self, id: TypeIdentity, args: &[Variant]) -> InvokeResult<Variant> {
        let arg_types: Vec<TypeIdentity> = args.iter().map(Variant::type_id).collect();
        let constructor = self.find_constructor(id, &arg_types).ok_or_else(|| {
            InvokeError::NoMatch(self.type_name(id).unwrap_or_else(|| format!("{:?}", id)))
        })?;
        constructor.invoke(args)
    }

    /// Call the overload of `name` matching the arguments
    ///
    /// Inherited methods receive the instance upcast to their declaring type.
    pub fn invoke(
        &self,
        scope: impl Into<Scope>,
        name: &str,
        instance: Instance<'_>,
        args: &[Variant],
    ) -> InvokeResult<Variant> {
        let arg_types: Vec<TypeIdentity> = args.iter().map(Variant::type_id).collect();
        let method = self
            .find_method_with_args(name, &arg_types, scope)
            .ok_or_else(|| InvokeError::NoMatch(name.to_string()))?;
        let instance = self.project(instance, method.declaring_type())?;
        method.invoke(instance, args)
    }

    /// Read a property by name
    pub fn get_property_value(
        &self,
        scope: impl Into<Scope>,
        name: &str,
        instance: Instance<'_>,
    ) -> InvokeResult<Variant> {
        let property = self
            .find_property(name, scope)
            .ok_or_else(|| InvokeError::NoMatch(name.to_string()))?;
        let instance = self.project(instance, property.declaring_type())?;
        property.get(instance)
    }

    /// Write a property by name
    pub fn set_property_value(
        &self,
        scope: impl Into<Scope>,
        name: &str,
        instance: Instance<'_>,
        value: Variant,
    ) -> InvokeResult<()> {
        let property = self
            .find_property(name, scope)
            .ok_or_else(|| InvokeError::NoMatch(name.to_string()))?;
        let instance = self.project(instance, property.declaring_type())?;
        property.set(instance, value)
    }

    /// Copy of `value` as `target`: a plain copy for the same type, else the
    /// first registered converter
    pub fn convert(&self, value: &Variant, target: TypeIdentity) -> Option<Variant> {
        if value.type_id() == target {
            return value.try_clone().ok();
        }
        self.get_converter(value.type_id(), target)?.convert(value)
    }

    /// Extract a `T`, converting through the registry when the stored type
    /// differs
    pub fn extract<T: Reflect + Clone>(&self, value: &Variant) -> VariantResult<T> {
        let mismatch = match value.extract::<T>() {
            Ok(exact) => return Ok(exact),
            Err(VariantError::Empty) => return Err(VariantError::Empty),
            Err(err) => err,
        };
        let converted = self
            .native_identity::<T>()
            .and_then(|target| self.convert(value, target));
        match converted {
            Some(converted) => converted.extract::<T>(),
            None => Err(mismatch),
        }
    }

    // ========================================================================
    // Dynamic identity and casting
    // ========================================================================

    /// Identity of the object's actual type, if that type was registered
    /// through `type_of`
    pub fn type_of_instance(&self, object: &dyn Any) -> Option<TypeIdentity> {
        self.native
            .get(&(*object).type_id())
            .map(|entry| *entry.value())
    }

    /// View `object` as `T`: the object itself, or one of its registered
    /// base sub-objects. Fails when `T` is not on the object's inheritance
    /// path.
    pub fn cast<'a, T: Reflect>(&self, object: &'a dyn Any) -> Option<&'a T> {
        if let Some(exact) = object.downcast_ref::<T>() {
            return Some(exact);
        }
        let path = self.path_to(object, self.native_identity::<T>()?)?;
        let mut current = object;
        for step in &path {
            current = step.upcast(current)?;
        }
        current.downcast_ref::<T>()
    }

    /// Mutable counterpart of [`Registry::cast`]
    pub fn cast_mut<'a, T: Reflect>(&self, object: &'a mut dyn Any) -> Option<&'a mut T> {
        if object.is::<T>() {
            return object.downcast_mut::<T>();
        }
        let path = self.path_to(object, self.native_identity::<T>()?)?;
        let mut current = object;
        for step in &path {
            current = step.upcast_mut(current)?;
        }
        current.downcast_mut::<T>()
    }

    fn native_identity<T: Any>(&self) -> Option<TypeIdentity> {
        self.native.get(&TypeId::of::<T>()).map(|entry| *entry.value())
    }

    /// Upcasts from the object's actual type to `target`, collected under the
    /// read lock so they can be applied after it is released
    fn path_to(&self, object: &dyn Any, target: TypeIdentity) -> Option<Vec<BaseClassInfo>> {
        let actual = self.type_of_instance(object)?;
        inheritance::upcast_path(self.database.read().records(), actual, target)
    }

    /// Upcast an instance to a member's declaring type
    fn project<'a>(
        &self,
        instance: Instance<'a>,
        declaring: Option<TypeIdentity>,
    ) -> InvokeResult<Instance<'a>> {
        let Some(declaring) = declaring else {
            return Ok(instance);
        };
        let declaring_name = || InvokeError::InstanceType {
            expected: self
                .type_name(declaring)
                .unwrap_or_else(|| format!("{:?}", declaring)),
        };
        match instance {
            Instance::Static => Ok(Instance::Static),
            Instance::Ref(object) => match self.path_to(object, declaring) {
                Some(path) => {
                    let mut current = object;
                    for step in &path {
                        current = step.upcast(current).ok_or_else(declaring_name)?;
                    }
                    Ok(Instance::Ref(current))
                }
                None => Ok(Instance::Ref(object)),
            },
            Instance::Mut(object) => match self.path_to(object, declaring) {
                Some(path) => {
                    let mut current = object;
                    for step in &path {
                        current = step.upcast_mut(current).ok_or_else(declaring_name)?;
                    }
                    Ok(Instance::Mut(current))
                }
                None => Ok(Instance::Mut(object)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::MethodPolicy;

    #[derive(Clone, Default)]
    struct Shape {
        width: i32,
    }

    impl Reflect for Shape {}

    #[test]
    fn test_type_of_is_cached() {
        let registry = Registry::new();
        let first = registry.type_of::<Shape>().unwrap();
        assert_eq!(registry.type_of::<Shape>().unwrap(), first);
        assert_eq!(registry.type_count(), 1);
        assert!(registry.has_dynamic_identity(first));
        assert_eq!(registry.type_of_instance(&Shape::default()), Some(first));
    }

    #[test]
    fn test_scope_conversions() {
        let id = TypeIdentity::from_raw(3);
        assert_eq!(Scope::from(id), Scope::Type(id));
        assert_eq!(Scope::from(None), Scope::Global);
        assert_eq!(Scope::from(Some(id)), Scope::Type(id));
    }

    #[test]
    fn test_custom_name() {
        let registry = Registry::new();
        let id = registry.type_of::<Shape>().unwrap();
        assert!(registry.type_name(id).unwrap().ends_with("Shape"));
        registry.register_custom_name(id, "shape").unwrap();
        assert_eq!(registry.type_name(id).as_deref(), Some("shape"));
        assert_eq!(registry.type_by_name("shape"), Some(id));
        assert_eq!(
            registry.register_custom_name(TypeIdentity::from_raw(99), "x"),
            Err(RegistryError::UnknownType(TypeIdentity::from_raw(99)))
        );
    }

    #[test]
    fn test_custom_name_skips_database_lock() {
        let registry = Registry::new();
        let id = registry.type_of::<Shape>().unwrap();

        let _registration = registry.database.write();
        registry.register_custom_name(id, "shape").unwrap();
        assert_eq!(
            registry.register_custom_name(TypeIdentity::from_raw(2), "x"),
            Err(RegistryError::UnknownType(TypeIdentity::from_raw(2)))
        );
        assert_eq!(
            registry.custom_names.lock().get(&id).map(String::as_str),
            Some("shape")
        );
    }

    #[test]
    fn test_custom_name_refused_when_poisoned() {
        let registry =
            Registry::with_options(RegistryOptions::with_limits(RegistryLimits::with_max_types(1)));
        let id = registry.type_of::<Shape>().unwrap();
        assert!(registry.type_of::<i32>().is_err());
        assert_eq!(
            registry.register_custom_name(id, "shape"),
            Err(RegistryError::Poisoned)
        );
    }

    #[test]
    fn test_discarded_return() {
        let registry = Registry::new();
        let shape = registry.type_of::<Shape>().unwrap();
        let method = MethodDescriptor::from_mut1::<Shape, i32, i32, _>(&registry, "grow", |s, by| {
            s.width += by;
            s.width
        })
        .unwrap()
        .with_policy(MethodPolicy::DiscardReturn);
        assert_eq!(method.return_type(), TypeIdentity::INVALID);
        registry.register_method(shape, method).unwrap();

        let int = registry.type_of::<i32>().unwrap();
        let mut object = Shape { width: 1 };
        let result = registry
            .invoke(shape, "grow", Instance::Mut(&mut object), &[Variant::new(int, 2i32)])
            .unwrap();
        assert!(!result.is_valid());
        assert_eq!(object.width, 3);
    }

    #[test]
    fn test_create_variant_rejects_wrong_value() {
        let registry = Registry::new();
        let int = registry.type_of::<i32>().unwrap();
        assert!(registry.create_variant(int, Box::new(4i32)).is_ok());
        assert!(registry.create_variant(int, Box::new("4")).is_err());
        assert!(registry
            .create_variant(TypeIdentity::INVALID, Box::new(4i32))
            .is_err());
    }
}
