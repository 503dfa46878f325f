//! Property descriptors

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rtti_sdk::{TypeIdentity, Variant};

use super::{instance_error, AccessPolicy, Instance, ValueBoxer};
use crate::error::{InvokeError, InvokeResult, RegistryResult};
use crate::metadata::{Metadata, MetadataKey, MetadataStore};
use crate::reflect::Reflect;
use crate::registry::Registry;

/// Reads a property value from an instance
pub type Getter = Arc<dyn Fn(Instance<'_>) -> InvokeResult<Variant> + Send + Sync>;

/// Writes a property value into an instance
pub type Setter = Arc<dyn Fn(Instance<'_>, Variant) -> InvokeResult<()> + Send + Sync>;

/// One property of a class, or a global property
pub struct PropertyDescriptor {
    name: String,
    declaring_type: Option<TypeIdentity>,
    value_type: TypeIdentity,
    access: AccessPolicy,
    getter: Getter,
    setter: Option<Setter>,
    metadata: MetadataStore,
}

impl PropertyDescriptor {
    /// Create a read-only property from a raw getter
    pub fn new(
        name: impl Into<String>,
        declaring_type: Option<TypeIdentity>,
        value_type: TypeIdentity,
        getter: impl Fn(Instance<'_>) -> InvokeResult<Variant> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            declaring_type,
            value_type,
            access: AccessPolicy::ReadOnly,
            getter: Arc::new(getter),
            setter: None,
            metadata: MetadataStore::new(),
        }
    }

    /// Add a setter, making the property read-write
    pub fn with_setter(
        mut self,
        setter: impl Fn(Instance<'_>, Variant) -> InvokeResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.setter = Some(Arc::new(setter));
        self.access = AccessPolicy::ReadWrite;
        self
    }

    /// Attach metadata (merged key by key)
    pub fn with_metadata(mut self, data: Vec<Metadata>) -> Self {
        self.metadata.merge(data);
        self
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring type, `None` for global properties
    pub fn declaring_type(&self) -> Option<TypeIdentity> {
        self.declaring_type
    }

    /// Type of the property value
    pub fn value_type(&self) -> TypeIdentity {
        self.value_type
    }

    /// Access policy
    pub fn access(&self) -> AccessPolicy {
        self.access
    }

    /// Check if writes are rejected
    pub fn is_read_only(&self) -> bool {
        self.access == AccessPolicy::ReadOnly
    }

    /// Check if this is a global property
    pub fn is_static(&self) -> bool {
        self.declaring_type.is_none()
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: impl Into<MetadataKey>) -> Option<Arc<Variant>> {
        self.metadata.get(&key.into())
    }

    /// Read the property
    pub fn get(&self, instance: Instance<'_>) -> InvokeResult<Variant> {
        (self.getter)(instance)
    }

    /// Write the property; the value must have exactly the property's type
    pub fn set(&self, instance: Instance<'_>, value: Variant) -> InvokeResult<()> {
        let setter = match (&self.setter, self.access) {
            (Some(setter), AccessPolicy::ReadWrite) => setter,
            _ => return Err(InvokeError::ReadOnly(self.name.clone())),
        };
        if value.type_id() != self.value_type {
            return Err(InvokeError::ArgumentType {
                index: 0,
                expected: format!("{:?}", self.value_type),
                got: value.value_type_name().to_string(),
            });
        }
        setter(instance, value)
    }

    // ========================================================================
    // Typed builders
    // ========================================================================

    /// Read-write property backed by a field of `C`
    pub fn field<C: Reflect, T: Reflect + Clone>(
        registry: &Registry,
        name: impl Into<String>,
        get: fn(&C) -> &T,
        get_mut: fn(&mut C) -> &mut T,
    ) -> RegistryResult<Self> {
        Self::accessors::<C, T, _, _>(registry, name, move |this| get(this).clone(), move |this, value| {
            *get_mut(this) = value;
        })
    }

    /// Read-only property backed by a field of `C`
    pub fn readonly_field<C: Reflect, T: Reflect + Clone>(
        registry: &Registry,
        name: impl Into<String>,
        get: fn(&C) -> &T,
    ) -> RegistryResult<Self> {
        Self::getter::<C, T, _>(registry, name, move |this| get(this).clone())
    }

    /// Read-only property computed from `&C`
    pub fn getter<C, T, G>(registry: &Registry, name: impl Into<String>, getter: G) -> RegistryResult<Self>
    where
        C: Reflect,
        T: Reflect,
        G: Fn(&C) -> T + Send + Sync + 'static,
    {
        let declaring = registry.type_of::<C>()?;
        let boxer = ValueBoxer::of::<T>(registry)?;
        Ok(Self::new(name, Some(declaring), boxer.type_id(), move |instance| {
            let this = instance.downcast_ref::<C>().ok_or_else(instance_error::<C>)?;
            boxer.wrap(getter(this))
        }))
    }

    /// Read-write property backed by a getter and a setter on `C`
    pub fn accessors<C, T, G, S>(
        registry: &Registry,
        name: impl Into<String>,
        getter: G,
        setter: S,
    ) -> RegistryResult<Self>
    where
        C: Reflect,
        T: Reflect,
        G: Fn(&C) -> T + Send + Sync + 'static,
        S: Fn(&mut C, T) + Send + Sync + 'static,
    {
        let name = name.into();
        let property_name = name.clone();
        Ok(Self::getter::<C, T, G>(registry, name, getter)?.with_setter(
            move |mut instance, value| {
                if instance.downcast_ref::<C>().is_none() {
                    return Err(instance_error::<C>());
                }
                let this = instance
                    .downcast_mut::<C>()
                    .ok_or_else(|| InvokeError::MissingInstance(property_name.clone()))?;
                let value = value.take::<T>().map_err(|value| InvokeError::ArgumentType {
                    index: 0,
                    expected: std::any::type_name::<T>().to_string(),
                    got: value.value_type_name().to_string(),
                })?;
                setter(this, value);
                Ok(())
            },
        ))
    }

    /// Read-write global property backed by a shared cell
    pub fn global<T: Reflect + Clone>(
        registry: &Registry,
        name: impl Into<String>,
        cell: Arc<RwLock<T>>,
    ) -> RegistryResult<Self> {
        let boxer = ValueBoxer::of::<T>(registry)?;
        let reader = Arc::clone(&cell);
        let name = name.into();
        let property_name = name.clone();
        Ok(Self::new(name, None, boxer.type_id(), move |_instance| {
            boxer.wrap(reader.read().clone())
        })
        .with_setter(move |_instance, value| {
            let value = value.take::<T>().map_err(|value| InvokeError::ArgumentType {
                index: 0,
                expected: property_name.clone(),
                got: value.value_type_name().to_string(),
            })?;
            *cell.write() = value;
            Ok(())
        }))
    }

    /// Read-only global property holding a constant
    pub fn global_readonly<T: Reflect + Clone>(
        registry: &Registry,
        name: impl Into<String>,
        value: T,
    ) -> RegistryResult<Self> {
        let boxer = ValueBoxer::of::<T>(registry)?;
        Ok(Self::new(name, None, boxer.type_id(), move |_instance| {
            boxer.wrap(value.clone())
        }))
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("value_type", &self.value_type)
            .field("access", &self.access)
            .finish()
    }
}
