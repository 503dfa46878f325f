//! Enumeration descriptors

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rtti_sdk::{TypeIdentity, Variant};

use crate::error::RegistryResult;
use crate::metadata::{Metadata, MetadataKey, MetadataStore};
use crate::reflect::Reflect;
use crate::registry::Registry;

type ValueEq = fn(&dyn Any, &dyn Any) -> bool;

fn values_equal<E: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<E>(), b.downcast_ref::<E>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Named values of an enum type
///
/// Stored against the enum type itself. `declaring_type` is the class the
/// enum was declared in, or `None` for a free enum.
pub struct EnumerationDescriptor {
    enum_type: TypeIdentity,
    declaring_type: Option<TypeIdentity>,
    entries: Vec<(String, Variant)>,
    eq: ValueEq,
    metadata: MetadataStore,
}

impl EnumerationDescriptor {
    /// Build from ordered (name, value) pairs
    pub fn new<E: Reflect + Clone + PartialEq>(
        registry: &Registry,
        declaring_type: Option<TypeIdentity>,
        entries: Vec<(&str, E)>,
    ) -> RegistryResult<Self> {
        let enum_type = registry.type_of::<E>()?;
        let entries = entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), Variant::new(enum_type, value)))
            .collect();
        Ok(Self {
            enum_type,
            declaring_type,
            entries,
            eq: values_equal::<E>,
            metadata: MetadataStore::new(),
        })
    }

    /// Attach metadata (merged key by key)
    pub fn with_metadata(mut self, data: Vec<Metadata>) -> Self {
        self.metadata.merge(data);
        self
    }

    /// The enum type
    pub fn enum_type(&self) -> TypeIdentity {
        self.enum_type
    }

    /// Declaring class, `None` for a free enum
    pub fn declaring_type(&self) -> Option<TypeIdentity> {
        self.declaring_type
    }

    /// Entry names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Entry values in declaration order
    pub fn values(&self) -> impl Iterator<Item = &Variant> + '_ {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value with the given name
    pub fn value_of(&self, name: &str) -> Option<&Variant> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Name of the first entry equal to `value`
    pub fn name_of(&self, value: &Variant) -> Option<&str> {
        if value.type_id() != self.enum_type {
            return None;
        }
        let needle = value.as_any()?;
        self.entries
            .iter()
            .find(|(_, entry)| entry.as_any().is_some_and(|entry| (self.eq)(entry, needle)))
            .map(|(name, _)| name.as_str())
    }

    /// Look up a metadata value
    pub fn metadata(&self, key: impl Into<MetadataKey>) -> Option<Arc<Variant>> {
        self.metadata.get(&key.into())
    }
}

impl fmt::Debug for EnumerationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumerationDescriptor")
            .field("enum_type", &self.enum_type)
            .field("declaring_type", &self.declaring_type)
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}
