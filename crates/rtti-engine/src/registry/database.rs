//! Reflection database
//!
//! Unsynchronized state behind `Registry`. Every method here is pure
//! bookkeeping: no user code runs while the database is borrowed, so the
//! registry can hold its lock across any of these calls. That includes
//! logging, since a subscriber is host code; `Registry` emits events after
//! the lock is released.

use std::sync::Arc;

use rtti_sdk::{TypeIdentity, Variant};
use rustc_hash::FxHashMap;

use super::converter::TypeConverter;
use super::inheritance::{ancestor_closure, BaseClassInfo};
use super::overload;
use super::record::{MemberTable, TypeRecord, TypeRegistration};
use super::Scope;
use crate::descriptor::{
    ConstructorDescriptor, DestructorDescriptor, EnumerationDescriptor, MethodDescriptor,
    PropertyDescriptor,
};
use crate::error::{RegistryError, RegistryResult};
use crate::metadata::{Metadata, MetadataKey};
use crate::options::RegistryLimits;

/// Outcome of a successful `register_type`
pub(crate) struct Registered {
    pub id: TypeIdentity,
    pub created: bool,
}

pub(crate) struct ReflectionDatabase {
    limits: RegistryLimits,
    records: Vec<TypeRecord>,
    by_name: FxHashMap<String, TypeIdentity>,
    /// Property arena; member tables hold indices into it
    properties: Vec<Arc<PropertyDescriptor>>,
    /// Method arena; member tables hold indices into it
    methods: Vec<Arc<MethodDescriptor>>,
    globals: MemberTable,
    poisoned: bool,
}

impl ReflectionDatabase {
    pub fn new(limits: RegistryLimits) -> Self {
        Self {
            limits,
            records: Vec::new(),
            by_name: FxHashMap::default(),
            properties: Vec::new(),
            methods: Vec::new(),
            globals: MemberTable::default(),
            poisoned: false,
        }
    }

    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn ensure_usable(&self) -> RegistryResult<()> {
        if self.poisoned {
            return Err(RegistryError::Poisoned);
        }
        Ok(())
    }

    fn poison(&mut self, err: RegistryError) -> RegistryError {
        self.poisoned = true;
        err
    }

    pub fn records(&self) -> &[TypeRecord] {
        &self.records
    }

    pub fn record(&self, id: TypeIdentity) -> Option<&TypeRecord> {
        self.records.get(id.index()?)
    }

    fn record_mut(&mut self, id: TypeIdentity) -> RegistryResult<&mut TypeRecord> {
        id.index()
            .and_then(|index| self.records.get_mut(index))
            .ok_or(RegistryError::UnknownType(id))
    }

    pub fn lookup(&self, canonical_key: &str) -> Option<TypeIdentity> {
        self.by_name.get(canonical_key).copied()
    }

    pub fn type_count(&self) -> usize {
        self.records.len()
    }

    /// Raw type of `id`; `id` itself for raw types
    pub fn raw_of(&self, id: TypeIdentity) -> Option<TypeIdentity> {
        self.record(id).map(|record| record.raw_type)
    }

    // ========================================================================
    // Type registration
    // ========================================================================

    pub fn register_type(&mut self, registration: TypeRegistration) -> RegistryResult<Registered> {
        self.ensure_usable()?;
        if let Some(id) = self.lookup(&registration.canonical_key) {
            let recorded = self.record(id).and_then(|record| record.native_type);
            if let (Some(recorded), Some(incoming)) = (recorded, registration.native_type) {
                if recorded != incoming {
                    return Err(RegistryError::KeyConflict(registration.canonical_key));
                }
            }
            return Ok(Registered { id, created: false });
        }

        let limit = self.limits.max_types;
        if self.records.len() >= limit {
            return Err(self.poison(RegistryError::CapacityExceeded { limit }));
        }

        for base in registration.bases.iter().map(BaseClassInfo::base) {
            if self.record(base).is_none() {
                return Err(RegistryError::UnknownType(base));
            }
        }
        if registration.raw_type.is_valid() && self.record(registration.raw_type).is_none() {
            return Err(RegistryError::UnknownType(registration.raw_type));
        }

        let limit = self.limits.max_inherit_types;
        let ancestors = ancestor_closure(&self.records, &registration.bases);
        if ancestors.len() > limit {
            let type_name = registration.canonical_key.clone();
            return Err(self.poison(RegistryError::InheritanceLimitExceeded { type_name, limit }));
        }
        let full = ancestors
            .iter()
            .filter_map(|&ancestor| self.record(ancestor))
            .find(|record| record.derived.len() >= limit)
            .map(|record| record.name.clone());
        if let Some(type_name) = full {
            return Err(self.poison(RegistryError::InheritanceLimitExceeded { type_name, limit }));
        }

        let id = TypeIdentity::from_index(self.records.len());
        for &ancestor in &ancestors {
            if let Some(record) = ancestor.index().and_then(|i| self.records.get_mut(i)) {
                record.derived.push(id);
            }
        }

        let TypeRegistration {
            canonical_key,
            raw_type,
            bases,
            classification,
            variant_factory,
            pointer_depth,
            native_type,
        } = registration;

        self.by_name.insert(canonical_key.clone(), id);
        self.records.push(TypeRecord {
            name: canonical_key,
            raw_type: if raw_type.is_valid() { raw_type } else { id },
            bases,
            ancestors,
            derived: Vec::new(),
            classification,
            pointer_depth,
            variant_factory,
            native_type,
            metadata: Default::default(),
            class_data: None,
            destructor: None,
            enumeration: None,
            converters: Vec::new(),
        });
        Ok(Registered { id, created: true })
    }

    // ========================================================================
    // Member registration
    // ========================================================================

    /// Member table of a scope, resolving types to their raw type
    fn table_mut<'a>(
        records: &'a mut [TypeRecord],
        globals: &'a mut MemberTable,
        scope: Scope,
    ) -> RegistryResult<&'a mut MemberTable> {
        match scope {
            Scope::Global => Ok(globals),
            Scope::Type(id) => {
                let raw = id
                    .index()
                    .and_then(|i| records.get(i))
                    .map(|record| record.raw_type)
                    .ok_or(RegistryError::UnknownType(id))?;
                raw.index()
                    .and_then(|i| records.get_mut(i))
                    .map(|record| &mut record.class_data_mut().members)
                    .ok_or(RegistryError::UnknownType(raw))
            }
        }
    }

    pub fn add_constructor(
        &mut self,
        id: TypeIdentity,
        constructor: ConstructorDescriptor,
    ) -> RegistryResult<()> {
        self.ensure_usable()?;
        let raw = self.raw_of(id).ok_or(RegistryError::UnknownType(id))?;
        // Instances carry the declaring identity, which may be a pointer type
        // of `raw`; the destructor has to match them.
        let declaring = constructor.declaring_type();
        if self.record(declaring).is_none() {
            return Err(RegistryError::UnknownType(declaring));
        }
        self.record_mut(raw)?
            .class_data_mut()
            .constructors
            .push(Arc::new(constructor));
        let owner = self.record_mut(declaring)?;
        if owner.destructor.is_none() {
            owner.destructor = Some(Arc::new(DestructorDescriptor::new(declaring)));
        }
        Ok(())
    }

    /// Returns false when a destructor was already present
    pub fn add_destructor(
        &mut self,
        id: TypeIdentity,
        destructor: DestructorDescriptor,
    ) -> RegistryResult<bool> {
        self.ensure_usable()?;
        let record = self.record_mut(id)?;
        if record.destructor.is_some() {
            return Ok(false);
        }
        record.destructor = Some(Arc::new(destructor));
        Ok(true)
    }

    pub fn add_enumeration(
        &mut self,
        id: TypeIdentity,
        enumeration: EnumerationDescriptor,
    ) -> RegistryResult<()> {
        self.ensure_usable()?;
        self.record_mut(id)?.enumeration = Some(Arc::new(enumeration));
        Ok(())
    }

    /// Last registration of a name wins
    pub fn add_property(&mut self, scope: Scope, property: PropertyDescriptor) -> RegistryResult<()> {
        self.ensure_usable()?;
        let table = Self::table_mut(&mut self.records, &mut self.globals, scope)?;
        table
            .properties
            .insert(property.name().to_string(), self.properties.len());
        self.properties.push(Arc::new(property));
        Ok(())
    }

    /// Returns false (and drops `method`) when an overload with the same
    /// parameter list already exists
    pub fn add_method(&mut self, scope: Scope, method: MethodDescriptor) -> RegistryResult<bool> {
        self.ensure_usable()?;
        let table = Self::table_mut(&mut self.records, &mut self.globals, scope)?;
        let arena = &self.methods;
        let overloads = table.methods.entry(method.name().to_string()).or_default();
        let existing = overloads.iter().filter_map(|&index| arena.get(index));
        if overload::is_already_registered(&method, existing) {
            return Ok(false);
        }
        overloads.push(arena.len());
        self.methods.push(Arc::new(method));
        Ok(true)
    }

    pub fn add_metadata(&mut self, id: TypeIdentity, data: Vec<Metadata>) -> RegistryResult<()> {
        self.ensure_usable()?;
        self.record_mut(id)?.metadata.merge(data);
        Ok(())
    }

    pub fn add_converter(&mut self, converter: TypeConverter) -> RegistryResult<()> {
        self.ensure_usable()?;
        let target = converter.target();
        if self.record(target).is_none() {
            return Err(RegistryError::UnknownType(target));
        }
        self.record_mut(converter.source())?
            .converters
            .push(Arc::new(converter));
        Ok(())
    }

    // ========================================================================
    // Member lookup
    // ========================================================================

    /// Member tables searched for a scope: the raw type's own table, then
    /// its ancestors breadth-first
    fn tables(&self, scope: Scope) -> Vec<&MemberTable> {
        let id = match scope {
            Scope::Global => return vec![&self.globals],
            Scope::Type(id) => id,
        };
        let Some(raw) = self.raw_of(id).and_then(|raw| self.record(raw)) else {
            return Vec::new();
        };
        std::iter::once(raw)
            .chain(raw.ancestors.iter().filter_map(|&ancestor| self.record(ancestor)))
            .filter_map(|record| record.class_data.as_ref())
            .map(|class| &class.members)
            .collect()
    }

    pub fn find_property(&self, name: &str, scope: Scope) -> Option<Arc<PropertyDescriptor>> {
        self.tables(scope)
            .into_iter()
            .find_map(|table| table.properties.get(name))
            .and_then(|&index| self.properties.get(index))
            .cloned()
    }

    pub fn find_method(&self, name: &str, scope: Scope) -> Option<Arc<MethodDescriptor>> {
        self.tables(scope)
            .into_iter()
            .find_map(|table| table.methods.get(name)?.first())
            .and_then(|&index| self.methods.get(index))
            .cloned()
    }

    pub fn find_method_with_args(
        &self,
        name: &str,
        args: &[TypeIdentity],
        scope: Scope,
    ) -> Option<Arc<MethodDescriptor>> {
        self.tables(scope).into_iter().find_map(|table| {
            let overloads = table
                .methods
                .get(name)?
                .iter()
                .filter_map(|&index| self.methods.get(index));
            overload::select(overloads, args).cloned()
        })
    }

    /// Properties visible in a scope, in registration order; derived
    /// properties hide inherited ones of the same name
    pub fn properties(&self, scope: Scope) -> Vec<Arc<PropertyDescriptor>> {
        let mut seen: Vec<&str> = Vec::new();
        let mut indices: Vec<usize> = Vec::new();
        for table in self.tables(scope) {
            for (name, &index) in &table.properties {
                if !seen.contains(&name.as_str()) {
                    seen.push(name);
                    indices.push(index);
                }
            }
        }
        indices.sort_unstable();
        indices
            .into_iter()
            .filter_map(|index| self.properties.get(index).cloned())
            .collect()
    }

    /// Methods visible in a scope, including inherited overloads, in
    /// registration order
    pub fn methods(&self, scope: Scope) -> Vec<Arc<MethodDescriptor>> {
        let mut indices: Vec<usize> = self
            .tables(scope)
            .into_iter()
            .flat_map(|table| table.methods.values().flatten().copied())
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .filter_map(|index| self.methods.get(index).cloned())
            .collect()
    }

    pub fn constructors(&self, id: TypeIdentity) -> Vec<Arc<ConstructorDescriptor>> {
        self.raw_of(id)
            .and_then(|raw| self.record(raw))
            .and_then(|record| record.class_data.as_ref())
            .map(|class| class.constructors.clone())
            .unwrap_or_default()
    }

    pub fn find_constructor(
        &self,
        id: TypeIdentity,
        args: &[TypeIdentity],
    ) -> Option<Arc<ConstructorDescriptor>> {
        let class = self
            .raw_of(id)
            .and_then(|raw| self.record(raw))?
            .class_data
            .as_ref()?;
        overload::select(&class.constructors, args).cloned()
    }

    pub fn get_converter(
        &self,
        source: TypeIdentity,
        target: TypeIdentity,
    ) -> Option<Arc<TypeConverter>> {
        self.record(source)?
            .converters
            .iter()
            .find(|converter| converter.target() == target)
            .cloned()
    }

    pub fn metadata(&self, id: TypeIdentity, key: &MetadataKey) -> Option<Arc<Variant>> {
        self.record(id)?.metadata.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::record::TypeClassification;

    fn db_with_limits(max_types: usize, max_inherit_types: usize) -> ReflectionDatabase {
        ReflectionDatabase::new(RegistryLimits {
            max_types,
            max_inherit_types,
        })
    }

    fn plain(db: &mut ReflectionDatabase, key: &str) -> TypeIdentity {
        db.register_type(TypeRegistration::new(key)).unwrap().id
    }

    struct Node;

    fn child_of(key: &str, base: TypeIdentity) -> TypeRegistration {
        TypeRegistration::new(key).with_base(BaseClassInfo::new::<Node, Node>(base, |n| n, |n| n))
    }

    #[test]
    fn test_identities_are_dense_and_one_based() {
        let mut db = db_with_limits(10, 10);
        assert_eq!(plain(&mut db, "a").as_u32(), 1);
        assert_eq!(plain(&mut db, "b").as_u32(), 2);
        assert_eq!(db.type_count(), 2);
    }

    #[test]
    fn test_reregistration_is_idempotent() {
        let mut db = db_with_limits(10, 10);
        let first = plain(&mut db, "a");
        let again = db
            .register_type(TypeRegistration::new("a").with_classification(TypeClassification::primitive()))
            .unwrap();
        assert_eq!(again.id, first);
        assert!(!again.created);
        assert!(db.record(first).unwrap().classification.is_class);
    }

    #[test]
    fn test_raw_type_defaults_to_self() {
        let mut db = db_with_limits(10, 10);
        let a = plain(&mut db, "a");
        let ptr = db
            .register_type(TypeRegistration::new("*a").with_raw_type(a))
            .unwrap()
            .id;
        assert_eq!(db.raw_of(a), Some(a));
        assert_eq!(db.raw_of(ptr), Some(a));
    }

    #[test]
    fn test_capacity_poisons() {
        let mut db = db_with_limits(1, 10);
        plain(&mut db, "a");
        assert_eq!(
            db.register_type(TypeRegistration::new("b")).err(),
            Some(RegistryError::CapacityExceeded { limit: 1 })
        );
        assert!(db.is_poisoned());
        assert_eq!(
            db.register_type(TypeRegistration::new("a")).err(),
            Some(RegistryError::Poisoned)
        );
        assert_eq!(db.type_count(), 1);
    }

    #[test]
    fn test_derived_lists_are_back_filled() {
        let mut db = db_with_limits(10, 10);
        let object = plain(&mut db, "Object");
        let shape = db.register_type(child_of("Shape", object)).unwrap().id;
        let circle = db.register_type(child_of("Circle", shape)).unwrap().id;

        assert_eq!(db.record(circle).unwrap().ancestors, vec![shape, object]);
        assert_eq!(db.record(object).unwrap().derived, vec![shape, circle]);
        assert_eq!(db.record(shape).unwrap().derived, vec![circle]);
    }

    #[test]
    fn test_derived_list_limit() {
        let mut db = db_with_limits(10, 1);
        let object = plain(&mut db, "Object");
        db.register_type(child_of("Shape", object)).unwrap();
        let err = db.register_type(child_of("Animal", object)).err();
        assert_eq!(
            err,
            Some(RegistryError::InheritanceLimitExceeded {
                type_name: "Object".to_string(),
                limit: 1
            })
        );
        assert!(db.is_poisoned());
        assert!(db.record(object).map(|r| r.derived.len()) == Some(1));
    }

    #[test]
    fn test_key_shared_by_two_native_types_is_rejected() {
        use std::any::TypeId;

        let mut db = db_with_limits(10, 10);
        let first = db
            .register_type(TypeRegistration::new("Node").with_native_type(TypeId::of::<Node>()))
            .unwrap()
            .id;
        assert_eq!(
            db.register_type(TypeRegistration::new("Node").with_native_type(TypeId::of::<u8>()))
                .err(),
            Some(RegistryError::KeyConflict("Node".to_string()))
        );
        assert!(!db.is_poisoned());

        // Same native type, or a registration without one, is a plain hit
        let again = db
            .register_type(TypeRegistration::new("Node").with_native_type(TypeId::of::<Node>()))
            .unwrap();
        assert_eq!(again.id, first);
        assert_eq!(db.register_type(TypeRegistration::new("Node")).unwrap().id, first);
        assert_eq!(db.type_count(), 1);
    }

    #[test]
    fn test_constructor_destructor_follows_declaring_type() {
        let mut db = db_with_limits(10, 10);
        let node = plain(&mut db, "Node");
        let boxed = db
            .register_type(TypeRegistration::new("Box<Node>").with_raw_type(node))
            .unwrap()
            .id;

        let ctor = ConstructorDescriptor::new(boxed, Vec::new(), move |_| {
            Ok(Variant::move_only(boxed, Box::new(0u8)))
        });
        db.add_constructor(boxed, ctor).unwrap();

        assert_eq!(db.constructors(node).len(), 1);
        assert_eq!(
            db.record(boxed).and_then(|r| r.destructor.as_ref()).map(|d| d.declaring_type()),
            Some(boxed)
        );
        assert!(db.record(node).and_then(|r| r.destructor.as_ref()).is_none());
    }

    #[test]
    fn test_constructor_for_unknown_declaring_type_is_rejected() {
        let mut db = db_with_limits(10, 10);
        let node = plain(&mut db, "Node");
        let missing = TypeIdentity::from_raw(7);
        let ctor = ConstructorDescriptor::new(missing, Vec::new(), |_| Ok(Variant::empty()));
        assert_eq!(
            db.add_constructor(node, ctor).err(),
            Some(RegistryError::UnknownType(missing))
        );
        assert!(db.constructors(node).is_empty());
    }

    #[test]
    fn test_unknown_base_is_rejected() {
        let mut db = db_with_limits(10, 10);
        let missing = TypeIdentity::from_raw(9);
        assert_eq!(
            db.register_type(child_of("Shape", missing)).err(),
            Some(RegistryError::UnknownType(missing))
        );
        assert!(!db.is_poisoned());
    }
}
