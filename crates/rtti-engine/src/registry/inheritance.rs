//! Inheritance graph and handle casting
//!
//! Each (derived, base) edge carries an upcast that turns a handle to the
//! derived object into a handle to its base sub-object. Casting from an
//! object's actual type to a requested ancestor chains the upcasts along a
//! path through the direct-base graph. The graph is acyclic by
//! construction: a type's bases must already be registered when the type
//! itself is.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use rtti_sdk::TypeIdentity;

use super::record::TypeRecord;

/// Upcast over shared handles
pub type UpcastFn = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Upcast over exclusive handles
pub type UpcastMutFn =
    Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

fn upcast_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    f
}

fn upcast_mut_fn<F>(f: F) -> F
where
    F: for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync + 'static,
{
    f
}

/// One direct base of a type
#[derive(Clone)]
pub struct BaseClassInfo {
    base: TypeIdentity,
    upcast: UpcastFn,
    upcast_mut: UpcastMutFn,
}

impl BaseClassInfo {
    /// Base `B` embedded in derived type `D`, reached through the accessors
    pub fn new<D: Any, B: Any>(
        base: TypeIdentity,
        get: fn(&D) -> &B,
        get_mut: fn(&mut D) -> &mut B,
    ) -> Self {
        Self {
            base,
            upcast: Arc::new(upcast_fn(move |object| {
                object.downcast_ref::<D>().map(|derived| get(derived) as &dyn Any)
            })),
            upcast_mut: Arc::new(upcast_mut_fn(move |object| {
                object
                    .downcast_mut::<D>()
                    .map(|derived| get_mut(derived) as &mut dyn Any)
            })),
        }
    }

    /// Base identity
    pub fn base(&self) -> TypeIdentity {
        self.base
    }

    /// Upcast a shared handle
    pub fn upcast<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.upcast)(object)
    }

    /// Upcast an exclusive handle
    pub fn upcast_mut<'a>(&self, object: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.upcast_mut)(object)
    }
}

impl fmt::Debug for BaseClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseClassInfo")
            .field("base", &self.base)
            .finish()
    }
}

/// Breadth-first closure of `bases` over already-recorded ancestors
pub(crate) fn ancestor_closure(records: &[TypeRecord], bases: &[BaseClassInfo]) -> Vec<TypeIdentity> {
    let mut closure: Vec<TypeIdentity> = Vec::new();
    let mut queue: Vec<TypeIdentity> = bases.iter().map(|info| info.base).collect();
    let mut head = 0;
    while head < queue.len() {
        let id = queue[head];
        head += 1;
        if closure.contains(&id) {
            continue;
        }
        closure.push(id);
        if let Some(record) = id.index().and_then(|i| records.get(i)) {
            queue.extend(record.bases.iter().map(|info| info.base));
        }
    }
    closure
}

/// Reachability over direct bases; reflexive for recorded types only
pub(crate) fn is_derived_from(records: &[TypeRecord], derived: TypeIdentity, base: TypeIdentity) -> bool {
    let recorded = |id: TypeIdentity| id.index().is_some_and(|index| index < records.len());
    if !recorded(derived) || !recorded(base) {
        return false;
    }
    let mut stack = vec![derived];
    let mut seen: Vec<TypeIdentity> = Vec::new();
    while let Some(id) = stack.pop() {
        if id == base {
            return true;
        }
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        if let Some(record) = id.index().and_then(|i| records.get(i)) {
            stack.extend(record.bases.iter().map(|info| info.base));
        }
    }
    false
}

/// Chain of upcasts leading from `from` to its ancestor `to`
///
/// Empty when `from == to`; `None` when `to` is not an ancestor.
pub(crate) fn upcast_path(
    records: &[TypeRecord],
    from: TypeIdentity,
    to: TypeIdentity,
) -> Option<Vec<BaseClassInfo>> {
    if from == to {
        return Some(Vec::new());
    }
    let record = from.index().and_then(|i| records.get(i))?;
    record.bases.iter().find_map(|info| {
        upcast_path(records, info.base, to).map(|mut rest| {
            rest.insert(0, info.clone());
            rest
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Base {
        value: i32,
    }

    struct Derived {
        base: Base,
    }

    #[test]
    fn test_upcast_shared_and_mut() {
        let info = BaseClassInfo::new::<Derived, Base>(
            TypeIdentity::from_raw(1),
            |d| &d.base,
            |d| &mut d.base,
        );
        let mut derived = Derived {
            base: Base { value: 3 },
        };

        let base = info.upcast(&derived).and_then(|b| b.downcast_ref::<Base>());
        assert_eq!(base.map(|b| b.value), Some(3));

        if let Some(base) = info.upcast_mut(&mut derived).and_then(|b| b.downcast_mut::<Base>()) {
            base.value = 8;
        }
        assert_eq!(derived.base.value, 8);
    }

    #[test]
    fn test_upcast_rejects_wrong_object() {
        let info = BaseClassInfo::new::<Derived, Base>(
            TypeIdentity::from_raw(1),
            |d| &d.base,
            |d| &mut d.base,
        );
        assert!(info.upcast(&5i32).is_none());
    }
}
