//! Metadata storage for types and member descriptors
//!
//! Metadata is a set of key/value pairs attached to a type or to a single
//! constructor, property, method or enumeration. Keys are either integers or
//! strings and are unique per target; values are arbitrary variants.
//!
//! Attaching a list merges it key by key: existing keys are overwritten, new
//! keys accumulate, keys not mentioned are left alone.

use std::fmt;
use std::sync::Arc;

use rtti_sdk::Variant;
use rustc_hash::FxHashMap;

/// A metadata key - an integer or a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataKey {
    /// Integer key
    Int(i64),
    /// String key
    Str(String),
}

impl From<i64> for MetadataKey {
    fn from(key: i64) -> Self {
        MetadataKey::Int(key)
    }
}

impl From<i32> for MetadataKey {
    fn from(key: i32) -> Self {
        MetadataKey::Int(key as i64)
    }
}

impl From<&str> for MetadataKey {
    fn from(key: &str) -> Self {
        MetadataKey::Str(key.to_string())
    }
}

impl From<String> for MetadataKey {
    fn from(key: String) -> Self {
        MetadataKey::Str(key)
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKey::Int(key) => write!(f, "{}", key),
            MetadataKey::Str(key) => write!(f, "{:?}", key),
        }
    }
}

/// One metadata entry
#[derive(Debug)]
pub struct Metadata {
    /// Entry key
    pub key: MetadataKey,
    /// Entry value
    pub value: Variant,
}

impl Metadata {
    /// Create a metadata entry
    pub fn new(key: impl Into<MetadataKey>, value: Variant) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Metadata attached to a single target
///
/// Values are shared so lookups can hand them out without holding any lock.
#[derive(Debug, Default, Clone)]
pub struct MetadataStore {
    entries: FxHashMap<MetadataKey, Arc<Variant>>,
}

impl MetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set one entry, replacing any previous value for the key
    pub fn set(&mut self, key: MetadataKey, value: Variant) {
        self.entries.insert(key, Arc::new(value));
    }

    /// Merge a list of entries; last write per key wins
    pub fn merge(&mut self, data: Vec<Metadata>) {
        for Metadata { key, value } in data {
            self.set(key, value);
        }
    }

    /// Get the value for a key
    pub fn get(&self, key: &MetadataKey) -> Option<Arc<Variant>> {
        self.entries.get(key).cloned()
    }

    /// Check if a key is present
    pub fn contains(&self, key: &MetadataKey) -> bool {
        self.entries.contains_key(key)
    }

    /// All keys, in no particular order
    pub fn keys(&self) -> Vec<MetadataKey> {
        self.entries.keys().cloned().collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtti_sdk::TypeIdentity;

    const STR: TypeIdentity = TypeIdentity::from_raw(1);

    fn text(value: &str) -> Variant {
        Variant::new(STR, value.to_string())
    }

    fn text_of(store: &MetadataStore, key: impl Into<MetadataKey>) -> Option<String> {
        store
            .get(&key.into())
            .and_then(|value| value.get::<String>().cloned())
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut store = MetadataStore::new();
        store.merge(vec![Metadata::new(1, text("a"))]);
        store.merge(vec![Metadata::new(1, text("b")), Metadata::new(2, text("c"))]);

        assert_eq!(store.len(), 2);
        assert_eq!(text_of(&store, 1), Some("b".to_string()));
        assert_eq!(text_of(&store, 2), Some("c".to_string()));
    }

    #[test]
    fn test_int_and_string_keys_are_distinct() {
        let mut store = MetadataStore::new();
        store.set(MetadataKey::from(1), text("int"));
        store.set(MetadataKey::from("1"), text("str"));

        assert_eq!(store.len(), 2);
        assert_eq!(text_of(&store, 1), Some("int".to_string()));
        assert_eq!(text_of(&store, "1"), Some("str".to_string()));
    }

    #[test]
    fn test_missing_key() {
        let store = MetadataStore::new();
        assert!(store.is_empty());
        assert!(store.get(&MetadataKey::from("tooltip")).is_none());
        assert!(!store.contains(&MetadataKey::Int(0)));
    }
}
