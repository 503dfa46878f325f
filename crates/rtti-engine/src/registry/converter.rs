//! Type converters

use std::fmt;
use std::sync::Arc;

use rtti_sdk::{TypeIdentity, Variant};

use super::Registry;
use crate::descriptor::ValueBoxer;
use crate::error::RegistryResult;
use crate::reflect::Reflect;

/// Conversion body; `None` reports failure
pub type ConvertFn = Arc<dyn Fn(&Variant) -> Option<Variant> + Send + Sync>;

/// Conversion from one registered type to another
pub struct TypeConverter {
    source: TypeIdentity,
    target: TypeIdentity,
    convert: ConvertFn,
}

impl TypeConverter {
    /// Converter from a raw conversion body
    pub fn new(
        source: TypeIdentity,
        target: TypeIdentity,
        convert: impl Fn(&Variant) -> Option<Variant> + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            target,
            convert: Arc::new(convert),
        }
    }

    /// Converter backed by a Rust function from `S` to `T`
    pub fn from_fn<S, T, F>(registry: &Registry, f: F) -> RegistryResult<Self>
    where
        S: Reflect,
        T: Reflect,
        F: Fn(&S) -> Option<T> + Send + Sync + 'static,
    {
        let source = registry.type_of::<S>()?;
        let boxer = ValueBoxer::of::<T>(registry)?;
        Ok(Self::new(source, boxer.type_id(), move |value| {
            let converted = f(value.get::<S>()?)?;
            boxer.wrap(converted).ok()
        }))
    }

    /// Source type
    pub fn source(&self) -> TypeIdentity {
        self.source
    }

    /// Target type
    pub fn target(&self) -> TypeIdentity {
        self.target
    }

    /// Convert a value of the source type
    pub fn convert(&self, value: &Variant) -> Option<Variant> {
        if value.type_id() != self.source {
            return None;
        }
        (self.convert)(value)
    }
}

impl fmt::Debug for TypeConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverter")
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_checks_source() {
        let registry = Registry::new();
        let converter =
            TypeConverter::from_fn::<i32, String, _>(&registry, |v| Some(v.to_string())).unwrap();
        let int = registry.type_of::<i32>().unwrap();

        let out = converter.convert(&Variant::new(int, 12i32)).unwrap();
        assert_eq!(out.type_id(), converter.target());
        assert_eq!(out.get::<String>().map(String::as_str), Some("12"));

        let text = Variant::new(converter.target(), "x".to_string());
        assert!(converter.convert(&text).is_none());
    }

    #[test]
    fn test_failed_conversion() {
        let registry = Registry::new();
        let converter =
            TypeConverter::from_fn::<String, i32, _>(&registry, |s| s.parse().ok()).unwrap();
        let text = registry.type_of::<String>().unwrap();
        assert!(converter.convert(&Variant::new(text, "nope".to_string())).is_none());
        assert_eq!(
            converter
                .convert(&Variant::new(text, "41".to_string()))
                .and_then(|v| v.extract::<i32>().ok()),
            Some(41)
        );
    }
}
