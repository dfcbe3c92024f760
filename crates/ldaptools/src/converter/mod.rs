//! Attribute converter registry.
//!
//! A converter maps one domain value to its wire encoding and back. Converters
//! are stateless; the registry only resolves identifiers to converters and
//! spreads a converter across multi-valued attributes.

mod generic;
mod windows;

use std::collections::HashMap;
use std::sync::Arc;

use ldaptools_core::attribute::AttributeValue;
use ldaptools_core::error::{LdapError, LdapResult};

pub use generic::{BoolConverter, GeneralizedTimeConverter, IntConverter};
pub use windows::{
    encode_windows_password, WindowsGuidConverter, WindowsPasswordConverter, WindowsSidConverter,
    WindowsTimeConverter,
};

/// Identifiers of the built-in converters.
pub mod ids {
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const GENERALIZED_TIME: &str = "generalized_time";
    pub const WINDOWS_GUID: &str = "windows_guid";
    pub const WINDOWS_PASSWORD: &str = "windows_password";
    pub const WINDOWS_SID: &str = "windows_sid";
    pub const WINDOWS_TIME: &str = "windows_time";
}

/// Bidirectional conversion of a single (scalar) attribute value.
pub trait AttributeConverter: Send + Sync {
    /// Domain value to wire value.
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue>;

    /// Wire value to domain value.
    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue>;
}

/// Name to converter lookup.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn AttributeConverter>>,
}

impl ConverterRegistry {
    /// Create a registry with no converters.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in converter.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(ids::BOOL, BoolConverter);
        registry.register(ids::INT, IntConverter);
        registry.register(ids::GENERALIZED_TIME, GeneralizedTimeConverter);
        registry.register(ids::WINDOWS_GUID, WindowsGuidConverter);
        registry.register(ids::WINDOWS_PASSWORD, WindowsPasswordConverter);
        registry.register(ids::WINDOWS_SID, WindowsSidConverter);
        registry.register(ids::WINDOWS_TIME, WindowsTimeConverter);
        registry
    }

    /// Register (or replace) a converter under an identifier.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        converter: impl AttributeConverter + 'static,
    ) -> &mut Self {
        self.converters.insert(id.into(), Arc::new(converter));
        self
    }

    /// Check if a converter is registered.
    pub fn has(&self, id: &str) -> bool {
        self.converters.contains_key(id)
    }

    /// Look up a converter.
    pub fn get(&self, id: &str) -> LdapResult<&Arc<dyn AttributeConverter>> {
        self.converters
            .get(id)
            .ok_or_else(|| LdapError::UnknownConverter {
                converter: id.to_string(),
            })
    }

    /// Convert a domain value (scalar or list) to its wire form.
    pub fn to_wire(&self, id: &str, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let converter = self.get(id)?;
        match value {
            AttributeValue::Null => Ok(AttributeValue::Null),
            AttributeValue::Array(values) => values
                .iter()
                .map(|v| converter.to_ldap(v))
                .collect::<LdapResult<Vec<_>>>()
                .map(AttributeValue::Array),
            scalar => converter.to_ldap(scalar),
        }
    }

    /// Convert a wire value (single or list) back to its domain form.
    pub fn from_wire(&self, id: &str, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let converter = self.get(id)?;
        match value {
            AttributeValue::Null => Ok(AttributeValue::Null),
            AttributeValue::Array(values) => values
                .iter()
                .map(|v| converter.from_ldap(v))
                .collect::<LdapResult<Vec<_>>>()
                .map(AttributeValue::from_values),
            scalar => converter.from_ldap(scalar),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.converters.keys().collect();
        names.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .finish()
    }
}

/// Text form of a scalar, or a conversion error naming the converter.
pub(crate) fn expect_text(converter: &str, value: &AttributeValue) -> LdapResult<String> {
    value.to_text().ok_or_else(|| {
        LdapError::conversion(converter, format!("expected a text value, got {value:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl AttributeConverter for Upper {
        fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
            Ok(expect_text("upper", value)?.to_uppercase().into())
        }

        fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
            Ok(expect_text("upper", value)?.to_lowercase().into())
        }
    }

    #[test]
    fn test_unknown_converter() {
        let registry = ConverterRegistry::new();
        let err = registry
            .to_wire("nope", &AttributeValue::from("x"))
            .unwrap_err();
        assert!(matches!(err, LdapError::UnknownConverter { ref converter } if converter == "nope"));
    }

    #[test]
    fn test_custom_converter_over_lists() {
        let mut registry = ConverterRegistry::empty();
        registry.register("upper", Upper);

        let wire = registry
            .to_wire("upper", &AttributeValue::from(vec!["a", "b"]))
            .unwrap();
        assert_eq!(wire, AttributeValue::from(vec!["A", "B"]));

        let single = registry
            .from_wire("upper", &AttributeValue::Array(vec!["X".into()]))
            .unwrap();
        assert_eq!(single, AttributeValue::from("x"));
    }

    #[test]
    fn test_null_passes_through() {
        let registry = ConverterRegistry::new();
        assert!(registry
            .to_wire(ids::BOOL, &AttributeValue::Null)
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ConverterRegistry::default();
        for id in [
            ids::BOOL,
            ids::INT,
            ids::GENERALIZED_TIME,
            ids::WINDOWS_GUID,
            ids::WINDOWS_PASSWORD,
            ids::WINDOWS_SID,
            ids::WINDOWS_TIME,
        ] {
            assert!(registry.has(id), "missing converter {id}");
        }
    }
}
