//! Object schema definitions
//!
//! A schema definition describes one object type: the LDAP object classes it
//! is created with, how domain attribute names map to wire attribute names,
//! which converter each attribute goes through, the naming (RDN) attribute,
//! and default container and attribute values.
//!
//! Attributes not declared in a schema pass through under their own name.

mod builtin;
mod parser;
mod registry;

use serde::{Deserialize, Serialize};

use ldaptools_core::attribute::AttributeMap;
use ldaptools_core::error::{LdapError, LdapResult};

pub use parser::{InMemorySchemaParser, SchemaParser};
pub use registry::SchemaRegistry;

/// Mapping of one domain attribute to its wire attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaAttribute {
    /// Domain-level name (`firstName`).
    pub name: String,

    /// Wire-level name (`givenName`).
    pub wire_name: String,

    /// Converter identifier applied to values of this attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

impl SchemaAttribute {
    pub fn new(name: impl Into<String>, wire_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wire_name: wire_name.into(),
            converter: None,
        }
    }

    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = Some(converter.into());
        self
    }
}

/// Schema of a single object type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Object type key (`user`, `group`...).
    pub object_type: String,

    /// Values of the `objectClass` attribute.
    pub object_classes: Vec<String>,

    /// Domain to wire attribute mappings.
    #[serde(default)]
    pub attributes: Vec<SchemaAttribute>,

    /// Domain name of the naming attribute.
    #[serde(default = "default_rdn")]
    pub rdn: String,

    /// Container new objects are placed in when none is given. May hold placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_container: Option<String>,

    /// Attribute values merged under caller data on creation. May hold placeholders.
    #[serde(default)]
    pub default_values: AttributeMap,
}

fn default_rdn() -> String {
    "name".to_string()
}

impl SchemaDefinition {
    /// Create a definition with no attribute mappings.
    pub fn new(object_type: impl Into<String>, object_classes: Vec<&str>) -> Self {
        Self {
            object_type: object_type.into(),
            object_classes: object_classes.into_iter().map(String::from).collect(),
            attributes: Vec::new(),
            rdn: default_rdn(),
            default_container: None,
            default_values: AttributeMap::new(),
        }
    }

    /// Map a domain attribute to a wire attribute.
    pub fn with_attribute(mut self, name: &str, wire_name: &str) -> Self {
        self.attributes.push(SchemaAttribute::new(name, wire_name));
        self
    }

    /// Map a domain attribute to a wire attribute through a converter.
    pub fn with_converted_attribute(mut self, name: &str, wire_name: &str, converter: &str) -> Self {
        self.attributes
            .push(SchemaAttribute::new(name, wire_name).with_converter(converter));
        self
    }

    pub fn with_rdn(mut self, rdn: impl Into<String>) -> Self {
        self.rdn = rdn.into();
        self
    }

    pub fn with_default_container(mut self, container: impl Into<String>) -> Self {
        self.default_container = Some(container.into());
        self
    }

    pub fn with_default_value(mut self, name: &str, value: &str) -> Self {
        self.default_values.set(name, value);
        self
    }

    /// Check the definition is usable for object creation and hydration.
    pub fn validate(&self) -> LdapResult<()> {
        if self.object_type.trim().is_empty() {
            return Err(LdapError::schema_parse("object type cannot be empty"));
        }
        if self.object_classes.is_empty() {
            return Err(LdapError::schema_parse(format!(
                "object type '{}' declares no object classes",
                self.object_type
            )));
        }
        if self.attribute(&self.rdn).is_none() {
            return Err(LdapError::schema_parse(format!(
                "naming attribute '{}' of object type '{}' is not mapped",
                self.rdn, self.object_type
            )));
        }
        for attr in &self.attributes {
            if attr.name.trim().is_empty() || attr.wire_name.trim().is_empty() {
                return Err(LdapError::schema_parse(format!(
                    "object type '{}' has an attribute mapping with an empty name",
                    self.object_type
                )));
            }
        }
        Ok(())
    }

    /// Look up a mapping by domain name, falling back to wire name.
    pub fn attribute(&self, name: &str) -> Option<&SchemaAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|a| a.wire_name.eq_ignore_ascii_case(name))
            })
    }

    /// Wire name for a domain name. Unmapped names pass through.
    pub fn wire_name(&self, name: &str) -> String {
        self.attribute(name)
            .map_or_else(|| name.to_string(), |a| a.wire_name.clone())
    }

    /// Domain name for a wire name. Unmapped names pass through.
    pub fn domain_name(&self, wire_name: &str) -> String {
        self.attributes
            .iter()
            .find(|a| a.wire_name.eq_ignore_ascii_case(wire_name))
            .map_or_else(|| wire_name.to_string(), |a| a.name.clone())
    }

    /// Converter for a domain or wire attribute name.
    pub fn converter_for(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(|a| a.converter.as_deref())
    }

    /// Converter for a wire attribute name only, as seen in search rows.
    pub fn converter_for_wire(&self, wire_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.wire_name.eq_ignore_ascii_case(wire_name))
            .and_then(|a| a.converter.as_deref())
    }

    /// The domain name of a domain or wire attribute name. Unmapped names
    /// pass through.
    pub fn canonical_name(&self, name: &str) -> String {
        self.attribute(name)
            .map_or_else(|| name.to_string(), |a| a.name.clone())
    }

    /// Wire name of the naming attribute (`cn`, `ou`, `uid`...).
    pub fn naming_attribute(&self) -> String {
        self.wire_name(&self.rdn)
    }

    /// The filter matching objects of this type.
    pub fn object_class_filter(&self) -> crate::filter::Filter {
        use crate::filter::Filter;

        // `top` matches every entry, so it carries no information.
        let mut filters: Vec<Filter> = self
            .object_classes
            .iter()
            .filter(|oc| !oc.eq_ignore_ascii_case("top"))
            .map(|oc| Filter::eq("objectClass", oc.as_str()))
            .collect();

        match filters.len() {
            0 => Filter::present("objectClass"),
            1 => filters.remove(0),
            _ => Filter::and(filters),
        }
    }
}
