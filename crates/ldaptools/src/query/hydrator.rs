//! Raw search rows to domain objects.

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::error::LdapResult;
use ldaptools_core::transport::RawEntry;
use ldaptools_core::types::ObjectKind;

use crate::converter::ConverterRegistry;
use crate::object::{LdapObject, LdapObjectCollection};
use crate::schema::SchemaDefinition;

/// Maps wire names back to domain names and runs each value through its converter.
///
/// Without a schema every attribute passes through under its wire name.
pub(crate) struct Hydrator<'a> {
    schema: Option<(ObjectKind, &'a SchemaDefinition)>,
    converters: &'a ConverterRegistry,
}

impl<'a> Hydrator<'a> {
    pub(crate) fn new(
        schema: Option<(ObjectKind, &'a SchemaDefinition)>,
        converters: &'a ConverterRegistry,
    ) -> Self {
        Self { schema, converters }
    }

    pub(crate) fn hydrate_all(&self, entries: Vec<RawEntry>) -> LdapResult<LdapObjectCollection> {
        entries
            .into_iter()
            .map(|entry| self.hydrate(entry))
            .collect::<LdapResult<Vec<_>>>()
            .map(LdapObjectCollection::new)
    }

    pub(crate) fn hydrate(&self, entry: RawEntry) -> LdapResult<LdapObject> {
        let mut attributes = AttributeMap::new();
        for (wire_name, values) in entry.attributes {
            if wire_name.eq_ignore_ascii_case("dn") {
                continue;
            }
            let value = AttributeValue::from_values(values);
            let (name, value) = match self.schema {
                Some((_, schema)) => {
                    let value = match schema.converter_for_wire(&wire_name) {
                        Some(converter) => self.converters.from_wire(converter, &value)?,
                        None => value,
                    };
                    (schema.domain_name(&wire_name), value)
                }
                None => (wire_name, value),
            };
            attributes.set(name, value);
        }

        let kind = self.schema.map(|(kind, _)| kind);
        Ok(LdapObject::new(attributes, kind).with_dn(entry.dn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::InMemorySchemaParser;
    use crate::schema::SchemaParser;

    #[test]
    fn test_passthrough_without_schema() {
        let converters = ConverterRegistry::new();
        let hydrator = Hydrator::new(None, &converters);

        let object = hydrator
            .hydrate(
                RawEntry::new("uid=jbourke,ou=People,dc=example,dc=local")
                    .with("givenname", vec!["Jon".into()])
                    .with("objectClass", vec!["top".into(), "person".into()]),
            )
            .unwrap();

        assert_eq!(object.dn(), Some("uid=jbourke,ou=People,dc=example,dc=local"));
        assert_eq!(object.get_string("givenname"), Some("Jon"));
        assert_eq!(object.get("objectClass").unwrap().as_strings(), vec!["top", "person"]);
        assert!(object.object_type().is_none());
    }

    #[test]
    fn test_schema_names_and_converters() {
        let converters = ConverterRegistry::new();
        let schema = InMemorySchemaParser::with_default_schemas()
            .parse("user", "ad")
            .unwrap();
        let hydrator = Hydrator::new(Some((ObjectKind::User, &schema)), &converters);

        let object = hydrator
            .hydrate(
                RawEntry::new("cn=Jon,dc=example,dc=local")
                    .with("dn", vec!["cn=Jon,dc=example,dc=local".into()])
                    .with("givenName", vec!["Jon".into()])
                    .with("userAccountControl", vec!["512".into()])
                    .with("department", vec!["Sales".into()]),
            )
            .unwrap();

        assert_eq!(object.get_string("firstName"), Some("Jon"));
        assert_eq!(object.get("userAccountControl"), Some(&AttributeValue::Integer(512)));
        assert_eq!(object.get_string("department"), Some("Sales"));
        assert!(!object.has("dn"));
        assert_eq!(object.object_type(), Some(ObjectKind::User));
    }

    #[test]
    fn test_converter_chosen_by_wire_name() {
        let converters = ConverterRegistry::new();
        let schema = SchemaDefinition::new("group", vec!["top", "group"])
            .with_converted_attribute("member", "memberCount", "int")
            .with_converted_attribute("isMember", "member", "bool");
        let hydrator = Hydrator::new(Some((ObjectKind::Group, &schema)), &converters);

        let object = hydrator
            .hydrate(
                RawEntry::new("cn=Sales,dc=example,dc=local")
                    .with("member", vec!["TRUE".into()])
                    .with("memberCount", vec!["3".into()]),
            )
            .unwrap();

        assert_eq!(object.get("isMember"), Some(&AttributeValue::Boolean(true)));
        assert_eq!(object.get("member"), Some(&AttributeValue::Integer(3)));
    }

    #[test]
    fn test_conversion_errors_propagate() {
        let converters = ConverterRegistry::new();
        let schema = InMemorySchemaParser::with_default_schemas()
            .parse("user", "ad")
            .unwrap();
        let hydrator = Hydrator::new(Some((ObjectKind::User, &schema)), &converters);

        let err = hydrator
            .hydrate_all(vec![
                RawEntry::new("cn=Jon,dc=example,dc=local")
                    .with("userAccountControl", vec!["not a number".into()]),
            ])
            .unwrap_err();
        assert_eq!(err.error_code(), "CONVERSION_FAILED");
    }
}
