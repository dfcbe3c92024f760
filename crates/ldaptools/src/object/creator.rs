//! Object creation builder.
//!
//! ```text
//! let dn = LdapObjectCreator::new(context)
//!     .create_user()?
//!     .with(AttributeMap::new().with("username", "%user%").with("password", "%pass%"))?
//!     .in_container("%SalesOU%,%_defaultnamingcontext_%")?
//!     .set_parameter("user", "somedude")
//!     .set_parameter("pass", "12345")
//!     .set_parameter("SalesOU", "ou=Sales")
//!     .execute()
//!     .await?;
//! ```
//!
//! Nothing touches the directory or the event dispatcher until every
//! validation, resolution and conversion step has succeeded.

use tracing::{debug, instrument};

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::operation::AddOperation;
use ldaptools_core::types::ObjectKind;

use crate::context::LdapContext;
use crate::converter::ConverterRegistry;
use crate::dn::DistinguishedName;
use crate::event::{LifecycleEvent, ObjectCreationEvent};
use crate::parameter::{special_parameters, ParameterResolver};
use crate::schema::SchemaDefinition;

/// Accumulates the description of a new directory object.
#[derive(Debug, Clone)]
pub struct LdapObjectCreator {
    context: LdapContext,
    object_type: Option<ObjectKind>,
    attributes: AttributeMap,
    parameters: AttributeMap,
    container: Option<String>,
    dn: Option<String>,
}

impl LdapObjectCreator {
    pub fn new(context: LdapContext) -> Self {
        Self {
            context,
            object_type: None,
            attributes: AttributeMap::new(),
            parameters: AttributeMap::new(),
            container: None,
            dn: None,
        }
    }

    pub fn create_user(self) -> LdapResult<Self> {
        self.select(ObjectKind::User)
    }

    pub fn create_group(self) -> LdapResult<Self> {
        self.select(ObjectKind::Group)
    }

    pub fn create_computer(self) -> LdapResult<Self> {
        self.select(ObjectKind::Computer)
    }

    pub fn create_contact(self) -> LdapResult<Self> {
        self.select(ObjectKind::Contact)
    }

    pub fn create_ou(self) -> LdapResult<Self> {
        self.select(ObjectKind::OrganizationalUnit)
    }

    /// Select the object type from its token (`user`, `group`, `computer`, `contact`, `ou`).
    pub fn create(self, object_type: &str) -> LdapResult<Self> {
        if object_type.trim().is_empty() {
            return Err(LdapError::invalid_argument(
                "an object type is required to create an LDAP object",
            ));
        }
        let kind: ObjectKind = object_type.parse()?;
        self.select(kind)
    }

    fn select(mut self, kind: ObjectKind) -> LdapResult<Self> {
        if let Some(selected) = self.object_type {
            return Err(LdapError::invalid_state(format!(
                "object type already selected as '{selected}'"
            )));
        }
        self.object_type = Some(kind);
        Ok(self)
    }

    /// Merge attributes. Later calls overwrite earlier values of the same name.
    pub fn with(mut self, attributes: AttributeMap) -> LdapResult<Self> {
        if self.object_type.is_none() {
            return Err(LdapError::invalid_state(
                "select an object type before setting attributes",
            ));
        }
        self.attributes.merge(attributes);
        Ok(self)
    }

    /// Place the object in a container. May contain placeholders.
    pub fn in_container(mut self, container: impl Into<String>) -> LdapResult<Self> {
        if self.dn.is_some() {
            return Err(LdapError::invalid_state(
                "a DN was already set; a container cannot be set as well",
            ));
        }
        let container = container.into();
        if container.trim().is_empty() {
            return Err(LdapError::invalid_argument("container cannot be empty"));
        }
        self.container = Some(container);
        Ok(self)
    }

    /// Use this DN verbatim instead of building one.
    pub fn set_dn(mut self, dn: impl Into<String>) -> LdapResult<Self> {
        if self.container.is_some() {
            return Err(LdapError::invalid_state(
                "a container was already set; a DN cannot be set as well",
            ));
        }
        let dn = DistinguishedName::parse(dn)?;
        self.dn = Some(dn.into());
        Ok(self)
    }

    /// Bind a `%name%` placeholder.
    pub fn set_parameter(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn object_type(&self) -> Option<ObjectKind> {
        self.object_type
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn parameters(&self) -> &AttributeMap {
        &self.parameters
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    /// Resolve, convert and add the object. Returns its DN.
    #[instrument(skip(self), fields(object_type = ?self.object_type))]
    pub async fn execute(self) -> LdapResult<String> {
        let plan = self.plan()?;
        let kind = plan.object_type;

        self.context
            .dispatch(LifecycleEvent::BeforeCreate(ObjectCreationEvent {
                object_type: kind,
                container: plan.container.clone(),
                data: self.attributes.clone(),
                dn: None,
            }))?;

        self.context
            .execute(AddOperation::new(plan.dn.clone(), plan.wire_attributes).into())
            .await?;

        // Caller data only, placeholders resolved, not converted.
        let data: AttributeMap = plan
            .resolved
            .into_iter()
            .filter(|(name, _)| plan.given.iter().any(|given| given.eq_ignore_ascii_case(name)))
            .collect();

        self.context
            .dispatch(LifecycleEvent::AfterCreate(ObjectCreationEvent {
                object_type: kind,
                container: plan.container,
                data,
                dn: Some(plan.dn.clone()),
            }))?;

        Ok(plan.dn)
    }

    fn plan(&self) -> LdapResult<CreationPlan> {
        let kind = self.object_type.ok_or_else(|| {
            LdapError::invalid_state("no object type selected; call create_user() or similar first")
        })?;

        let schema = self.context.resolve_schema(kind)?;

        // Caller values win over defaults whether given by domain or wire name.
        let mut merged: AttributeMap = self
            .attributes
            .iter()
            .map(|(name, value)| (schema.canonical_name(name), value.clone()))
            .collect();
        merged.merge_defaults(&schema.default_values);

        let resolver = ParameterResolver::new(
            self.parameters.clone(),
            special_parameters(self.context.connection()),
        );
        let resolved = resolver.resolve_attributes(&merged)?;

        let container = match (&self.dn, &self.container) {
            (Some(dn), _) => DistinguishedName::parse(dn.as_str())?
                .parent()
                .map(String::from),
            (None, Some(container)) => Some(resolver.resolve_text(container, &resolved)?),
            (None, None) => schema
                .default_container
                .as_deref()
                .map(|container| resolver.resolve_text(container, &resolved))
                .transpose()?,
        };

        let wire_attributes = to_wire(&schema, self.context.converters(), &resolved)?;

        let dn = match &self.dn {
            Some(dn) => dn.clone(),
            None => {
                let container = container.as_deref().ok_or(LdapError::MissingContainer)?;
                let leaf_value = naming_value(&schema, &resolved)?;
                DistinguishedName::build(&schema.naming_attribute(), &leaf_value, container)?
                    .into()
            }
        };
        debug!(dn = %dn, container = ?container, "Resolved object location");

        let given = self
            .attributes
            .iter()
            .map(|(name, _)| schema.canonical_name(name))
            .collect();

        Ok(CreationPlan {
            object_type: kind,
            given,
            container,
            dn,
            resolved,
            wire_attributes,
        })
    }
}

/// Outcome of the validation and resolution steps.
struct CreationPlan {
    object_type: ObjectKind,
    /// Domain names of the caller's attributes.
    given: Vec<String>,
    container: Option<String>,
    dn: String,
    resolved: AttributeMap,
    wire_attributes: AttributeMap,
}

/// The resolved, unescaped value of the naming attribute.
fn naming_value(schema: &SchemaDefinition, resolved: &AttributeMap) -> LdapResult<String> {
    resolved
        .get(&schema.rdn)
        .or_else(|| resolved.get(&schema.naming_attribute()))
        .and_then(AttributeValue::to_text)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            LdapError::invalid_argument(format!(
                "a value for the naming attribute '{}' is required",
                schema.rdn
            ))
        })
}

/// Map domain names to wire names, run converters and add `objectClass`.
fn to_wire(
    schema: &SchemaDefinition,
    converters: &ConverterRegistry,
    resolved: &AttributeMap,
) -> LdapResult<AttributeMap> {
    let mut wire = AttributeMap::new();
    for (name, value) in resolved.iter() {
        if value.is_empty() {
            continue;
        }
        let value = match schema.converter_for(name) {
            Some(converter) => converters.to_wire(converter, value)?,
            None => value.clone(),
        };
        wire.set(schema.wire_name(name), value);
    }
    wire.set(
        "objectClass",
        AttributeValue::from(schema.object_classes.clone()),
    );
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::encode_windows_password;
    use crate::memory::InMemoryConnection;
    use ldaptools_core::operation::Operation;
    use std::sync::Arc;

    fn creator() -> (LdapObjectCreator, Arc<InMemoryConnection>) {
        let conn = Arc::new(InMemoryConnection::new(
            "example.com",
            "dc=example,dc=com",
            "ad",
        ));
        (LdapObjectCreator::new(LdapContext::new(conn.clone())), conn)
    }

    async fn added(conn: &InMemoryConnection) -> AddOperation {
        match conn.last_operation().await {
            Some(Operation::Add(op)) => op,
            other => panic!("expected an add operation, got {other:?}"),
        }
    }

    #[test]
    fn test_type_selection_state() {
        let (creator, _) = creator();
        let err = creator.clone().create_user().unwrap().create_group().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");

        let err = creator.clone().with(AttributeMap::new()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");

        let err = creator.clone().create("foo").unwrap_err();
        assert_eq!(err.error_code(), "CREATION_ERROR");

        let err = creator.create(" ").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_container_and_dn_are_exclusive() {
        let (creator, _) = creator();
        let err = creator
            .clone()
            .create_user()
            .unwrap()
            .in_container("dc=foo,dc=bar")
            .unwrap()
            .set_dn("cn=x,dc=foo,dc=bar")
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");

        let err = creator
            .create_user()
            .unwrap()
            .set_dn("cn=x,dc=foo,dc=bar")
            .unwrap()
            .in_container("dc=foo,dc=bar")
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_wire_attributes_for_ad_user() {
        let (creator, conn) = creator();
        let dn = creator
            .create_user()
            .unwrap()
            .with(
                AttributeMap::new()
                    .with("username", "%foo%")
                    .with("password", "%bar%"),
            )
            .unwrap()
            .in_container("dc=foo,dc=bar")
            .unwrap()
            .set_parameter("foo", "somedude")
            .set_parameter("bar", "12345")
            .execute()
            .await
            .unwrap();

        assert_eq!(dn, "cn=somedude,dc=foo,dc=bar");

        let op = added(&conn).await;
        let expected = AttributeMap::new()
            .with("cn", "somedude")
            .with("displayName", "somedude")
            .with("givenName", "somedude")
            .with("userPrincipalName", "somedude@example.com")
            .with(
                "objectClass",
                vec!["top", "person", "organizationalPerson", "user"],
            )
            .with("sAMAccountName", "somedude")
            .with(
                "unicodePwd",
                AttributeValue::Binary(encode_windows_password("12345").unwrap()),
            )
            .with("userAccountControl", "512");
        assert_eq!(op.attributes(), &expected);
    }

    #[tokio::test]
    async fn test_missing_naming_value() {
        let (creator, conn) = creator();
        let err = creator
            .create_ou()
            .unwrap()
            .in_container("dc=example,dc=com")
            .unwrap()
            .execute()
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "INVALID_ARGUMENT");
        assert_eq!(conn.operation_count().await, 0);
    }

    #[tokio::test]
    async fn test_conversion_failure_stops_before_transport() {
        let (creator, conn) = creator();
        let err = creator
            .create_user()
            .unwrap()
            .with(
                AttributeMap::new()
                    .with("username", "somedude")
                    .with("guid", "not-a-guid"),
            )
            .unwrap()
            .in_container("dc=example,dc=com")
            .unwrap()
            .execute()
            .await
            .unwrap_err();

        assert_eq!(err.error_code(), "CONVERSION_FAILED");
        assert_eq!(conn.operation_count().await, 0);
    }
}
