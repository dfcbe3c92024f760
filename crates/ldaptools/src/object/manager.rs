//! Entry point tying creation, querying and persistence together.

use std::sync::Arc;

use tracing::{debug, instrument};

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::operation::{
    BatchChange, BatchModifyOperation, DeleteOperation, RenameOperation,
};
use ldaptools_core::transport::LdapConnection;

use crate::context::LdapContext;
use crate::dn::DistinguishedName;
use crate::event::{LifecycleEvent, ObjectEvent};
use crate::query::LdapQuery;
use crate::schema::SchemaDefinition;

use super::{AttributeChange, ChangeKind, LdapObject, LdapObjectCreator};

/// Creates, queries, modifies, deletes and moves directory objects.
#[derive(Debug, Clone)]
pub struct LdapManager {
    context: LdapContext,
}

impl LdapManager {
    /// Manager over a connection with the built-in schemas and converters.
    pub fn new(connection: Arc<dyn LdapConnection>) -> Self {
        Self::from_context(LdapContext::new(connection))
    }

    pub fn from_context(context: LdapContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &LdapContext {
        &self.context
    }

    /// A fresh creator. Select the object type on it before anything else.
    pub fn creator(&self) -> LdapObjectCreator {
        LdapObjectCreator::new(self.context.clone())
    }

    pub fn create_user(&self) -> LdapResult<LdapObjectCreator> {
        self.creator().create_user()
    }

    pub fn create_group(&self) -> LdapResult<LdapObjectCreator> {
        self.creator().create_group()
    }

    pub fn create_computer(&self) -> LdapResult<LdapObjectCreator> {
        self.creator().create_computer()
    }

    pub fn create_contact(&self) -> LdapResult<LdapObjectCreator> {
        self.creator().create_contact()
    }

    pub fn create_ou(&self) -> LdapResult<LdapObjectCreator> {
        self.creator().create_ou()
    }

    /// A fresh query with the configured page size and scope.
    pub fn query(&self) -> LdapQuery {
        LdapQuery::new(self.context.clone())
    }

    /// Send the tracked changes of an object to the directory.
    ///
    /// Objects without changes are left alone. The changes are cleared as soon
    /// as the directory accepted the modification, before the after-event runs.
    #[instrument(skip(self, object), fields(dn = ?object.dn()))]
    pub async fn persist(&self, object: &mut LdapObject) -> LdapResult<()> {
        if !object.has_changes() {
            debug!("No changes to persist");
            return Ok(());
        }
        let dn = required_dn(object)?;
        let schema = self.schema_of(object)?;

        let mut batch = Vec::with_capacity(object.changes().len());
        for change in object.changes() {
            batch.push(self.batch_change(schema.as_deref(), change)?);
        }

        let event = ObjectEvent {
            dn: dn.clone(),
            changes: changed_values(object),
            new_dn: None,
        };
        self.context
            .dispatch(LifecycleEvent::BeforeModify(event.clone()))?;
        self.context
            .execute(BatchModifyOperation::new(dn, batch).into())
            .await?;
        object.clear_changes();

        self.context.dispatch(LifecycleEvent::AfterModify(event))
    }

    /// Delete an object from the directory.
    #[instrument(skip(self, object), fields(dn = ?object.dn()))]
    pub async fn delete(&self, object: &LdapObject) -> LdapResult<()> {
        let dn = required_dn(object)?;
        let event = ObjectEvent {
            dn: dn.clone(),
            changes: AttributeMap::new(),
            new_dn: None,
        };

        self.context
            .dispatch(LifecycleEvent::BeforeDelete(event.clone()))?;
        self.context.execute(DeleteOperation::new(dn).into()).await?;
        self.context.dispatch(LifecycleEvent::AfterDelete(event))
    }

    /// Move an object under another container, keeping its RDN.
    #[instrument(skip(self, object), fields(dn = ?object.dn()))]
    pub async fn move_to(&self, object: &mut LdapObject, container: &str) -> LdapResult<()> {
        let container = DistinguishedName::parse(container.trim())?;
        let dn = required_dn(object)?;
        let rdn = DistinguishedName::parse(dn.as_str())?
            .leaf()
            .ok_or_else(|| LdapError::invalid_argument(format!("'{dn}' has no RDN to keep")))?;
        let new_dn = format!("{rdn},{container}");

        let event = ObjectEvent {
            dn: dn.clone(),
            changes: AttributeMap::new(),
            new_dn: Some(new_dn.clone()),
        };
        self.context
            .dispatch(LifecycleEvent::BeforeMove(event.clone()))?;

        let mut operation = RenameOperation::new(dn, rdn);
        operation.set_new_parent(container.as_str());
        self.context.execute(operation.into()).await?;

        object.update_dn(new_dn);
        self.context.dispatch(LifecycleEvent::AfterMove(event))
    }

    fn schema_of(&self, object: &LdapObject) -> LdapResult<Option<Arc<SchemaDefinition>>> {
        object
            .object_type()
            .map(|kind| self.context.resolve_schema(kind))
            .transpose()
    }

    fn batch_change(
        &self,
        schema: Option<&SchemaDefinition>,
        change: &AttributeChange,
    ) -> LdapResult<BatchChange> {
        let (attribute, converter) = match schema {
            Some(schema) => (
                schema.wire_name(&change.attribute),
                schema.converter_for(&change.attribute),
            ),
            None => (change.attribute.clone(), None),
        };

        let values = match converter {
            Some(converter) => change
                .values
                .iter()
                .map(|value| self.context.converters().to_wire(converter, value))
                .collect::<LdapResult<Vec<_>>>()?,
            None => change.values.clone(),
        };

        Ok(match change.kind {
            ChangeKind::Set => BatchChange::replace(attribute, values),
            ChangeKind::Add => BatchChange::add(attribute, values),
            ChangeKind::Remove => BatchChange::remove(attribute, values),
            ChangeKind::Reset => BatchChange::remove_all(attribute),
        })
    }
}

fn required_dn(object: &LdapObject) -> LdapResult<String> {
    object
        .dn()
        .map(String::from)
        .ok_or_else(|| LdapError::invalid_argument("the object has no DN"))
}

/// Current values of every changed attribute. Cleared attributes map to null.
fn changed_values(object: &LdapObject) -> AttributeMap {
    object
        .changes()
        .iter()
        .map(|change| {
            let value = object
                .get(&change.attribute)
                .cloned()
                .unwrap_or(AttributeValue::Null);
            (change.attribute.clone(), value)
        })
        .collect()
}
