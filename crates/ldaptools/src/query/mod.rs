//! Query engine.
//!
//! An [`LdapQuery`] accumulates a search description in domain terms and
//! turns it into a [`QueryOperation`] on every execution. When object types
//! are attached with [`LdapQuery::from_schema`], attribute names in the
//! filter, the attribute list and the ordering are mapped to wire names, and
//! the object-class constraint of the first type is AND-ed into the filter.
//!
//! Executing never changes the query; repeated executions are independent.

mod hydrator;

use std::sync::Arc;

use tracing::{debug, instrument};

use ldaptools_core::attribute::AttributeMap;
use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::operation::QueryOperation;
use ldaptools_core::types::{HydrationMode, ObjectKind, Scope, SortDirection};

use crate::context::LdapContext;
use crate::event::{LifecycleEvent, QueryEvent};
use crate::filter::Filter;
use crate::object::{LdapObject, LdapObjectCollection};
use crate::schema::SchemaDefinition;

use hydrator::Hydrator;

/// Result of an executed query, shaped by the hydration mode.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Objects(LdapObjectCollection),
    Arrays(Vec<AttributeMap>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            QueryResult::Objects(objects) => objects.len(),
            QueryResult::Arrays(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_objects(self) -> Option<LdapObjectCollection> {
        match self {
            QueryResult::Objects(objects) => Some(objects),
            QueryResult::Arrays(_) => None,
        }
    }

    pub fn into_arrays(self) -> Option<Vec<AttributeMap>> {
        match self {
            QueryResult::Objects(_) => None,
            QueryResult::Arrays(rows) => Some(rows),
        }
    }
}

/// A search against the directory.
#[derive(Debug, Clone)]
pub struct LdapQuery {
    context: LdapContext,
    filter: Option<Filter>,
    base_dn: Option<String>,
    scope: Scope,
    page_size: u32,
    attributes: Vec<String>,
    order_by: Vec<(String, SortDirection)>,
    schemas: Vec<(ObjectKind, Arc<SchemaDefinition>)>,
}

impl LdapQuery {
    /// Query with the page size and scope of the context's configuration.
    pub fn new(context: LdapContext) -> Self {
        let scope = context.config().default_scope;
        let page_size = context.config().page_size;
        Self {
            context,
            filter: None,
            base_dn: None,
            scope,
            page_size,
            attributes: Vec::new(),
            order_by: Vec::new(),
            schemas: Vec::new(),
        }
    }

    /// Search for objects of this type. Results are hydrated with its schema.
    pub fn from_schema(&mut self, kind: ObjectKind) -> LdapResult<&mut Self> {
        let schema = self.context.resolve_schema(kind)?;
        self.schemas.push((kind, schema));
        Ok(self)
    }

    pub fn set_filter(&mut self, filter: impl Into<Filter>) -> &mut Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn set_base_dn(&mut self, base_dn: impl Into<String>) -> &mut Self {
        self.base_dn = Some(base_dn.into());
        self
    }

    pub fn base_dn(&self) -> Option<&str> {
        self.base_dn.as_deref()
    }

    pub fn set_scope(&mut self, scope: Scope) -> &mut Self {
        self.scope = scope;
        self
    }

    /// Set the scope from its name. Unknown names fail with `InvalidScope`.
    pub fn set_scope_name(&mut self, scope: &str) -> LdapResult<&mut Self> {
        self.scope = scope.parse()?;
        Ok(self)
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn set_page_size(&mut self, page_size: u32) -> LdapResult<&mut Self> {
        if page_size == 0 {
            return Err(LdapError::invalid_argument("page size must be greater than 0"));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Attributes to return. Empty means every attribute.
    pub fn set_attributes<I, S>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Order results by an attribute. The first key added is the most significant.
    pub fn add_order_by(&mut self, attribute: impl Into<String>, direction: SortDirection) -> &mut Self {
        let attribute = attribute.into();
        match self
            .order_by
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&attribute))
        {
            Some(existing) => existing.1 = direction,
            None => self.order_by.push((attribute, direction)),
        }
        self
    }

    pub fn set_order_by(&mut self, order_by: Vec<(String, SortDirection)>) -> &mut Self {
        self.order_by = order_by;
        self
    }

    pub fn order_by(&self) -> &[(String, SortDirection)] {
        &self.order_by
    }

    /// The search operation this query currently describes.
    pub fn build_operation(&self) -> QueryOperation {
        let schema = self.primary_schema();
        let to_wire = |name: &str| match schema {
            Some(schema) => schema.wire_name(name),
            None => name.to_string(),
        };

        let mut attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|a| to_wire(a.as_str()))
            .collect();
        // An empty list already returns everything, sort keys included.
        if !attributes.is_empty() {
            for (name, _) in &self.order_by {
                let wire = to_wire(name.as_str());
                if !attributes.iter().any(|a| a.eq_ignore_ascii_case(&wire)) {
                    attributes.push(wire);
                }
            }
        }

        let filter = match (self.filter.clone(), schema) {
            (Some(filter), Some(schema)) => schema
                .object_class_filter()
                .and_with(filter.map_attributes(&|name: &str| schema.wire_name(name))),
            (None, Some(schema)) => schema.object_class_filter(),
            (Some(filter), None) => filter,
            (None, None) => Filter::present("objectClass"),
        };

        let base_dn = self
            .base_dn
            .clone()
            .unwrap_or_else(|| self.context.connection().root_context_value());

        let mut operation = QueryOperation::new(base_dn, filter.to_ldap_string());
        operation
            .set_scope(self.scope)
            .set_page_size(self.page_size)
            .set_attributes(attributes);
        operation
    }

    /// Run the search and hydrate the rows.
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn execute(&self, mode: HydrationMode) -> LdapResult<QueryResult> {
        let operation = self.build_operation();
        let mut event = QueryEvent {
            base_dn: operation.base_dn().unwrap_or_default().to_string(),
            filter: operation.filter().unwrap_or_default().to_string(),
            scope: self.scope.to_string(),
            attributes: operation.attributes().to_vec(),
            result_count: None,
        };

        self.context
            .dispatch(LifecycleEvent::BeforeQuery(event.clone()))?;
        let rows = self
            .context
            .execute(operation.into())
            .await?
            .into_entries();
        debug!(rows = rows.len(), "Hydrating search rows");

        let schema = self
            .schemas
            .first()
            .map(|(kind, schema)| (*kind, schema.as_ref()));
        let mut objects = Hydrator::new(schema, self.context.converters()).hydrate_all(rows)?;
        objects.sort_by_attributes(&self.domain_order_by());

        event.result_count = Some(objects.len());
        self.context.dispatch(LifecycleEvent::AfterQuery(event))?;

        Ok(match mode {
            HydrationMode::Object => QueryResult::Objects(objects),
            HydrationMode::Array => QueryResult::Arrays(objects.to_maps()),
        })
    }

    /// Every matching object.
    pub async fn get_result(&self) -> LdapResult<LdapObjectCollection> {
        match self.execute(HydrationMode::Object).await? {
            QueryResult::Objects(objects) => Ok(objects),
            QueryResult::Arrays(_) => Err(LdapError::invalid_state("expected hydrated objects")),
        }
    }

    /// Every matching row as a plain map, DN under `dn`.
    pub async fn get_array_result(&self) -> LdapResult<Vec<AttributeMap>> {
        match self.execute(HydrationMode::Array).await? {
            QueryResult::Arrays(rows) => Ok(rows),
            QueryResult::Objects(_) => Err(LdapError::invalid_state("expected plain rows")),
        }
    }

    /// The only matching object, if any. More than one match is an error.
    pub async fn get_one_or_none(&self) -> LdapResult<Option<LdapObject>> {
        let objects = self.get_result().await?;
        if objects.len() > 1 {
            return Err(LdapError::invalid_state(format!(
                "expected at most one result, got {}",
                objects.len()
            )));
        }
        Ok(objects.into_iter().next())
    }

    fn primary_schema(&self) -> Option<&SchemaDefinition> {
        self.schemas.first().map(|(_, schema)| schema.as_ref())
    }

    /// Sort keys under the names the hydrated objects carry.
    fn domain_order_by(&self) -> Vec<(String, SortDirection)> {
        match self.primary_schema() {
            Some(schema) => self
                .order_by
                .iter()
                .map(|(name, direction)| {
                    let domain = schema
                        .attribute(name)
                        .map_or_else(|| name.clone(), |a| a.name.clone());
                    (domain, *direction)
                })
                .collect(),
            None => self.order_by.clone(),
        }
    }
}
