//! Shared collaborators of the pipelines.

use std::sync::Arc;

use tracing::{debug, info};

use ldaptools_core::error::LdapResult;
use ldaptools_core::operation::{LdapOperation, Operation};
use ldaptools_core::transport::{LdapConnection, OperationResult};
use ldaptools_core::types::ObjectKind;

use crate::config::LdapToolsConfig;
use crate::converter::ConverterRegistry;
use crate::event::{EventDispatcher, LifecycleEvent};
use crate::schema::{SchemaDefinition, SchemaParser, SchemaRegistry};

/// Everything a creator, query or manager needs besides its own state.
///
/// Cheap to clone; clones share the connection, the schema cache and the
/// dispatcher.
#[derive(Clone)]
pub struct LdapContext {
    connection: Arc<dyn LdapConnection>,
    schemas: SchemaRegistry,
    converters: Arc<ConverterRegistry>,
    config: LdapToolsConfig,
    dispatcher: Option<Arc<dyn EventDispatcher>>,
}

impl LdapContext {
    /// Context over the built-in schemas and converters with default settings.
    pub fn new(connection: Arc<dyn LdapConnection>) -> Self {
        Self {
            connection,
            schemas: SchemaRegistry::with_default_schemas(),
            converters: Arc::new(ConverterRegistry::new()),
            config: LdapToolsConfig::default(),
            dispatcher: None,
        }
    }

    /// Apply a configuration. The schema cache follows `config.cache`; a
    /// registry shared earlier keeps its cache unless the cache type changes.
    #[must_use]
    pub fn with_config(mut self, config: LdapToolsConfig) -> Self {
        self.schemas = self.schemas.with_cache(config.cache);
        self.config = config;
        self
    }

    /// Load schemas from a custom parser.
    #[must_use]
    pub fn with_schema_parser(mut self, parser: impl SchemaParser + 'static) -> Self {
        self.schemas = SchemaRegistry::new(parser, self.config.cache);
        self
    }

    /// Share an existing schema registry (and its cache).
    #[must_use]
    pub fn with_schema_registry(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    #[must_use]
    pub fn with_converters(mut self, converters: ConverterRegistry) -> Self {
        self.converters = Arc::new(converters);
        self
    }

    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn connection(&self) -> &dyn LdapConnection {
        self.connection.as_ref()
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn config(&self) -> &LdapToolsConfig {
        &self.config
    }

    /// Schema name in effect: the configured override, else the connection's.
    pub fn schema_name(&self) -> String {
        self.config
            .schema_name
            .clone()
            .unwrap_or_else(|| self.connection.schema_context_name())
    }

    /// Resolve the schema of an object kind.
    pub fn resolve_schema(&self, kind: ObjectKind) -> LdapResult<Arc<SchemaDefinition>> {
        self.schemas.resolve(kind.schema_key(), &self.schema_name())
    }

    pub(crate) fn dispatch(&self, event: LifecycleEvent) -> LdapResult<()> {
        match &self.dispatcher {
            Some(dispatcher) => dispatcher.dispatch(&event),
            None => Ok(()),
        }
    }

    pub(crate) async fn execute(&self, operation: Operation) -> LdapResult<OperationResult> {
        debug!(
            function = operation.ldap_function(),
            domain = %self.connection,
            "Executing operation"
        );
        let result = self.connection.execute(&operation).await?;
        info!(
            operation = operation.name(),
            details = %operation.log_line(),
            "LDAP operation completed"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for LdapContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapContext")
            .field("connection", &self.connection.to_string())
            .field("schemas", &self.schemas)
            .field("converters", &self.converters)
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher.is_some())
            .finish()
    }
}
