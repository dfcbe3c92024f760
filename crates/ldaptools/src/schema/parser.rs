//! Schema loading.

use std::collections::HashMap;

use tracing::debug;

use ldaptools_core::error::{LdapError, LdapResult};

use super::builtin;
use super::SchemaDefinition;

/// Loads schema definitions.
///
/// Implementations may read files, query the directory's subschema entry or
/// serve definitions from memory.
pub trait SchemaParser: Send + Sync {
    /// Parse the definition of `object_type` within the schema named `schema_name`.
    ///
    /// # Errors
    /// `UnknownObjectType` when the schema has no such type, `SchemaParse` when
    /// the definition is malformed.
    fn parse(&self, object_type: &str, schema_name: &str) -> LdapResult<SchemaDefinition>;
}

/// Schema definitions held in memory, keyed by schema name then object type.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaParser {
    schemas: HashMap<String, HashMap<String, SchemaDefinition>>,
}

impl InMemorySchemaParser {
    /// Create a parser with no schemas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser holding the built-in `ad` and `openldap` schemas.
    pub fn with_default_schemas() -> Self {
        let mut parser = Self::new();
        for definition in builtin::active_directory() {
            parser.insert(builtin::ACTIVE_DIRECTORY, definition);
        }
        for definition in builtin::openldap() {
            parser.insert(builtin::OPENLDAP, definition);
        }
        parser
    }

    /// Load schemas from JSON shaped as `{"<schema name>": [<definition>, ...]}`.
    pub fn from_json_str(json: &str) -> LdapResult<Self> {
        let mut parser = Self::new();
        parser.load_json_str(json)?;
        Ok(parser)
    }

    /// Add the schemas in a JSON document, replacing same-named definitions.
    pub fn load_json_str(&mut self, json: &str) -> LdapResult<()> {
        let document: HashMap<String, Vec<SchemaDefinition>> = serde_json::from_str(json)
            .map_err(|e| LdapError::schema_parse_with_source("malformed schema document", e))?;

        for (schema_name, definitions) in document {
            for definition in definitions {
                self.add(&schema_name, definition)?;
            }
        }
        Ok(())
    }

    /// Add a validated definition under a schema name.
    pub fn add(&mut self, schema_name: &str, definition: SchemaDefinition) -> LdapResult<()> {
        definition.validate()?;
        self.insert(schema_name, definition);
        Ok(())
    }

    fn insert(&mut self, schema_name: &str, definition: SchemaDefinition) {
        debug!(
            schema = %schema_name,
            object_type = %definition.object_type,
            "Registered schema definition"
        );
        self.schemas
            .entry(schema_name.to_lowercase())
            .or_default()
            .insert(definition.object_type.to_lowercase(), definition);
    }

    /// Names of the loaded schemas.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl SchemaParser for InMemorySchemaParser {
    fn parse(&self, object_type: &str, schema_name: &str) -> LdapResult<SchemaDefinition> {
        self.schemas
            .get(&schema_name.to_lowercase())
            .and_then(|types| types.get(&object_type.to_lowercase()))
            .cloned()
            .ok_or_else(|| LdapError::UnknownObjectType {
                object_type: object_type.to_string(),
                schema: schema_name.to_string(),
            })
    }
}
