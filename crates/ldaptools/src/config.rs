//! ldaptools configuration
//!
//! Settings shared by the object and query pipelines.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::types::Scope;

/// Schema cache backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    /// Parse the schema on every resolve.
    None,
    /// Keep resolved schemas in process memory.
    #[default]
    Memory,
}

impl FromStr for CacheType {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(CacheType::None),
            "memory" => Ok(CacheType::Memory),
            other => Err(LdapError::invalid_argument(format!(
                "unknown cache type '{other}', expected one of: none, memory"
            ))),
        }
    }
}

/// Configuration for the ldaptools pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdapToolsConfig {
    /// Default page size for queries.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Default search scope for queries.
    #[serde(default)]
    pub default_scope: Scope,

    /// Schema name used instead of the connection's schema context name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,

    /// Schema cache backend.
    #[serde(default)]
    pub cache: CacheType,
}

fn default_page_size() -> u32 {
    1000
}

impl Default for LdapToolsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            default_scope: Scope::default(),
            schema_name: None,
            cache: CacheType::default(),
        }
    }
}

impl LdapToolsConfig {
    /// Set the default page size.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the default scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.default_scope = scope;
        self
    }

    /// Override the schema name.
    #[must_use]
    pub fn with_schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = Some(schema_name.into());
        self
    }

    /// Set the schema cache backend.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheType) -> Self {
        self.cache = cache;
        self
    }

    /// Parse a JSON document and validate it.
    pub fn from_json_str(json: &str) -> LdapResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            LdapError::invalid_argument(format!("invalid ldaptools configuration: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from `LDAPTOOLS_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> LdapResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LdapResult<Self> {
        let mut config = Self::default();

        if let Some(value) = lookup("LDAPTOOLS_PAGE_SIZE") {
            config.page_size = value.trim().parse().map_err(|_| {
                LdapError::invalid_argument(format!(
                    "LDAPTOOLS_PAGE_SIZE must be a positive integer, got '{value}'"
                ))
            })?;
        }
        if let Some(value) = lookup("LDAPTOOLS_SCOPE") {
            config.default_scope = value.parse()?;
        }
        if let Some(value) = lookup("LDAPTOOLS_SCHEMA_NAME") {
            if !value.trim().is_empty() {
                config.schema_name = Some(value.trim().to_string());
            }
        }
        if let Some(value) = lookup("LDAPTOOLS_CACHE") {
            config.cache = value.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LdapResult<()> {
        if self.page_size == 0 {
            return Err(LdapError::invalid_argument(
                "page_size must be greater than zero",
            ));
        }
        if let Some(name) = &self.schema_name {
            if name.trim().is_empty() {
                return Err(LdapError::invalid_argument("schema_name cannot be empty"));
            }
        }
        Ok(())
    }
}
