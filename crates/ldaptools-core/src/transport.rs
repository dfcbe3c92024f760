//! Transport collaborator seam
//!
//! The connection that actually speaks the protocol lives outside this
//! workspace. The object and query pipelines only see this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attribute::AttributeValue;
use crate::error::LdapResult;
use crate::operation::Operation;

/// A raw search row as returned by the directory.
///
/// Attribute names are wire names; each maps to its ordered list of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub dn: String,
    pub attributes: Vec<(String, Vec<AttributeValue>)>,
}

impl RawEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        self.attributes.push((name.into(), values));
        self
    }

    /// Number of attributes in the row.
    pub fn count(&self) -> usize {
        self.attributes.len()
    }

    /// Values of an attribute, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&[AttributeValue]> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }
}

/// Outcome of executing an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// A write completed.
    Success,
    /// A search completed with these rows.
    Entries(Vec<RawEntry>),
}

impl OperationResult {
    /// Take the rows out of a search result. Write results yield no rows.
    pub fn into_entries(self) -> Vec<RawEntry> {
        match self {
            OperationResult::Success => Vec::new(),
            OperationResult::Entries(entries) => entries,
        }
    }
}

/// The connection to a directory server.
///
/// `Display` gives the connection's string representation (usually the
/// domain name), used for logs, events and the `_domainname_` parameter.
#[async_trait]
pub trait LdapConnection: Send + Sync + fmt::Display {
    /// Execute one operation. Failures surface as `LdapError::Transport`.
    async fn execute(&self, operation: &Operation) -> LdapResult<OperationResult>;

    /// The root naming context of the directory (e.g. `dc=example,dc=com`).
    fn root_context_value(&self) -> String;

    /// Name of the schema this connection uses; part of the schema cache key.
    fn schema_context_name(&self) -> String;
}
