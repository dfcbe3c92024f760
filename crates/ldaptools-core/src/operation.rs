//! Operation value objects
//!
//! Each operation carries exactly the data for one protocol call. It knows the
//! name of the primitive it maps to, the positional arguments of that
//! primitive, and how to describe itself for audit logs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attribute::{AttributeMap, AttributeValue};
use crate::error::LdapResult;
use crate::types::Scope;

/// Attributes whose values never appear in log output.
pub const SENSITIVE_ATTRIBUTES: &[&str] = &["unicodePwd", "userPassword"];

const MASK: &str = "******";

fn is_sensitive(attribute: &str) -> bool {
    SENSITIVE_ATTRIBUTES
        .iter()
        .any(|s| s.eq_ignore_ascii_case(attribute))
}

fn display_value(attribute: &str, value: &AttributeValue) -> String {
    if is_sensitive(attribute) {
        MASK.to_string()
    } else {
        value.to_string()
    }
}

/// Common contract every operation implements.
pub trait LdapOperation {
    /// Human readable label.
    fn name(&self) -> &'static str;

    /// Name of the protocol primitive this operation is executed with.
    fn ldap_function(&self) -> &'static str;

    /// Arguments in the exact positional order of the primitive.
    fn arguments(&self) -> Vec<OperationArgument>;

    /// Ordered field to displayable value pairs for audit output.
    fn log_array(&self) -> Vec<(&'static str, String)>;
}

/// One positional argument of a protocol primitive.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationArgument {
    Text(String),
    Flag(bool),
    Null,
    List(Vec<String>),
    Attributes(AttributeMap),
    Batch(Vec<BatchChange>),
}

impl From<Option<String>> for OperationArgument {
    fn from(value: Option<String>) -> Self {
        value.map_or(OperationArgument::Null, OperationArgument::Text)
    }
}

/// Adds a new entry to the directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddOperation {
    dn: Option<String>,
    attributes: AttributeMap,
}

impl AddOperation {
    pub fn new(dn: impl Into<String>, attributes: AttributeMap) -> Self {
        Self {
            dn: Some(dn.into()),
            attributes,
        }
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn set_dn(&mut self, dn: impl Into<String>) -> &mut Self {
        self.dn = Some(dn.into());
        self
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: AttributeMap) -> &mut Self {
        self.attributes = attributes;
        self
    }
}

impl LdapOperation for AddOperation {
    fn name(&self) -> &'static str {
        "Add"
    }

    fn ldap_function(&self) -> &'static str {
        "ldap_add"
    }

    fn arguments(&self) -> Vec<OperationArgument> {
        vec![
            self.dn.clone().into(),
            OperationArgument::Attributes(self.attributes.clone()),
        ]
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        let attributes: Vec<String> = self
            .attributes
            .iter()
            .map(|(name, value)| format!("{name} => {}", display_value(name, value)))
            .collect();
        vec![
            ("DN", self.dn.clone().unwrap_or_default()),
            ("Attributes", attributes.join("; ")),
        ]
    }
}

/// Removes an entry from the directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteOperation {
    dn: Option<String>,
}

impl DeleteOperation {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
        }
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn set_dn(&mut self, dn: impl Into<String>) -> &mut Self {
        self.dn = Some(dn.into());
        self
    }
}

impl LdapOperation for DeleteOperation {
    fn name(&self) -> &'static str {
        "Delete"
    }

    fn ldap_function(&self) -> &'static str {
        "ldap_delete"
    }

    fn arguments(&self) -> Vec<OperationArgument> {
        vec![self.dn.clone().into()]
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        vec![("DN", self.dn.clone().unwrap_or_default())]
    }
}

/// Renames an entry and optionally moves it under a new parent.
#[derive(Debug, Clone, PartialEq)]
pub struct RenameOperation {
    dn: Option<String>,
    new_rdn: Option<String>,
    new_parent: Option<String>,
    delete_old_rdn: bool,
}

impl Default for RenameOperation {
    fn default() -> Self {
        Self {
            dn: None,
            new_rdn: None,
            new_parent: None,
            delete_old_rdn: true,
        }
    }
}

impl RenameOperation {
    pub fn new(dn: impl Into<String>, new_rdn: impl Into<String>) -> Self {
        Self {
            dn: Some(dn.into()),
            new_rdn: Some(new_rdn.into()),
            ..Self::default()
        }
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn new_rdn(&self) -> Option<&str> {
        self.new_rdn.as_deref()
    }

    pub fn new_parent(&self) -> Option<&str> {
        self.new_parent.as_deref()
    }

    pub fn delete_old_rdn(&self) -> bool {
        self.delete_old_rdn
    }

    pub fn set_new_parent(&mut self, parent: impl Into<String>) -> &mut Self {
        self.new_parent = Some(parent.into());
        self
    }

    pub fn set_delete_old_rdn(&mut self, delete: bool) -> &mut Self {
        self.delete_old_rdn = delete;
        self
    }
}

impl LdapOperation for RenameOperation {
    fn name(&self) -> &'static str {
        "Rename"
    }

    fn ldap_function(&self) -> &'static str {
        "ldap_rename"
    }

    fn arguments(&self) -> Vec<OperationArgument> {
        vec![
            self.dn.clone().into(),
            self.new_rdn.clone().into(),
            self.new_parent.clone().into(),
            OperationArgument::Flag(self.delete_old_rdn),
        ]
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        vec![
            ("DN", self.dn.clone().unwrap_or_default()),
            ("New RDN", self.new_rdn.clone().unwrap_or_default()),
            ("New Parent", self.new_parent.clone().unwrap_or_default()),
            ("Delete Old RDN", self.delete_old_rdn.to_string()),
        ]
    }
}

/// Kind of change in a batch modification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModType {
    /// Add values to the attribute.
    Add,
    /// Remove specific values from the attribute.
    Remove,
    /// Remove every value of the attribute.
    RemoveAll,
    /// Replace all values of the attribute.
    Replace,
}

impl ModType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModType::Add => "add",
            ModType::Remove => "remove",
            ModType::RemoveAll => "remove_all",
            ModType::Replace => "replace",
        }
    }
}

/// A single change record in a batch modification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchChange {
    pub attribute: String,
    pub mod_type: ModType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AttributeValue>,
}

impl BatchChange {
    pub fn new(
        attribute: impl Into<String>,
        mod_type: ModType,
        values: Vec<AttributeValue>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            mod_type,
            values,
        }
    }

    pub fn add(attribute: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self::new(attribute, ModType::Add, values)
    }

    pub fn remove(attribute: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self::new(attribute, ModType::Remove, values)
    }

    pub fn replace(attribute: impl Into<String>, values: Vec<AttributeValue>) -> Self {
        Self::new(attribute, ModType::Replace, values)
    }

    pub fn remove_all(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ModType::RemoveAll, Vec::new())
    }
}

impl fmt::Display for BatchChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mod_type.as_str(), self.attribute)?;
        if !self.values.is_empty() {
            let values: Vec<String> = self
                .values
                .iter()
                .map(|v| display_value(&self.attribute, v))
                .collect();
            write!(f, " => [{}]", values.join(", "))?;
        }
        Ok(())
    }
}

/// Applies an ordered list of changes to one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchModifyOperation {
    dn: Option<String>,
    batch: Vec<BatchChange>,
}

impl BatchModifyOperation {
    pub fn new(dn: impl Into<String>, batch: Vec<BatchChange>) -> Self {
        Self {
            dn: Some(dn.into()),
            batch,
        }
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub fn set_dn(&mut self, dn: impl Into<String>) -> &mut Self {
        self.dn = Some(dn.into());
        self
    }

    pub fn batch(&self) -> &[BatchChange] {
        &self.batch
    }

    pub fn set_batch(&mut self, batch: Vec<BatchChange>) -> &mut Self {
        self.batch = batch;
        self
    }
}

impl LdapOperation for BatchModifyOperation {
    fn name(&self) -> &'static str {
        "Batch Modify"
    }

    fn ldap_function(&self) -> &'static str {
        "ldap_modify_batch"
    }

    fn arguments(&self) -> Vec<OperationArgument> {
        vec![
            self.dn.clone().into(),
            OperationArgument::Batch(self.batch.clone()),
        ]
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        let dump: Vec<String> = self
            .batch
            .iter()
            .enumerate()
            .map(|(idx, change)| format!("[{idx}] {change}"))
            .collect();
        vec![
            ("DN", self.dn.clone().unwrap_or_default()),
            ("Batch", dump.join("\n")),
        ]
    }
}

/// Searches the directory.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOperation {
    base_dn: Option<String>,
    filter: Option<String>,
    scope: Scope,
    page_size: Option<u32>,
    attributes: Vec<String>,
}

impl Default for QueryOperation {
    fn default() -> Self {
        Self {
            base_dn: None,
            filter: None,
            scope: Scope::Subtree,
            page_size: None,
            attributes: Vec::new(),
        }
    }
}

impl QueryOperation {
    pub fn new(base_dn: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base_dn: Some(base_dn.into()),
            filter: Some(filter.into()),
            ..Self::default()
        }
    }

    pub fn base_dn(&self) -> Option<&str> {
        self.base_dn.as_deref()
    }

    pub fn set_base_dn(&mut self, base_dn: impl Into<String>) -> &mut Self {
        self.base_dn = Some(base_dn.into());
        self
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) -> &mut Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn set_scope(&mut self, scope: Scope) -> &mut Self {
        self.scope = scope;
        self
    }

    /// Set the scope from its textual name. Unknown names fail with `InvalidScope`.
    pub fn set_scope_name(&mut self, scope: &str) -> LdapResult<&mut Self> {
        self.scope = scope.parse()?;
        Ok(self)
    }

    pub fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: u32) -> &mut Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: Vec<String>) -> &mut Self {
        self.attributes = attributes;
        self
    }
}

impl LdapOperation for QueryOperation {
    fn name(&self) -> &'static str {
        "Query"
    }

    fn ldap_function(&self) -> &'static str {
        match self.scope {
            Scope::Subtree => "ldap_search",
            Scope::OneLevel => "ldap_list",
            Scope::Base => "ldap_read",
        }
    }

    // Scope and page size travel outside the positional list.
    fn arguments(&self) -> Vec<OperationArgument> {
        vec![
            self.base_dn.clone().into(),
            self.filter.clone().into(),
            OperationArgument::List(self.attributes.clone()),
        ]
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Base DN", self.base_dn.clone().unwrap_or_default()),
            ("Filter", self.filter.clone().unwrap_or_default()),
            ("Attributes", self.attributes.join(",")),
            ("Scope", self.scope.as_str().to_uppercase()),
            (
                "Page Size",
                self.page_size.map(|p| p.to_string()).unwrap_or_default(),
            ),
        ]
    }
}

/// Any operation the transport can execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Add(AddOperation),
    Delete(DeleteOperation),
    Rename(RenameOperation),
    BatchModify(BatchModifyOperation),
    Query(QueryOperation),
}

impl Operation {
    fn inner(&self) -> &dyn LdapOperation {
        match self {
            Operation::Add(op) => op,
            Operation::Delete(op) => op,
            Operation::Rename(op) => op,
            Operation::BatchModify(op) => op,
            Operation::Query(op) => op,
        }
    }

    /// Render the log array as a single line.
    pub fn log_line(&self) -> String {
        self.log_array()
            .into_iter()
            .map(|(field, value)| format!("{field}: {value}"))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl LdapOperation for Operation {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn ldap_function(&self) -> &'static str {
        self.inner().ldap_function()
    }

    fn arguments(&self) -> Vec<OperationArgument> {
        self.inner().arguments()
    }

    fn log_array(&self) -> Vec<(&'static str, String)> {
        self.inner().log_array()
    }
}

impl From<AddOperation> for Operation {
    fn from(op: AddOperation) -> Self {
        Operation::Add(op)
    }
}

impl From<DeleteOperation> for Operation {
    fn from(op: DeleteOperation) -> Self {
        Operation::Delete(op)
    }
}

impl From<RenameOperation> for Operation {
    fn from(op: RenameOperation) -> Self {
        Operation::Rename(op)
    }
}

impl From<BatchModifyOperation> for Operation {
    fn from(op: BatchModifyOperation) -> Self {
        Operation::BatchModify(op)
    }
}

impl From<QueryOperation> for Operation {
    fn from(op: QueryOperation) -> Self {
        Operation::Query(op)
    }
}
