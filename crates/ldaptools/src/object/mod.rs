//! Directory objects.
//!
//! An [`LdapObject`] holds domain-named attributes as hydrated from a search,
//! and tracks the changes made to it so [`LdapManager::persist`] can send
//! only what changed.

mod collection;
mod creator;
mod manager;

use serde::Serialize;

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::types::ObjectKind;

pub use collection::LdapObjectCollection;
pub use creator::LdapObjectCreator;
pub use manager::LdapManager;

/// Kind of a tracked attribute change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Replace every value.
    Set,
    /// Add values.
    Add,
    /// Remove specific values.
    Remove,
    /// Clear the attribute.
    Reset,
}

/// One tracked change to a domain attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeChange {
    pub attribute: String,
    pub kind: ChangeKind,
    pub values: Vec<AttributeValue>,
}

/// A directory object with domain-level attribute names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdapObject {
    dn: Option<String>,
    object_type: Option<ObjectKind>,
    attributes: AttributeMap,
    #[serde(skip)]
    changes: Vec<AttributeChange>,
}

impl LdapObject {
    pub fn new(attributes: AttributeMap, object_type: Option<ObjectKind>) -> Self {
        Self {
            dn: None,
            object_type,
            attributes,
            changes: Vec::new(),
        }
    }

    pub fn with_dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = Some(dn.into());
        self
    }

    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    pub(crate) fn update_dn(&mut self, dn: impl Into<String>) {
        self.dn = Some(dn.into());
    }

    pub fn object_type(&self) -> Option<ObjectKind> {
        self.object_type
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.attributes.get_string(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.has(name)
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// The attributes plus the DN under `dn`.
    pub fn to_map(&self) -> AttributeMap {
        let mut map = self.attributes.clone();
        if let Some(dn) = &self.dn {
            map.set("dn", dn.as_str());
        }
        map
    }

    /// Replace the values of an attribute.
    pub fn set(&mut self, name: &str, value: impl Into<AttributeValue>) -> &mut Self {
        let value = value.into();
        let values = value.values().to_vec();
        self.attributes.set(name, value);
        self.forget_changes(name);
        self.changes.push(AttributeChange {
            attribute: name.to_string(),
            kind: ChangeKind::Set,
            values,
        });
        self
    }

    /// Add values to an attribute.
    pub fn add(&mut self, name: &str, value: impl Into<AttributeValue>) -> &mut Self {
        let added = value.into().values().to_vec();

        let mut current = self
            .attributes
            .get(name)
            .map(|v| v.values().to_vec())
            .unwrap_or_default();
        current.extend(added.iter().cloned());
        self.attributes
            .set(name, AttributeValue::from_values(current));

        self.track(name, ChangeKind::Add, added);
        self
    }

    /// Remove specific values from an attribute.
    pub fn remove(&mut self, name: &str, value: impl Into<AttributeValue>) -> &mut Self {
        let removed = value.into().values().to_vec();

        if let Some(existing) = self.attributes.get(name) {
            let kept: Vec<AttributeValue> = existing
                .values()
                .iter()
                .filter(|v| !removed.contains(v))
                .cloned()
                .collect();
            if kept.is_empty() {
                self.attributes.remove(name);
            } else {
                self.attributes.set(name, AttributeValue::from_values(kept));
            }
        }

        self.track(name, ChangeKind::Remove, removed);
        self
    }

    /// Clear an attribute.
    pub fn reset(&mut self, name: &str) -> &mut Self {
        self.attributes.remove(name);
        self.forget_changes(name);
        self.changes.push(AttributeChange {
            attribute: name.to_string(),
            kind: ChangeKind::Reset,
            values: Vec::new(),
        });
        self
    }

    pub fn changes(&self) -> &[AttributeChange] {
        &self.changes
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn forget_changes(&mut self, name: &str) {
        self.changes
            .retain(|c| !c.attribute.eq_ignore_ascii_case(name));
    }

    fn track(&mut self, name: &str, kind: ChangeKind, values: Vec<AttributeValue>) {
        match self
            .changes
            .iter_mut()
            .find(|c| c.kind == kind && c.attribute.eq_ignore_ascii_case(name))
        {
            Some(change) => change.values.extend(values),
            None => self.changes.push(AttributeChange {
                attribute: name.to_string(),
                kind,
                values,
            }),
        }
    }
}
