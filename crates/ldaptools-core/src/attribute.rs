//! Attribute values and ordered attribute maps.
//!
//! The same value type carries domain values (what callers pass in and get
//! back) and wire values (what the transport sends). Converters map between
//! the two shapes.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A value for an attribute, which may be single or multi-valued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// No value (null).
    Null,
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// Binary data such as GUIDs, SIDs or encoded passwords.
    Binary(Vec<u8>),
    /// A point in time.
    DateTime(DateTime<Utc>),
    /// Multiple values.
    Array(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }

    /// Check if this value carries nothing worth sending.
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::String(s) => s.is_empty(),
            AttributeValue::Binary(b) => b.is_empty(),
            AttributeValue::Array(arr) => arr.iter().all(AttributeValue::is_empty),
            _ => false,
        }
    }

    /// Get as a string if this is a single string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as strings (works for both single and multi-valued).
    pub fn as_strings(&self) -> Vec<&str> {
        match self {
            AttributeValue::String(s) => vec![s.as_str()],
            AttributeValue::Array(arr) => arr.iter().filter_map(|v| v.as_str()).collect(),
            _ => vec![],
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the raw bytes if this is a binary value.
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            AttributeValue::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Get as a timestamp if this is a datetime value.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            AttributeValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Get as an array if this is multi-valued.
    pub fn as_array(&self) -> Option<&Vec<AttributeValue>> {
        match self {
            AttributeValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Check if this is multi-valued.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, AttributeValue::Array(_))
    }

    /// View the value as a list: arrays yield their elements, scalars yield themselves.
    pub fn values(&self) -> &[AttributeValue] {
        match self {
            AttributeValue::Array(arr) => arr,
            AttributeValue::Null => &[],
            other => std::slice::from_ref(other),
        }
    }

    /// Render a scalar as plain text, if it has a natural text form.
    ///
    /// Binary and array values have none.
    pub fn to_text(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) => Some(s.clone()),
            AttributeValue::Integer(i) => Some(i.to_string()),
            AttributeValue::Boolean(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
            AttributeValue::DateTime(dt) => Some(dt.to_rfc3339()),
            _ => None,
        }
    }

    /// Collapse a list of values: one value becomes a scalar, several an array.
    pub fn from_values(mut values: Vec<AttributeValue>) -> Self {
        match values.len() {
            0 => AttributeValue::Null,
            1 => values.remove(0),
            _ => AttributeValue::Array(values),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Binary(b) => write!(
                f,
                "{}",
                base64::engine::general_purpose::STANDARD.encode(b)
            ),
            AttributeValue::Array(arr) => {
                let parts: Vec<String> = arr.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            scalar => write!(f, "{}", scalar.to_text().unwrap_or_default()),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(dt: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(dt)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(bytes: Vec<u8>) -> Self {
        AttributeValue::Binary(bytes)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(vec: Vec<&str>) -> Self {
        AttributeValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(vec: Vec<String>) -> Self {
        AttributeValue::Array(vec.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(vec: Vec<AttributeValue>) -> Self {
        AttributeValue::Array(vec)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttributeValue::Null, Into::into)
    }
}

/// An insertion-ordered map of attribute name to value.
///
/// Attribute names are matched case-insensitively, as LDAP attribute
/// descriptions are. Setting an existing name replaces its value in place.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeMap {
    /// Create a new empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
    }

    /// Set an attribute value, replacing any existing value for the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Set an attribute using builder pattern.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.position(name).map(|idx| &self.entries[idx].1)
    }

    /// Get a mutable attribute value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeValue> {
        self.position(name).map(|idx| &mut self.entries[idx].1)
    }

    /// Get a single-valued string attribute.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttributeValue::as_str)
    }

    /// Check if an attribute exists.
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove an attribute.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    /// Get all attribute names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Get the number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.entries.iter().map(|(key, value)| (key, value))
    }

    /// Merge another map into this one. Values from `other` win.
    pub fn merge(&mut self, other: AttributeMap) {
        for (name, value) in other.entries {
            self.set(name, value);
        }
    }

    /// Fill in names missing from this map with values from `defaults`.
    pub fn merge_defaults(&mut self, defaults: &AttributeMap) {
        for (name, value) in &defaults.entries {
            if !self.has(name) {
                self.entries.push((name.clone(), value.clone()));
            }
        }
    }

    /// Convert to the underlying ordered pairs.
    pub fn into_vec(self) -> Vec<(String, AttributeValue)> {
        self.entries
    }
}

impl PartialEq for AttributeMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        let mut map = AttributeMap::new();
        for (name, value) in iter {
            map.set(name, value);
        }
        map
    }
}

impl IntoIterator for AttributeMap {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttributeMapVisitor;

        impl<'de> Visitor<'de> for AttributeMapVisitor {
            type Value = AttributeMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute names to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AttributeMap::new();
                while let Some((name, value)) = access.next_entry::<String, AttributeValue>()? {
                    map.set(name, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(AttributeMapVisitor)
    }
}
