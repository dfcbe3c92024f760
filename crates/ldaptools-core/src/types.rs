//! ldaptools type definitions
//!
//! Closed enumerations for object kinds, search scopes and result handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LdapError;

/// Kind of directory object the creator knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A user account.
    User,
    /// A security or distribution group.
    Group,
    /// A computer account.
    Computer,
    /// A mail contact.
    Contact,
    /// An organizational unit.
    #[serde(rename = "ou")]
    OrganizationalUnit,
}

impl ObjectKind {
    /// Get all supported object kinds.
    #[must_use]
    pub fn all() -> &'static [ObjectKind] {
        &[
            ObjectKind::User,
            ObjectKind::Group,
            ObjectKind::Computer,
            ObjectKind::Contact,
            ObjectKind::OrganizationalUnit,
        ]
    }

    /// The key used to look this kind up in a schema.
    #[must_use]
    pub fn schema_key(&self) -> &'static str {
        match self {
            ObjectKind::User => "user",
            ObjectKind::Group => "group",
            ObjectKind::Computer => "computer",
            ObjectKind::Contact => "contact",
            ObjectKind::OrganizationalUnit => "ou",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.schema_key())
    }
}

impl FromStr for ObjectKind {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(ObjectKind::User),
            "group" => Ok(ObjectKind::Group),
            "computer" => Ok(ObjectKind::Computer),
            "contact" => Ok(ObjectKind::Contact),
            "ou" | "organizationalunit" => Ok(ObjectKind::OrganizationalUnit),
            _ => Err(LdapError::Creation {
                message: format!(
                    "unknown object type '{s}', expected one of: user, group, computer, contact, ou"
                ),
            }),
        }
    }
}

/// Search breadth selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// The base entry only.
    Base,
    /// Entries one level below the base.
    #[serde(rename = "onelevel")]
    OneLevel,
    /// The base entry and its entire subtree.
    #[default]
    Subtree,
}

impl Scope {
    /// Get the canonical string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Base => "base",
            Scope::OneLevel => "onelevel",
            Scope::Subtree => "subtree",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Scope {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(Scope::Base),
            "onelevel" | "one" => Ok(Scope::OneLevel),
            "subtree" | "sub" => Ok(Scope::Subtree),
            _ => Err(LdapError::InvalidScope {
                scope: s.to_string(),
            }),
        }
    }
}

/// Ordering direction for a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = LdapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(LdapError::invalid_argument(format!(
                "invalid sort direction '{s}', expected ASC or DESC"
            ))),
        }
    }
}

/// How query results are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HydrationMode {
    /// Hydrate rows into an object collection.
    #[default]
    Object,
    /// Return each row as a plain attribute map.
    Array,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_kind_from_str() {
        assert_eq!("user".parse::<ObjectKind>().unwrap(), ObjectKind::User);
        assert_eq!("Group".parse::<ObjectKind>().unwrap(), ObjectKind::Group);
        assert_eq!(
            "OU".parse::<ObjectKind>().unwrap(),
            ObjectKind::OrganizationalUnit
        );

        let err = "printer".parse::<ObjectKind>().unwrap_err();
        assert_eq!(err.error_code(), "CREATION_ERROR");
    }

    #[test]
    fn test_object_kind_schema_keys_are_unique() {
        let mut keys: Vec<&str> = ObjectKind::all().iter().map(|k| k.schema_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ObjectKind::all().len());
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!("base".parse::<Scope>().unwrap(), Scope::Base);
        assert_eq!("ONELEVEL".parse::<Scope>().unwrap(), Scope::OneLevel);
        assert_eq!("subtree".parse::<Scope>().unwrap(), Scope::Subtree);
        assert_eq!(Scope::default(), Scope::Subtree);

        let err = "foo".parse::<Scope>().unwrap_err();
        assert!(matches!(err, LdapError::InvalidScope { ref scope } if scope == "foo"));
    }

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_string(&Scope::OneLevel).unwrap();
        assert_eq!(json, "\"onelevel\"");
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
