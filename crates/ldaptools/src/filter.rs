//! Search filters (RFC 4515).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Filter for search operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Match objects where attribute equals value.
    Equals { attribute: String, value: String },

    /// Match objects where attribute contains value (substring).
    Contains { attribute: String, value: String },

    /// Match objects where attribute starts with value.
    StartsWith { attribute: String, value: String },

    /// Match objects where attribute ends with value.
    EndsWith { attribute: String, value: String },

    /// Match objects where attribute is greater than or equal to value.
    GreaterThanOrEquals { attribute: String, value: String },

    /// Match objects where attribute is less than or equal to value.
    LessThanOrEquals { attribute: String, value: String },

    /// Match objects where attribute exists (has any value).
    Present { attribute: String },

    /// Logical AND of multiple filters.
    And { filters: Vec<Filter> },

    /// Logical OR of multiple filters.
    Or { filters: Vec<Filter> },

    /// Logical NOT of a filter.
    Not { filter: Box<Filter> },

    /// A pre-rendered filter string, passed through untouched.
    Raw { filter: String },
}

impl Filter {
    /// Create an equals filter.
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a contains filter.
    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Contains {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a starts-with filter.
    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::StartsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create an ends-with filter.
    pub fn ends_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::EndsWith {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn gte(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::GreaterThanOrEquals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn lte(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::LessThanOrEquals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Create a present (attribute exists) filter.
    pub fn present(attribute: impl Into<String>) -> Self {
        Filter::Present {
            attribute: attribute.into(),
        }
    }

    /// Create an AND filter.
    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And { filters }
    }

    /// Create an OR filter.
    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or { filters }
    }

    /// Create a NOT filter (negation).
    pub fn negate(filter: Filter) -> Self {
        Filter::Not {
            filter: Box::new(filter),
        }
    }

    /// Wrap an already rendered filter string.
    pub fn raw(filter: impl Into<String>) -> Self {
        Filter::Raw {
            filter: filter.into(),
        }
    }

    /// Combine this filter with another using AND.
    pub fn and_with(self, other: Filter) -> Self {
        match self {
            Filter::And { mut filters } => {
                filters.push(other);
                Filter::And { filters }
            }
            _ => Filter::And {
                filters: vec![self, other],
            },
        }
    }

    /// Rename every attribute in the filter tree. Raw filters are left alone.
    pub fn map_attributes(self, rename: &dyn Fn(&str) -> String) -> Self {
        match self {
            Filter::Equals { attribute, value } => Filter::Equals {
                attribute: rename(&attribute),
                value,
            },
            Filter::Contains { attribute, value } => Filter::Contains {
                attribute: rename(&attribute),
                value,
            },
            Filter::StartsWith { attribute, value } => Filter::StartsWith {
                attribute: rename(&attribute),
                value,
            },
            Filter::EndsWith { attribute, value } => Filter::EndsWith {
                attribute: rename(&attribute),
                value,
            },
            Filter::GreaterThanOrEquals { attribute, value } => Filter::GreaterThanOrEquals {
                attribute: rename(&attribute),
                value,
            },
            Filter::LessThanOrEquals { attribute, value } => Filter::LessThanOrEquals {
                attribute: rename(&attribute),
                value,
            },
            Filter::Present { attribute } => Filter::Present {
                attribute: rename(&attribute),
            },
            Filter::And { filters } => Filter::And {
                filters: filters.into_iter().map(|f| f.map_attributes(rename)).collect(),
            },
            Filter::Or { filters } => Filter::Or {
                filters: filters.into_iter().map(|f| f.map_attributes(rename)).collect(),
            },
            Filter::Not { filter } => Filter::Not {
                filter: Box::new(filter.map_attributes(rename)),
            },
            raw @ Filter::Raw { .. } => raw,
        }
    }

    /// Render as an LDAP filter string.
    pub fn to_ldap_string(&self) -> String {
        match self {
            Filter::And { filters } => {
                let inner: Vec<String> = filters.iter().map(Self::to_ldap_string).collect();
                format!("(&{})", inner.join(""))
            }
            Filter::Or { filters } => {
                let inner: Vec<String> = filters.iter().map(Self::to_ldap_string).collect();
                format!("(|{})", inner.join(""))
            }
            Filter::Not { filter } => format!("(!{})", filter.to_ldap_string()),
            Filter::Equals { attribute, value } => {
                format!("({}={})", attribute, escape_filter_value(value))
            }
            Filter::Contains { attribute, value } => {
                format!("({}=*{}*)", attribute, escape_filter_value(value))
            }
            Filter::StartsWith { attribute, value } => {
                format!("({}={}*)", attribute, escape_filter_value(value))
            }
            Filter::EndsWith { attribute, value } => {
                format!("({}=*{})", attribute, escape_filter_value(value))
            }
            Filter::GreaterThanOrEquals { attribute, value } => {
                format!("({}>={})", attribute, escape_filter_value(value))
            }
            Filter::LessThanOrEquals { attribute, value } => {
                format!("({}<={})", attribute, escape_filter_value(value))
            }
            Filter::Present { attribute } => format!("({attribute}=*)"),
            Filter::Raw { filter } => {
                if filter.starts_with('(') {
                    filter.clone()
                } else {
                    format!("({filter})")
                }
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ldap_string())
    }
}

impl From<&str> for Filter {
    fn from(filter: &str) -> Self {
        Filter::raw(filter)
    }
}

impl From<String> for Filter {
    fn from(filter: String) -> Self {
        Filter::raw(filter)
    }
}

/// Escape special characters in LDAP filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}
