//! `%name%` placeholder substitution.
//!
//! A placeholder is looked up, in order, in the explicit parameters, the
//! special parameters supplied by the connection, and finally the other
//! attributes of the map being resolved. Attribute lookups resolve
//! recursively, so a schema default `upn: "%username%@%_domainname_%"` picks up
//! the caller's `username`.
//!
//! A value that is exactly one placeholder takes the parameter's value as is
//! (lists and binary values included). Placeholders embedded in text need a
//! parameter with a text form.

use std::sync::LazyLock;

use regex::Regex;

use ldaptools_core::attribute::{AttributeMap, AttributeValue};
use ldaptools_core::error::{LdapError, LdapResult};
use ldaptools_core::transport::LdapConnection;

/// Resolves to the connection's root naming context.
pub const DEFAULT_NAMING_CONTEXT: &str = "_defaultnamingcontext_";

/// Resolves to the connection's string representation (its domain name).
pub const DOMAIN_NAME: &str = "_domainname_";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([\w-]+)%").expect("PLACEHOLDER is a valid regex pattern"));

/// Names of the placeholders referenced in a text, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Check if a value (or any element of a list) references a placeholder.
pub fn has_placeholders(value: &AttributeValue) -> bool {
    value
        .values()
        .iter()
        .any(|v| v.as_str().is_some_and(|s| PLACEHOLDER.is_match(s)))
}

/// The special parameters a connection provides without caller action.
pub fn special_parameters(connection: &dyn LdapConnection) -> AttributeMap {
    AttributeMap::new()
        .with(DEFAULT_NAMING_CONTEXT, connection.root_context_value())
        .with(DOMAIN_NAME, connection.to_string())
}

/// Substitutes placeholders from a fixed set of parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterResolver {
    parameters: AttributeMap,
    special: AttributeMap,
}

impl ParameterResolver {
    pub fn new(parameters: AttributeMap, special: AttributeMap) -> Self {
        Self {
            parameters,
            special,
        }
    }

    /// Resolve every value in `attributes`, using the map itself as the last lookup source.
    pub fn resolve_attributes(&self, attributes: &AttributeMap) -> LdapResult<AttributeMap> {
        attributes
            .iter()
            .map(|(name, value)| {
                let mut stack = vec![name.clone()];
                self.resolve_value(value, attributes, &mut stack)
                    .map(|resolved| (name.clone(), resolved))
            })
            .collect()
    }

    /// Resolve a text (such as a container path) to text.
    pub fn resolve_text(&self, text: &str, attributes: &AttributeMap) -> LdapResult<String> {
        let resolved = self.resolve_str(text, attributes, &mut Vec::new())?;
        resolved.to_text().ok_or_else(|| {
            LdapError::invalid_argument(format!("'{text}' does not resolve to a text value"))
        })
    }

    fn resolve_value(
        &self,
        value: &AttributeValue,
        attributes: &AttributeMap,
        stack: &mut Vec<String>,
    ) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::String(text) => self.resolve_str(text, attributes, stack),
            AttributeValue::Array(values) => {
                let mut resolved = Vec::with_capacity(values.len());
                for v in values {
                    match self.resolve_value(v, attributes, stack)? {
                        AttributeValue::Array(inner) => resolved.extend(inner),
                        single => resolved.push(single),
                    }
                }
                Ok(AttributeValue::Array(resolved))
            }
            other => Ok(other.clone()),
        }
    }

    fn resolve_str(
        &self,
        text: &str,
        attributes: &AttributeMap,
        stack: &mut Vec<String>,
    ) -> LdapResult<AttributeValue> {
        if let Some(caps) = PLACEHOLDER.captures(text) {
            let whole = &caps[0];
            if whole.len() == text.len() {
                return self.lookup(&caps[1], attributes, stack);
            }
        }

        let mut result = String::with_capacity(text.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let Some(found) = caps.get(0) else { continue };
            let name = &caps[1];

            result.push_str(&text[last..found.start()]);
            let value = self.lookup(name, attributes, stack)?;
            let piece = value.to_text().ok_or_else(|| {
                LdapError::invalid_argument(format!(
                    "parameter '{name}' has no text form and cannot be embedded in '{text}'"
                ))
            })?;
            result.push_str(&piece);
            last = found.end();
        }
        result.push_str(&text[last..]);

        Ok(AttributeValue::String(result))
    }

    fn lookup(
        &self,
        name: &str,
        attributes: &AttributeMap,
        stack: &mut Vec<String>,
    ) -> LdapResult<AttributeValue> {
        if let Some(value) = self.parameters.get(name) {
            return Ok(value.clone());
        }
        if let Some(value) = self.special.get(name) {
            return Ok(value.clone());
        }

        let Some(value) = attributes.get(name) else {
            return Err(LdapError::UnresolvedParameter {
                name: name.to_string(),
            });
        };

        if stack.iter().any(|seen| seen.eq_ignore_ascii_case(name)) {
            return Err(LdapError::invalid_argument(format!(
                "circular parameter reference: {} -> {name}",
                stack.join(" -> ")
            )));
        }

        stack.push(name.to_string());
        let resolved = self.resolve_value(value, attributes, stack);
        stack.pop();
        resolved
    }
}
