//! Distinguished name construction and escaping (RFC 4514).
//!
//! Values are escaped with the backslash-hex form, so `foo=,bar` becomes
//! `foo\3d\2cbar`. Container paths are taken as already valid RDN sequences.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

use ldaptools_core::error::{LdapError, LdapResult};

fn push_hex(out: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    for byte in ch.encode_utf8(&mut buf).bytes() {
        let _ = write!(out, "\\{byte:02x}");
    }
}

/// Escape a single RDN value.
///
/// Escaped characters:
/// - `,` `+` `"` `\` `<` `>` `;` `=` anywhere
/// - NUL anywhere
/// - SPACE at the start or end
/// - `#` at the start
pub fn escape_value(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let last = chars.len().saturating_sub(1);
    let mut result = String::with_capacity(value.len() * 2);

    for (i, &ch) in chars.iter().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' | '\0' => push_hex(&mut result, ch),
            ' ' if i == 0 || i == last => push_hex(&mut result, ch),
            '#' if i == 0 => push_hex(&mut result, ch),
            _ => result.push(ch),
        }
    }

    result
}

/// Reverse [`escape_value`]. Accepts both `\2c` and `\,` forms.
pub fn unescape_value(value: &str) -> LdapResult<String> {
    let mut bytes: Vec<u8> = Vec::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }

        let first = chars.next().ok_or_else(|| {
            LdapError::invalid_argument(format!("dangling escape in DN value '{value}'"))
        })?;

        match (first.to_digit(16), chars.peek().and_then(|c| c.to_digit(16))) {
            (Some(hi), Some(lo)) => {
                chars.next();
                // Both digits are < 16, so the byte fits.
                bytes.push((hi * 16 + lo) as u8);
            }
            _ => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(first.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    String::from_utf8(bytes).map_err(|_| {
        LdapError::invalid_argument(format!("DN value '{value}' does not decode to UTF-8"))
    })
}

/// Split a DN on RDN separators that are not escaped.
fn split_rdns(dn: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = dn.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                current.push(ch);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() || !parts.is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// A distinguished name whose RDN values are already escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistinguishedName(String);

impl DistinguishedName {
    /// Build `leaf_attribute=escape(leaf_value),container`.
    pub fn build(leaf_attribute: &str, leaf_value: &str, container: &str) -> LdapResult<Self> {
        let leaf_attribute = leaf_attribute.trim();
        if leaf_attribute.is_empty() {
            return Err(LdapError::invalid_argument(
                "leaf attribute name for a DN cannot be empty",
            ));
        }

        let rdn = format!("{leaf_attribute}={}", escape_value(leaf_value));
        if container.trim().is_empty() {
            Ok(Self(rdn))
        } else {
            Ok(Self(format!("{rdn},{}", container.trim())))
        }
    }

    /// Accept a DN verbatim after checking it is not empty and every RDN has
    /// the `attr=value` shape.
    pub fn parse(dn: impl Into<String>) -> LdapResult<Self> {
        let dn = dn.into();
        if dn.trim().is_empty() {
            return Err(LdapError::invalid_argument("a DN cannot be empty"));
        }
        for rdn in split_rdns(&dn) {
            let valid = rdn
                .split_once('=')
                .is_some_and(|(attr, _)| !attr.trim().is_empty());
            if !valid {
                return Err(LdapError::invalid_argument(format!(
                    "'{rdn}' in DN '{dn}' is not a valid RDN"
                )));
            }
        }
        Ok(Self(dn))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The RDN components, leaf first, still escaped.
    pub fn rdns(&self) -> Vec<String> {
        split_rdns(&self.0)
    }

    /// The leaf RDN (`cn=foo`).
    pub fn leaf(&self) -> Option<String> {
        self.rdns().into_iter().next()
    }

    /// The unescaped value of the leaf RDN.
    pub fn leaf_value(&self) -> LdapResult<Option<String>> {
        match self.leaf() {
            Some(rdn) => match rdn.split_once('=') {
                Some((_, value)) => unescape_value(value).map(Some),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }

    /// Every RDN as `(attribute, unescaped value)`, leaf first.
    pub fn unescape(&self) -> LdapResult<Vec<(String, String)>> {
        self.rdns()
            .into_iter()
            .map(|rdn| match rdn.split_once('=') {
                Some((attr, value)) => Ok((attr.trim().to_string(), unescape_value(value)?)),
                None => Err(LdapError::invalid_argument(format!(
                    "'{rdn}' is not a valid RDN"
                ))),
            })
            .collect()
    }

    /// Everything above the leaf RDN.
    pub fn parent(&self) -> Option<DistinguishedName> {
        let rdns = self.rdns();
        if rdns.len() < 2 {
            return None;
        }
        Some(Self(rdns[1..].join(",")))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DistinguishedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<DistinguishedName> for String {
    fn from(dn: DistinguishedName) -> Self {
        dn.0
    }
}
