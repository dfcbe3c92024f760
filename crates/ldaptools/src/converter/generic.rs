//! Converters for the standard LDAP syntaxes.

use chrono::{DateTime, NaiveDateTime, Utc};

use ldaptools_core::attribute::AttributeValue;
use ldaptools_core::error::{LdapError, LdapResult};

use super::{expect_text, ids, AttributeConverter};

const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// Boolean syntax: `TRUE` / `FALSE` on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_uppercase().as_str() {
        "TRUE" | "1" | "YES" => Some(true),
        "FALSE" | "0" | "NO" => Some(false),
        _ => None,
    }
}

impl AttributeConverter for BoolConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let flag = match value {
            AttributeValue::Boolean(b) => *b,
            other => {
                let text = expect_text(ids::BOOL, other)?;
                parse_bool(&text).ok_or_else(|| {
                    LdapError::conversion(ids::BOOL, format!("'{text}' is not a boolean"))
                })?
            }
        };
        Ok(if flag { "TRUE" } else { "FALSE" }.into())
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        if let AttributeValue::Boolean(_) = value {
            return Ok(value.clone());
        }
        let text = expect_text(ids::BOOL, value)?;
        parse_bool(&text)
            .map(AttributeValue::Boolean)
            .ok_or_else(|| LdapError::conversion(ids::BOOL, format!("'{text}' is not a boolean")))
    }
}

/// Integer syntax: decimal text on the wire.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

fn parse_int(text: &str) -> LdapResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| LdapError::conversion(ids::INT, format!("'{text}' is not an integer: {e}")))
}

impl AttributeConverter for IntConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::Integer(i) => Ok(i.to_string().into()),
            other => {
                let text = expect_text(ids::INT, other)?;
                Ok(parse_int(&text)?.to_string().into())
            }
        }
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::Integer(_) => Ok(value.clone()),
            other => {
                let text = expect_text(ids::INT, other)?;
                parse_int(&text).map(AttributeValue::Integer)
            }
        }
    }
}

/// Generalized Time syntax (`20240115103000Z`). Fractions are accepted and dropped on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedTimeConverter;

fn parse_generalized_time(text: &str) -> LdapResult<DateTime<Utc>> {
    let trimmed = text.trim();
    let body = trimmed.strip_suffix('Z').ok_or_else(|| {
        LdapError::conversion(
            ids::GENERALIZED_TIME,
            format!("'{text}' is not a UTC generalized time"),
        )
    })?;
    let seconds = body.split(['.', ',']).next().unwrap_or(body);

    NaiveDateTime::parse_from_str(seconds, "%Y%m%d%H%M%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            LdapError::conversion(
                ids::GENERALIZED_TIME,
                format!("'{text}' is not a generalized time: {e}"),
            )
        })
}

impl AttributeConverter for GeneralizedTimeConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let dt = match value {
            AttributeValue::DateTime(dt) => *dt,
            other => {
                let text = expect_text(ids::GENERALIZED_TIME, other)?;
                match DateTime::parse_from_rfc3339(text.trim()) {
                    Ok(dt) => dt.with_timezone(&Utc),
                    Err(_) => parse_generalized_time(&text)?,
                }
            }
        };
        Ok(dt.format(GENERALIZED_TIME_FORMAT).to_string().into())
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        if let AttributeValue::DateTime(_) = value {
            return Ok(value.clone());
        }
        let text = expect_text(ids::GENERALIZED_TIME, value)?;
        parse_generalized_time(&text).map(AttributeValue::DateTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_bool_conversion() {
        let converter = BoolConverter;
        assert_eq!(converter.to_ldap(&true.into()).unwrap(), "TRUE".into());
        assert_eq!(converter.to_ldap(&"false".into()).unwrap(), "FALSE".into());
        assert_eq!(converter.from_ldap(&"TRUE".into()).unwrap(), true.into());
        assert!(converter.to_ldap(&"maybe".into()).is_err());
    }

    #[test]
    fn test_int_conversion() {
        let converter = IntConverter;
        assert_eq!(converter.to_ldap(&512i64.into()).unwrap(), "512".into());
        assert_eq!(
            converter.from_ldap(&"-2147483646".into()).unwrap(),
            AttributeValue::Integer(-2_147_483_646)
        );
        let err = converter.from_ldap(&"12abc".into()).unwrap_err();
        assert_eq!(err.error_code(), "CONVERSION_FAILED");
    }

    #[test]
    fn test_generalized_time() {
        let converter = GeneralizedTimeConverter;
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).single().unwrap();

        assert_eq!(
            converter.to_ldap(&dt.into()).unwrap(),
            "20240115103000Z".into()
        );
        assert_eq!(
            converter.from_ldap(&"20240115103000.0Z".into()).unwrap(),
            dt.into()
        );
        assert_eq!(
            converter.from_ldap(&"20240115103000Z".into()).unwrap(),
            dt.into()
        );
        assert!(converter.from_ldap(&"20240115".into()).is_err());
    }
}
