//! Active Directory value encodings.
//!
//! - `unicodePwd`: the password surrounded with double quotes, encoded as UTF-16LE
//! - `objectGUID`: 16 bytes in the mixed-endian Microsoft GUID layout
//! - `objectSid`: binary SID, rendered as `S-1-5-21-...`
//! - FILETIME attributes (`pwdLastSet`, `lastLogon`...): 100ns ticks since 1601-01-01

use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use ldaptools_core::attribute::AttributeValue;
use ldaptools_core::error::{LdapError, LdapResult};

use super::{expect_text, ids, AttributeConverter};

/// Encode a plaintext password for AD's `unicodePwd` attribute.
///
/// # Errors
/// Returns a conversion error if the password is empty.
#[instrument(skip(password))]
pub fn encode_windows_password(password: &str) -> LdapResult<Vec<u8>> {
    if password.is_empty() {
        return Err(LdapError::conversion(
            ids::WINDOWS_PASSWORD,
            "password cannot be empty",
        ));
    }

    let quoted = format!("\"{password}\"");
    Ok(quoted.encode_utf16().flat_map(u16::to_le_bytes).collect())
}

fn decode_windows_password(bytes: &[u8]) -> LdapResult<String> {
    if bytes.len() % 2 != 0 {
        return Err(LdapError::conversion(
            ids::WINDOWS_PASSWORD,
            "UTF-16LE payload has an odd length",
        ));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let decoded = String::from_utf16(&units)
        .map_err(|e| LdapError::conversion(ids::WINDOWS_PASSWORD, e.to_string()))?;

    Ok(decoded
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .map(str::to_string)
        .unwrap_or(decoded))
}

/// `unicodePwd` converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPasswordConverter;

impl AttributeConverter for WindowsPasswordConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let password = expect_text(ids::WINDOWS_PASSWORD, value)?;
        encode_windows_password(&password).map(AttributeValue::Binary)
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::Binary(bytes) => decode_windows_password(bytes).map(Into::into),
            other => Ok(other.clone()),
        }
    }
}

/// `objectGUID` converter. Domain values are lowercase hyphenated GUID strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsGuidConverter;

impl AttributeConverter for WindowsGuidConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        if let AttributeValue::Binary(bytes) = value {
            if bytes.len() == 16 {
                return Ok(value.clone());
            }
        }

        let text = expect_text(ids::WINDOWS_GUID, value)?;
        let guid = Uuid::parse_str(text.trim().trim_start_matches('{').trim_end_matches('}'))
            .map_err(|e| {
                LdapError::conversion(ids::WINDOWS_GUID, format!("'{text}' is not a GUID: {e}"))
            })?;

        Ok(AttributeValue::Binary(guid.to_bytes_le().to_vec()))
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::Binary(bytes) => {
                let raw: [u8; 16] = bytes.as_slice().try_into().map_err(|_| {
                    LdapError::conversion(
                        ids::WINDOWS_GUID,
                        format!("expected 16 bytes, got {}", bytes.len()),
                    )
                })?;
                Ok(Uuid::from_bytes_le(raw).hyphenated().to_string().into())
            }
            // Some servers already hand back the string form.
            other => Ok(other.clone()),
        }
    }
}

fn sid_to_string(bytes: &[u8]) -> LdapResult<String> {
    if bytes.len() < 8 {
        return Err(LdapError::conversion(
            ids::WINDOWS_SID,
            format!("SID must be at least 8 bytes, got {}", bytes.len()),
        ));
    }

    let revision = bytes[0];
    let count = usize::from(bytes[1]);
    if bytes.len() != 8 + count * 4 {
        return Err(LdapError::conversion(
            ids::WINDOWS_SID,
            format!(
                "SID declares {count} sub-authorities but has {} bytes",
                bytes.len()
            ),
        ));
    }

    let authority = bytes[2..8]
        .iter()
        .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));

    let mut sid = format!("S-{revision}-{authority}");
    for chunk in bytes[8..].chunks_exact(4) {
        let sub = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sid.push('-');
        sid.push_str(&sub.to_string());
    }
    Ok(sid)
}

fn sid_from_string(sid: &str) -> LdapResult<Vec<u8>> {
    let invalid = || LdapError::conversion(ids::WINDOWS_SID, format!("'{sid}' is not a SID"));

    let mut parts = sid.trim().split('-');
    if !parts.next().is_some_and(|p| p.eq_ignore_ascii_case("S")) {
        return Err(invalid());
    }
    let revision: u8 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    let authority: u64 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(invalid)?;
    if authority >= 1 << 48 {
        return Err(invalid());
    }
    let subs = parts
        .map(|p| p.parse::<u32>().map_err(|_| invalid()))
        .collect::<LdapResult<Vec<_>>>()?;
    let count = u8::try_from(subs.len()).map_err(|_| invalid())?;

    let mut bytes = Vec::with_capacity(8 + subs.len() * 4);
    bytes.push(revision);
    bytes.push(count);
    bytes.extend_from_slice(&authority.to_be_bytes()[2..]);
    for sub in subs {
        bytes.extend_from_slice(&sub.to_le_bytes());
    }
    Ok(bytes)
}

/// `objectSid` converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsSidConverter;

impl AttributeConverter for WindowsSidConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        if let AttributeValue::Binary(_) = value {
            return Ok(value.clone());
        }
        let text = expect_text(ids::WINDOWS_SID, value)?;
        sid_from_string(&text).map(AttributeValue::Binary)
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::Binary(bytes) => sid_to_string(bytes).map(Into::into),
            other => Ok(other.clone()),
        }
    }
}

/// Seconds between 1601-01-01 and 1970-01-01.
const FILETIME_EPOCH_OFFSET: i64 = 11_644_473_600;
const TICKS_PER_SECOND: i64 = 10_000_000;

fn datetime_to_filetime(dt: &DateTime<Utc>) -> LdapResult<i64> {
    dt.timestamp()
        .checked_add(FILETIME_EPOCH_OFFSET)
        .and_then(|secs| secs.checked_mul(TICKS_PER_SECOND))
        .and_then(|ticks| ticks.checked_add(i64::from(dt.timestamp_subsec_nanos() / 100)))
        .ok_or_else(|| {
            LdapError::conversion(ids::WINDOWS_TIME, format!("{dt} is out of the FILETIME range"))
        })
}

fn filetime_to_datetime(ticks: i64) -> LdapResult<Option<DateTime<Utc>>> {
    // 0 and i64::MAX both mean "never".
    if ticks == 0 || ticks == i64::MAX {
        return Ok(None);
    }
    let secs = ticks.div_euclid(TICKS_PER_SECOND) - FILETIME_EPOCH_OFFSET;
    // Remainder is below 10^7, so the nanos fit in u32.
    let nanos = (ticks.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).map(Some).ok_or_else(|| {
        LdapError::conversion(ids::WINDOWS_TIME, format!("{ticks} is out of range"))
    })
}

/// FILETIME converter. Domain values are UTC datetimes; wire values are tick counts as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsTimeConverter;

impl AttributeConverter for WindowsTimeConverter {
    fn to_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        match value {
            AttributeValue::DateTime(dt) => Ok(datetime_to_filetime(dt)?.to_string().into()),
            AttributeValue::Integer(ticks) => Ok(ticks.to_string().into()),
            other => {
                let text = expect_text(ids::WINDOWS_TIME, other)?;
                if let Ok(ticks) = text.trim().parse::<i64>() {
                    return Ok(ticks.to_string().into());
                }
                let dt = DateTime::parse_from_rfc3339(text.trim()).map_err(|e| {
                    LdapError::conversion(
                        ids::WINDOWS_TIME,
                        format!("'{text}' is neither ticks nor a timestamp: {e}"),
                    )
                })?;
                Ok(datetime_to_filetime(&dt.with_timezone(&Utc))?
                    .to_string()
                    .into())
            }
        }
    }

    fn from_ldap(&self, value: &AttributeValue) -> LdapResult<AttributeValue> {
        let ticks = match value {
            AttributeValue::Integer(ticks) => *ticks,
            other => {
                let text = expect_text(ids::WINDOWS_TIME, other)?;
                text.trim().parse::<i64>().map_err(|e| {
                    LdapError::conversion(
                        ids::WINDOWS_TIME,
                        format!("'{text}' is not a tick count: {e}"),
                    )
                })?
            }
        };
        Ok(filetime_to_datetime(ticks)?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_encode_password() {
        let encoded = encode_windows_password("Pass").unwrap();
        assert_eq!(
            encoded,
            vec![0x22, 0, b'P', 0, b'a', 0, b's', 0, b's', 0, 0x22, 0]
        );
        assert!(encode_windows_password("").is_err());
    }

    #[test]
    fn test_password_round_trip() {
        let converter = WindowsPasswordConverter;
        let wire = converter.to_ldap(&"P@ssw0rd!".into()).unwrap();
        assert!(wire.as_binary().is_some());
        assert_eq!(converter.from_ldap(&wire).unwrap(), "P@ssw0rd!".into());
    }

    #[test]
    fn test_guid_byte_order() {
        let converter = WindowsGuidConverter;
        let wire = converter
            .to_ldap(&"01020304-0506-0708-090a-0b0c0d0e0f10".into())
            .unwrap();
        assert_eq!(
            wire.as_binary().unwrap(),
            &[4, 3, 2, 1, 6, 5, 8, 7, 9, 10, 11, 12, 13, 14, 15, 16]
        );
        assert_eq!(
            converter.from_ldap(&wire).unwrap(),
            "01020304-0506-0708-090a-0b0c0d0e0f10".into()
        );
    }

    #[test]
    fn test_guid_rejects_bad_input() {
        let converter = WindowsGuidConverter;
        assert!(converter.to_ldap(&"not-a-guid".into()).is_err());
        assert!(converter
            .from_ldap(&AttributeValue::Binary(vec![1, 2, 3]))
            .is_err());
    }

    #[test]
    fn test_sid_conversion() {
        let converter = WindowsSidConverter;
        let sid = "S-1-5-21-3623811015-3361044348-30300820-1013";
        let wire = converter.to_ldap(&sid.into()).unwrap();
        let bytes = wire.as_binary().unwrap();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 5);
        assert_eq!(&bytes[2..8], &[0, 0, 0, 0, 0, 5]);
        assert_eq!(&bytes[8..12], &21u32.to_le_bytes());
        assert_eq!(converter.from_ldap(&wire).unwrap(), sid.into());
    }

    #[test]
    fn test_sid_rejects_malformed() {
        let converter = WindowsSidConverter;
        assert!(converter.to_ldap(&"X-1-5".into()).is_err());
        assert!(converter.to_ldap(&"S-1-abc".into()).is_err());
        assert!(converter
            .from_ldap(&AttributeValue::Binary(vec![1, 2, 0, 0, 0, 0, 0, 5]))
            .is_err());
    }

    #[test]
    fn test_filetime_conversion() {
        let converter = WindowsTimeConverter;
        let unix_epoch = Utc.timestamp_opt(0, 0).single().unwrap();

        let wire = converter.to_ldap(&unix_epoch.into()).unwrap();
        assert_eq!(wire, "116444736000000000".into());
        assert_eq!(converter.from_ldap(&wire).unwrap(), unix_epoch.into());
    }

    #[test]
    fn test_filetime_overflow_is_rejected() {
        let converter = WindowsTimeConverter;
        let far_future = Utc.with_ymd_and_hms(100_000, 1, 1, 0, 0, 0).single().unwrap();

        let err = converter.to_ldap(&far_future.into()).unwrap_err();
        assert_eq!(err.error_code(), "CONVERSION_FAILED");
    }

    #[test]
    fn test_filetime_never() {
        let converter = WindowsTimeConverter;
        assert!(converter.from_ldap(&"0".into()).unwrap().is_null());
        assert!(converter
            .from_ldap(&"9223372036854775807".into())
            .unwrap()
            .is_null());
        assert!(converter.from_ldap(&"yesterday".into()).is_err());
    }
}
