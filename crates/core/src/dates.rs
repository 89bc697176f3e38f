//! Date parsing for booking requests.
//!
//! Clients send either a plain calendar date (`2024-06-01`, read as midnight
//! UTC) or a full RFC 3339 timestamp.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use crate::types::Timestamp;

/// Parse a calendar date or RFC 3339 timestamp into a UTC timestamp.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, String> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid date '{raw}'. Expected YYYY-MM-DD or RFC 3339"))
}

/// Serde adapter for `#[serde(deserialize_with = "...")]` on timestamp fields.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Serde adapter for optional timestamp fields (query strings, filters).
pub fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_timestamp(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_date_is_midnight_utc() {
        let ts = parse_timestamp("2024-06-01").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rfc3339_offset_is_normalized() {
        let ts = parse_timestamp("2024-06-01T12:00:00+05:30").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 6, 1, 6, 30, 0).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_timestamp("2024-13-01").is_err());
    }
}
