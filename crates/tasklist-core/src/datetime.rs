//! Lenient timestamp parsing for due dates.
//!
//! Browser clients send due dates in several shapes depending on the input
//! widget used: full RFC 3339 from `toISOString()`, minute-precision values
//! from `datetime-local` inputs, or bare dates. All of them are accepted and
//! normalized to UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer};

/// Naive formats tried after RFC 3339, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Parse a timestamp string.
///
/// Accepts:
/// - RFC 3339 with timezone: `2026-01-15T10:30:00Z`, `2026-01-15T10:30:00+02:00`
/// - ISO 8601 without timezone (assumes UTC): `2026-01-15T10:30:00`, `2026-01-15T10:30`
/// - Date only (assumes midnight UTC): `2026-01-15`
pub fn parse_flexible_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err(
            "Date value cannot be empty. Expected ISO 8601 format (e.g., '2026-01-15T10:30:00Z')"
                .to_string(),
        );
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|n| n.and_utc())
            .ok_or_else(|| "Failed to create datetime from date".to_string());
    }

    // Space-separated with zone, e.g. `2026-01-15 10:30:00Z`
    let normalized = s.replacen(' ', "T", 1);
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(format!(
        "Invalid date format: '{}'. Examples: '2026-01-15T10:30:00Z' (with timezone), \
        '2026-01-15T10:30:00' (assumes UTC), '2026-01-15' (date only, midnight UTC)",
        s
    ))
}

/// Serde helper for optional lenient timestamps.
///
/// `null`, a missing field, and `""` all deserialize to `None`.
pub fn deserialize_optional_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_flexible_datetime(&s)
            .map(Some)
            .map_err(de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_with_z() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_rfc3339_with_offset_converts_to_utc() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00+05:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T05:30:00+00:00");
    }

    #[test]
    fn test_js_iso_string_with_millis() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00.123Z").unwrap();
        assert_eq!(dt.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_without_timezone() {
        let dt = parse_flexible_datetime("2026-01-15T10:30:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_datetime_local_minute_precision() {
        let dt = parse_flexible_datetime("2026-01-15T10:30").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_date_only() {
        let dt = parse_flexible_datetime("2026-01-15").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-01-15T00:00:00+00:00");
    }

    #[test]
    fn test_space_separated() {
        assert!(parse_flexible_datetime("2026-01-15 10:30:00Z").is_ok());
        assert!(parse_flexible_datetime("2026-01-15 10:30:00").is_ok());
    }

    #[test]
    fn test_invalid_format() {
        let err = parse_flexible_datetime("next tuesday").unwrap_err();
        assert!(err.contains("Invalid date format"));
    }

    #[test]
    fn test_empty_is_error() {
        assert!(parse_flexible_datetime("   ").is_err());
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "deserialize_optional_flexible")]
        due: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_deserialize_optional_variants() {
        let missing: Holder = serde_json::from_str("{}").unwrap();
        assert!(missing.due.is_none());

        let null: Holder = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert!(null.due.is_none());

        let empty: Holder = serde_json::from_str(r#"{"due": ""}"#).unwrap();
        assert!(empty.due.is_none());

        let set: Holder = serde_json::from_str(r#"{"due": "2026-03-01"}"#).unwrap();
        assert!(set.due.is_some());

        let bad = serde_json::from_str::<Holder>(r#"{"due": "soon"}"#);
        assert!(bad.is_err());
    }
}
