//! Timestamp normalization
//!
//! The API emits timestamps in several textual shapes depending on which
//! backend produced them. Everything recognized here is converted to a
//! `DateTime<Utc>`; a missing value stays missing.

use crate::WebCrawlerError;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Offset-less layouts, read as UTC. `%.f` also matches a missing fraction.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Layouts carrying an explicit offset that RFC 3339 parsing rejects
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Parses a server timestamp into a normalized instant
///
/// Accepted shapes:
///
/// | Example | Notes |
/// |---------|-------|
/// | `2024-05-01T10:00:00Z` | RFC 3339 |
/// | `2024-05-01T10:00:00.123456+02:00` | RFC 3339 with fraction and offset |
/// | `2024-05-01T10:00:00.123` | no offset, read as UTC |
/// | `2024-05-01 10:00:00` | space separator, read as UTC |
/// | `2024-05-01 10:00:00.5 +0000 UTC` | Go `time.Time` default layout |
/// | `2024-05-01 10:00:00+00` | Postgres text layout |
///
/// # Returns
///
/// * `Ok(None)` - The value was absent, `null`, or empty
/// * `Ok(Some(instant))` - The value matched one of the layouts
/// * `Err(MalformedResponse)` - The value matched none of them
pub fn parse_timestamp(value: Option<&str>) -> Result<Option<DateTime<Utc>>, WebCrawlerError> {
    let raw = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(raw) => raw,
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    // Go appends the zone abbreviation after the numeric offset
    let without_zone_name = strip_zone_name(raw);
    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(without_zone_name, format) {
            return Ok(Some(parsed.with_timezone(&Utc)));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(parsed.and_utc()));
        }
    }

    Err(WebCrawlerError::MalformedResponse(format!(
        "unrecognized timestamp '{}'",
        raw
    )))
}

fn strip_zone_name(raw: &str) -> &str {
    match raw.rsplit_once(' ') {
        Some((head, tail))
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            head
        }
        _ => raw,
    }
}
