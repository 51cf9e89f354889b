//! Timestamp parsing for OLM metadata.
//!
//! OLM documents carry ISO-8601-style timestamps (`2024-01-04T10:00:00`,
//! with or without a zone); calendar exports occasionally hold RFC 2822
//! strays. MBOX `Date:` headers never come through here — the message
//! parser resolves those itself.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// Zone-less layouts accepted after the zoned parses fail; interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse an archive timestamp into UTC.
///
/// Returns `None` for anything unrecognized; callers fall back to their
/// own default (the moment of parsing, per the record contract).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return day.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
    }

    warn!(date = trimmed, "unparseable timestamp");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_iso_datetime() {
        let dt = parse_date("2024-01-04T10:00:00").unwrap();
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2024-01-04 10:00");
    }

    #[test]
    fn test_rfc3339_with_zone() {
        let dt = parse_date("2024-01-04T10:00:00+02:00").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "08:00");
    }

    #[test]
    fn test_rfc2822_stray() {
        assert!(parse_date("Thu, 04 Jan 2024 10:00:00 +0000").is_some());
    }

    #[test]
    fn test_space_separated_and_date_only() {
        assert!(parse_date("2024-01-04 10:00:00").is_some());
        let midnight = parse_date("2024-01-04").unwrap();
        assert_eq!(midnight.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_date("not a date").is_none());
        assert!(parse_date("").is_none());
    }
}
