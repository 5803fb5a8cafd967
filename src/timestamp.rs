//! Flexible timestamp parsing for order records.
//!
//! The cashier app has gone through several generations of timestamp
//! encoding: RFC 3339 with a trailing `Z` or explicit offset, plain ISO-8601
//! without an offset (with or without fractional seconds), the classic
//! `YYYY-MM-DD HH:MM:SS`, and bare dates. Formats are tried in that fixed
//! order; the first successful parse wins. Anything else is "no value" and
//! the caller skips the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const FORMAT_ISO: &str = "%Y-%m-%dT%H:%M:%S%.f";
const FORMAT_SPACED: &str = "%Y-%m-%d %H:%M:%S";
const FORMAT_DATE_ONLY: &str = "%Y-%m-%d";

/// Parse one raw timestamp string into a naive date + time.
///
/// Offsets are stripped, never converted: `2024-05-01T22:45:00+07:00` keeps
/// the wall-clock reading `22:45`, because every record in one branch export
/// is already local to that branch and mixing conversions would shift orders
/// across report days.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, FORMAT_ISO) {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, FORMAT_SPACED) {
        return Some(dt);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, FORMAT_DATE_ONLY) {
        return date.and_hms_opt(0, 0, 0);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_spaced_format() {
        assert_eq!(
            parse_timestamp("2024-01-15 13:45:09"),
            Some(dt(2024, 1, 15, 13, 45, 9))
        );
    }

    #[test]
    fn parses_iso_without_offset() {
        assert_eq!(
            parse_timestamp("2024-01-15T13:45:09"),
            Some(dt(2024, 1, 15, 13, 45, 9))
        );
    }

    #[test]
    fn keeps_fractional_seconds() {
        let parsed = parse_timestamp("2024-01-15T13:45:09.250").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_milli_opt(13, 45, 9, 250)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn strips_utc_marker_without_converting() {
        assert_eq!(
            parse_timestamp("2024-01-15T13:45:09Z"),
            Some(dt(2024, 1, 15, 13, 45, 9))
        );
    }

    #[test]
    fn strips_explicit_offset_without_converting() {
        // 22:45 at +07:00 stays 22:45; a conversion would move the order
        // to the previous report day.
        assert_eq!(
            parse_timestamp("2024-05-01T22:45:00+07:00"),
            Some(dt(2024, 5, 1, 22, 45, 0))
        );
    }

    #[test]
    fn bare_date_lands_on_midnight() {
        assert_eq!(
            parse_timestamp("2024-05-01"),
            Some(dt(2024, 5, 1, 0, 0, 0))
        );
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(
            parse_timestamp("  2024-01-15 13:45:09\n"),
            Some(dt(2024, 1, 15, 13, 45, 9))
        );
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("15/01/2024 13:45"), None);
    }

    #[test]
    fn rejects_impossible_calendar_dates() {
        assert_eq!(parse_timestamp("2024-13-40 10:00:00"), None);
        assert_eq!(parse_timestamp("2024-02-30"), None);
    }
}
