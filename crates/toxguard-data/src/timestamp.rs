//! `created_date` parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";
const OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f%:z";

/// Parse a creation timestamp, normalized to UTC.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]` with an optional `±HH[:MM]`
/// offset, and bare `YYYY-MM-DD` dates (midnight UTC). Values without an
/// offset are taken as UTC. Returns `None` for anything else.
pub fn parse_created_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, OFFSET_FORMAT) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Canonical form written to prepared CSVs
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(OUTPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_corpus_format_with_short_offset() {
        let parsed = parse_created_date("2015-09-29 10:50:41.987077+00").unwrap();
        assert_eq!(
            parsed,
            Utc.with_ymd_and_hms(2015, 9, 29, 10, 50, 41).unwrap()
                + chrono::Duration::microseconds(987077)
        );
    }

    #[test]
    fn test_offsets_are_normalized() {
        let parsed = parse_created_date("2017-01-01 05:30:00+05:30").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap());

        let rfc = parse_created_date("2017-01-01T05:30:00+05:30").unwrap();
        assert_eq!(rfc, parsed);
    }

    #[test]
    fn test_naive_and_date_only() {
        assert_eq!(
            parse_created_date("2016-03-04 12:00:00"),
            Some(Utc.with_ymd_and_hms(2016, 3, 4, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse_created_date(" 2016-03-04 "),
            Some(Utc.with_ymd_and_hms(2016, 3, 4, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_invalid_values() {
        for value in ["", "yesterday", "2016-13-01", "2016-02-30 10:00:00", "12/01/2016"] {
            assert_eq!(parse_created_date(value), None, "{value}");
        }
    }

    #[test]
    fn test_format_round_trip() {
        let ts = Utc.with_ymd_and_hms(2017, 6, 1, 8, 15, 0).unwrap();
        let formatted = format_timestamp(&ts);
        assert_eq!(formatted, "2017-06-01 08:15:00.000000+00:00");
        assert_eq!(parse_created_date(&formatted), Some(ts));
    }
}
