//! Timestamp normalization to epoch seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Layouts carrying a UTC offset, tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Date-time layouts tried in order. Naive values are read as UTC.
///
/// Dotted dates are day-first (`DD.MM.YYYY`), slashed dates with a leading
/// year are `YYYY/MM/DD`, and the remaining slashed dates are month-first.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d", "%m/%d/%Y"];

/// Compact `YYYYMMDD`, checked before the epoch-seconds reading.
const COMPACT_DATE_FORMAT: &str = "%Y%m%d";
const COMPACT_DATE_LEN: usize = 8;

/// Parses a raw date cell into epoch seconds.
///
/// Returns `None` when the text matches no supported layout.
pub fn parse_epoch_seconds(raw: &str) -> Option<i64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        let compact = (value.len() == COMPACT_DATE_LEN)
            .then(|| parse_date(value, COMPACT_DATE_FORMAT))
            .flatten();
        return compact.or_else(|| value.parse().ok());
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp());
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.timestamp());
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| parse_date(value, format))
}

fn parse_date(value: &str, format: &str) -> Option<i64> {
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
}
