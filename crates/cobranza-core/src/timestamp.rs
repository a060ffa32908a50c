use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AttributionError;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parses a recorded date/time. Date-only values are taken at midnight.
pub fn parse_timestamp(subject: &str, raw: &str) -> Result<NaiveDateTime, AttributionError> {
    let value = raw.trim();

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AttributionError::MalformedTimestamp {
            subject: subject.to_string(),
            raw: raw.to_string(),
        })
}

/// Whole calendar days between two dates, regardless of order.
pub fn day_gap(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days().abs()
}
