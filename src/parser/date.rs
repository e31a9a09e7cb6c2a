//! Date parsing: stored message timestamps and user-typed filter dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::error::{Result, SkypeError};

/// Parse a stored `originalarrivaltime` value.
///
/// Skype writes RFC 3339 with a `Z` suffix, with or without fractional
/// seconds (`2024-01-01T10:00:00.123Z`). Offsets other than `Z` are accepted
/// and normalized to UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    // Some exports drop the zone designator entirely.
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Which end of a date range a user-typed date bounds.
///
/// A bare day (`2024-01-31`) used as an upper bound covers that whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%b %d, %Y", "%B %d, %Y"];

/// Parse a date given on the command line (`--date-from`, `--date-to`).
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, `DD/MM/YYYY[ HH:MM[:SS]]`,
/// `Jan 2, 2006` and `January 2, 2006`. Values without a zone are UTC.
pub fn parse_date_arg(input: &str, bound: Bound) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            let time = match bound {
                Bound::Start => NaiveTime::MIN,
                Bound::End => end_of_day(),
            };
            return Ok(Utc.from_utc_datetime(&date.and_time(time)));
        }
    }

    Err(SkypeError::InvalidDate(trimmed.to_string()))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}
