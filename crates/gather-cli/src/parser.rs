use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use gather_core::timezone::localize;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const TIME_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parses a calendar date, either ISO-like or in plain English ("next monday").
pub fn parse_date(input: &str, tz: &Tz) -> Result<NaiveDate> {
    let input = input.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            return Ok(date);
        }
    }
    parse_date_string(input, Utc::now().with_timezone(tz), Dialect::Us)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses a wall-clock time such as "18:30" or "6:30 PM".
pub fn parse_time(input: &str) -> Result<NaiveTime> {
    let mut normalized = input.trim().to_uppercase();
    // "7 PM" and "19" carry no minutes, which chrono requires
    if !normalized.contains(':') {
        let split = normalized
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(normalized.len());
        normalized.insert_str(split, ":00");
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(&normalized, format).ok())
        .ok_or_else(|| anyhow!("Failed to parse time '{}' (try '18:30' or '6:30 PM')", input))
}

/// Parses a local date and time in `tz` into a UTC instant.
pub fn parse_datetime(input: &str, tz: &Tz) -> Result<DateTime<Utc>> {
    let input = input.trim();
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(localize(tz, naive.date(), naive.time()));
        }
    }
    parse_date_string(input, Utc::now().with_timezone(tz), Dialect::Us)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("Failed to parse date and time '{}': {}", input, e))
}
