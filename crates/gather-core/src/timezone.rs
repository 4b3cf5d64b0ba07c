use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parse an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<(), CoreError> {
    parse_timezone(timezone).map(|_| ())
}

/// Resolve a local wall-clock date and time to a UTC instant.
///
/// Ambiguous times (autumn fall-back) resolve to the earliest instant. Times
/// that do not exist (spring-forward gap) move one hour later.
pub fn localize(tz: &Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive).earliest() {
        Some(local) => local.with_timezone(&Utc),
        None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted).earliest() {
                Some(local) => local.with_timezone(&Utc),
                // Gaps longer than an hour: read the wall clock as UTC
                None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

/// The calendar date of a UTC instant as seen in `tz`.
pub fn local_date(tz: &Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Today's date in the named timezone.
pub fn today_in(timezone: &str) -> Result<NaiveDate, CoreError> {
    Ok(local_date(&parse_timezone(timezone)?, Utc::now()))
}
