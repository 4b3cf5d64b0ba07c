//! Recurrence arithmetic for event series.
//!
//! Everything here is pure: no I/O, no clock, no shared state. The
//! repository layer supplies the watermark and persists what
//! [`plan_occurrences`] returns.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{EventSeries, EventVisibility, Recurrence, WeekOfMonth};
use crate::timezone::{localize, parse_timezone};

/// Longest occurrence a series may declare, in minutes.
pub const MAX_DURATION_MINUTES: i64 = i32::MAX as i64;

/// Returns the date of the `ordinal`-th `weekday` in the given month.
///
/// `WeekOfMonth::Last` picks the final such weekday, whether the month holds
/// four or five of them. Returns `None` when the month has no such day or the
/// year/month pair is not a representable date.
pub fn nth_weekday_of_month(
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: WeekOfMonth,
) -> Option<NaiveDate> {
    match ordinal {
        // Every month has at least 28 days, so a 4th occurrence always exists
        WeekOfMonth::Last => NaiveDate::from_weekday_of_month_opt(year, month, weekday, 5)
            .or_else(|| NaiveDate::from_weekday_of_month_opt(year, month, weekday, 4)),
        nth => NaiveDate::from_weekday_of_month_opt(year, month, weekday, nth as u8),
    }
}

/// A generation rule that can actually produce dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceRule {
    Weekly { weekday: Weekday },
    MonthlyNth { weekday: Weekday, ordinal: WeekOfMonth },
}

impl RecurrenceRule {
    /// Derives the rule from a series' stored fields.
    ///
    /// Biweekly series and monthly series missing either weekday or ordinal
    /// have no rule; generation for them is a no-op.
    pub fn from_series(series: &EventSeries) -> Option<Self> {
        let weekday = series.weekday?.to_weekday();
        match series.recurrence {
            Recurrence::Weekly => Some(RecurrenceRule::Weekly { weekday }),
            Recurrence::Monthly => series
                .week_of_month
                .map(|ordinal| RecurrenceRule::MonthlyNth { weekday, ordinal }),
            Recurrence::Biweekly => None,
        }
    }
}

/// Per-occurrence fields copied from the series at generation time.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceTemplate {
    pub title: String,
    /// Series slug; occurrence slugs are `{slug}-{yyyy-mm-dd}`
    pub slug: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub category_id: Option<Uuid>,
    pub visibility: EventVisibility,
    pub image_id: Option<Uuid>,
    pub duration: Duration,
    pub timezone: String,
}

/// Immutable view of a series, as consumed by the planner.
#[derive(Debug, Clone)]
pub struct SeriesDefinition {
    pub id: Uuid,
    pub rule: Option<RecurrenceRule>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    pub timezone: Tz,
    pub active: bool,
    pub template: OccurrenceTemplate,
}

impl TryFrom<&EventSeries> for SeriesDefinition {
    type Error = CoreError;

    fn try_from(series: &EventSeries) -> Result<Self, Self::Error> {
        Ok(Self {
            id: series.id,
            rule: RecurrenceRule::from_series(series),
            start_date: series.start_date,
            end_date: series.end_date,
            start_time: series.start_time,
            timezone: parse_timezone(&series.timezone)?,
            active: series.is_active,
            template: OccurrenceTemplate {
                title: series.title.clone(),
                slug: series.slug.clone(),
                summary: series.description.clone(),
                content: series.content.clone(),
                location_name: series.default_location.clone(),
                address: series.default_address.clone(),
                category_id: series.category_id,
                visibility: series.visibility,
                image_id: series.image_id,
                duration: occurrence_duration(series.default_duration_minutes)?,
                timezone: series.timezone.clone(),
            },
        })
    }
}

fn occurrence_duration(minutes: i64) -> Result<Duration, CoreError> {
    if !(0..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(CoreError::InvalidInput(format!(
            "Duration must be between 0 and {} minutes, got {}",
            MAX_DURATION_MINUTES, minutes
        )));
    }
    Ok(Duration::minutes(minutes))
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// `[start, start + days]`
    pub fn forward(start: NaiveDate, days: u32) -> Self {
        let to = start
            .checked_add_signed(Duration::days(i64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        Self { from: start, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// The earliest date generation may emit, given the local date of the
/// latest existing occurrence (if any).
pub fn watermark_floor(definition: &SeriesDefinition, watermark: Option<NaiveDate>) -> NaiveDate {
    match watermark.and_then(|date| date.succ_opt()) {
        Some(next) => next.max(definition.start_date),
        None => definition.start_date,
    }
}

/// Computes the window generation will actually cover.
///
/// The requested `from` acts as a floor that the watermark may push later:
/// `from = max(requested.from, watermark floor)`. Dates already covered by
/// existing occurrences are therefore never revisited, whatever the caller
/// asks for. `to` is clamped to the series end date. Returns `None` when the
/// resulting window is empty.
pub fn effective_window(
    definition: &SeriesDefinition,
    requested: DateWindow,
    watermark: Option<NaiveDate>,
) -> Option<DateWindow> {
    let from = requested.from.max(watermark_floor(definition, watermark));
    let to = match definition.end_date {
        Some(end) => requested.to.min(end),
        None => requested.to,
    };
    (from <= to).then_some(DateWindow { from, to })
}

/// A dated occurrence the generator wants to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedOccurrence {
    /// Local calendar date of the occurrence
    pub date: NaiveDate,
    pub start: DateTime<Utc>,
    /// `start + duration`; equal to `start` for zero-length series
    pub end: DateTime<Utc>,
}

/// Expands the series rule over `window`, in chronological order.
///
/// Inactive series and series without a usable rule plan nothing.
pub fn plan_occurrences(definition: &SeriesDefinition, window: DateWindow) -> Vec<PlannedOccurrence> {
    if !definition.active {
        return Vec::new();
    }
    let Some(rule) = definition.rule else {
        return Vec::new();
    };

    let dates = match rule {
        RecurrenceRule::Weekly { weekday } => weekly_dates(weekday, window),
        RecurrenceRule::MonthlyNth { weekday, ordinal } => monthly_dates(weekday, ordinal, window),
    };

    dates
        .into_iter()
        .filter_map(|date| {
            let start = localize(&definition.timezone, date, definition.start_time);
            // An end past the representable range drops the occurrence
            let end = start.checked_add_signed(definition.template.duration)?;
            Some(PlannedOccurrence { date, start, end })
        })
        .collect()
}

fn weekly_dates(weekday: Weekday, window: DateWindow) -> Vec<NaiveDate> {
    window
        .from
        .iter_days()
        .take_while(|day| *day <= window.to)
        .filter(|day| day.weekday() == weekday)
        .collect()
}

fn monthly_dates(weekday: Weekday, ordinal: WeekOfMonth, window: DateWindow) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let Some(mut month_start) = window.from.with_day(1) else {
        return dates;
    };

    while month_start <= window.to {
        if let Some(date) =
            nth_weekday_of_month(month_start.year(), month_start.month(), weekday, ordinal)
        {
            // Before `from` happens when the window opens mid-month: skip, never clamp
            if window.contains(date) {
                dates.push(date);
            }
        }
        match month_start.checked_add_months(Months::new(1)) {
            Some(next) => month_start = next,
            None => break,
        }
    }

    dates
}
