use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Choice Sets
// ============================================================================

/// A closed set of stored values, each paired with a display label.
pub trait Choice: Sized + Copy + PartialEq + 'static {
    /// Every variant with its label, in display order.
    const CHOICES: &'static [(Self, &'static str)];

    /// Canonical machine value (what forms and the CLI accept).
    fn value(&self) -> &'static str;

    fn label(&self) -> &'static str {
        Self::CHOICES
            .iter()
            .find(|(choice, _)| choice == self)
            .map(|(_, label)| *label)
            .unwrap_or_default()
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid {kind}: {value}")]
pub struct ParseChoiceError {
    kind: &'static str,
    value: String,
}

/// Matches a value or a label, ignoring case and surrounding whitespace.
fn parse_choice<T: Choice>(kind: &'static str, s: &str) -> Result<T, ParseChoiceError> {
    let needle = s.trim().to_lowercase();
    T::CHOICES
        .iter()
        .map(|(choice, _)| *choice)
        .find(|choice| choice.value() == needle || choice.label().to_lowercase() == needle)
        .ok_or_else(|| ParseChoiceError {
            kind,
            value: s.to_string(),
        })
}

macro_rules! choice_set {
    ($ty:ident, $kind:literal, { $($variant:ident => ($value:literal, $label:literal)),+ $(,)? }) => {
        impl Choice for $ty {
            const CHOICES: &'static [(Self, &'static str)] = &[$(($ty::$variant, $label)),+];

            fn value(&self) -> &'static str {
                match self {
                    $($ty::$variant => $value),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.value())
            }
        }

        impl FromStr for $ty {
            type Err = ParseChoiceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_choice($kind, s)
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Canceled,
}

choice_set!(EventStatus, "event status", {
    Draft => ("draft", "Draft"),
    Published => ("published", "Published"),
    Canceled => ("canceled", "Canceled"),
});

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventVisibility {
    Public,
    Members,
    #[default]
    Private,
}

choice_set!(EventVisibility, "visibility", {
    Public => ("public", "Public"),
    Members => ("members", "Members"),
    Private => ("private", "Private"),
});

/// How a series repeats. `Biweekly` is accepted and stored but has no
/// generation rule yet: such series never produce occurrences.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    Weekly,
    Biweekly,
    Monthly,
}

choice_set!(Recurrence, "recurrence", {
    Weekly => ("weekly", "Weekly"),
    Biweekly => ("biweekly", "Every 2 Weeks"),
    Monthly => ("monthly", "Monthly"),
});

/// Day of week as stored on a series: 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday = 0,
    Tuesday = 1,
    Wednesday = 2,
    Thursday = 3,
    Friday = 4,
    Saturday = 5,
    Sunday = 6,
}

choice_set!(DayOfWeek, "weekday", {
    Monday => ("monday", "Monday"),
    Tuesday => ("tuesday", "Tuesday"),
    Wednesday => ("wednesday", "Wednesday"),
    Thursday => ("thursday", "Thursday"),
    Friday => ("friday", "Friday"),
    Saturday => ("saturday", "Saturday"),
    Sunday => ("sunday", "Sunday"),
});

impl DayOfWeek {
    /// Looks up a day by its stored index (0 = Monday).
    pub fn from_index(index: i64) -> Option<Self> {
        Self::CHOICES
            .iter()
            .map(|(day, _)| *day)
            .find(|day| *day as i64 == index)
    }

    pub fn to_weekday(self) -> Weekday {
        match self {
            DayOfWeek::Monday => Weekday::Mon,
            DayOfWeek::Tuesday => Weekday::Tue,
            DayOfWeek::Wednesday => Weekday::Wed,
            DayOfWeek::Thursday => Weekday::Thu,
            DayOfWeek::Friday => Weekday::Fri,
            DayOfWeek::Saturday => Weekday::Sat,
            DayOfWeek::Sunday => Weekday::Sun,
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// Which occurrence of a weekday within a month. Stored as 1..=4, with 5
/// meaning the final occurrence whether the month has four or five.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[repr(i32)]
#[serde(rename_all = "lowercase")]
pub enum WeekOfMonth {
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
    Last = 5,
}

choice_set!(WeekOfMonth, "week of month", {
    First => ("first", "First"),
    Second => ("second", "Second"),
    Third => ("third", "Third"),
    Fourth => ("fourth", "Fourth"),
    Last => ("last", "Last"),
});

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InterestGroup {
    Interview,
    Programs,
    #[default]
    Connect,
    Learn,
}

choice_set!(InterestGroup, "interest group", {
    Interview => ("interview", "Interview"),
    Programs => ("programs", "Programs"),
    Connect => ("connect", "Connect"),
    Learn => ("learn", "Learn More"),
});

// ============================================================================
// Attachments & Categories
// ============================================================================

/// An uploaded image. It records no owner: whether it is still in use is
/// answered by querying the series and event rows that point at it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageAttachment {
    pub id: Uuid,
    /// Storage path of the processed file
    pub path: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewAttachmentData {
    pub path: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How many events and series point at a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryUsage {
    pub events: i64,
    pub series: i64,
}

// ============================================================================
// Event Series
// ============================================================================

/// A recurrence template from which dated events are generated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventSeries {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    /// Short summary copied onto each occurrence
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub visibility: EventVisibility,
    pub default_location: Option<String>,
    pub default_address: Option<String>,
    pub default_duration_minutes: i64,
    /// First date the series can occur on (inclusive)
    pub start_date: NaiveDate,
    /// Last date the series can occur on (inclusive)
    pub end_date: Option<NaiveDate>,
    /// Local start time of each occurrence
    pub start_time: NaiveTime,
    /// IANA timezone the date and start time are expressed in
    pub timezone: String,
    pub recurrence: Recurrence,
    pub weekday: Option<DayOfWeek>,
    pub week_of_month: Option<WeekOfMonth>,
    /// Whether the series is currently eligible for generation
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new series
#[derive(Debug, Clone, Default)]
pub struct NewSeriesData {
    pub title: String,
    /// Derived from the title when absent
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub image_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub visibility: Option<EventVisibility>,
    pub default_location: Option<String>,
    pub default_address: Option<String>,
    /// Defaults to 60 minutes
    pub default_duration_minutes: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: NaiveTime,
    /// Falls back to the repository's configured default timezone
    pub timezone: Option<String>,
    pub recurrence: Recurrence,
    pub weekday: Option<DayOfWeek>,
    pub week_of_month: Option<WeekOfMonth>,
    /// Defaults to active
    pub is_active: Option<bool>,
}

/// Data for modifying an existing series. `Option<Option<_>>` fields
/// distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default)]
pub struct UpdateSeriesData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub image_id: Option<Option<Uuid>>,
    pub category_id: Option<Option<Uuid>>,
    pub visibility: Option<EventVisibility>,
    pub default_location: Option<Option<String>>,
    pub default_address: Option<Option<String>>,
    pub default_duration_minutes: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub start_time: Option<NaiveTime>,
    pub timezone: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub weekday: Option<Option<DayOfWeek>>,
    pub week_of_month: Option<Option<WeekOfMonth>>,
    pub is_active: Option<bool>,
}

/// Outcome of a series lifecycle call.
#[derive(Debug, Clone)]
pub struct SeriesChange {
    pub series: EventSeries,
    /// Occurrences created by the follow-up generation run
    pub generated: usize,
    /// Future occurrences rewritten by the sync (always 0 on creation)
    pub synced: u64,
}

// ============================================================================
// Events (Occurrences)
// ============================================================================

/// A concretely dated event: either standalone or generated from a series.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_id: Option<Uuid>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub timezone: String,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub is_online: bool,
    pub meeting_url: Option<String>,
    pub registration_url: Option<String>,
    pub capacity: Option<i64>,
    pub status: EventStatus,
    pub visibility: EventVisibility,
    /// Set when this event is an occurrence generated from a series
    pub series_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
    pub requires_registration: bool,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start >= now
    }
}

/// Natural key of a generated occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub series_id: Uuid,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewEventData {
    pub title: String,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub image_id: Option<Uuid>,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    /// Falls back to the repository's configured default timezone
    pub timezone: Option<String>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub is_online: bool,
    pub meeting_url: Option<String>,
    pub registration_url: Option<String>,
    pub capacity: Option<i64>,
    /// Defaults to draft
    pub status: Option<EventStatus>,
    pub visibility: Option<EventVisibility>,
    pub category_id: Option<Uuid>,
    pub is_featured: bool,
    pub requires_registration: bool,
    pub registration_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEventData {
    pub title: Option<String>,
    pub summary: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub image_id: Option<Option<Uuid>>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<Option<DateTime<Utc>>>,
    pub location_name: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub is_online: Option<bool>,
    pub meeting_url: Option<Option<String>>,
    pub registration_url: Option<Option<String>>,
    pub capacity: Option<Option<i64>>,
    pub status: Option<EventStatus>,
    pub visibility: Option<EventVisibility>,
    pub category_id: Option<Option<Uuid>>,
    pub is_featured: Option<bool>,
    pub requires_registration: Option<bool>,
    pub registration_deadline: Option<Option<DateTime<Utc>>>,
}

/// Result of a bulk generation run over every active series.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    pub series_processed: usize,
    pub occurrences_created: usize,
}

/// Configuration for occurrence generation
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// How far past today the forward window reaches
    pub lookahead_days: u32,
    /// Timezone for series and events created without one
    pub default_timezone: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 90,
            default_timezone: "America/Denver".to_string(),
        }
    }
}

// ============================================================================
// Interest Intake
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterestTag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub group: InterestGroup,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterestTag {
    /// "Group: Name", as shown in the inbox.
    pub fn display_name(&self) -> String {
        format!("{}: {}", self.group.label(), self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterestSubmission {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub contacted: bool,
    pub contacted_at: Option<DateTime<Utc>>,
    /// Staff-only triage notes
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterestSubmission {
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name,
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// A submission together with the names of the interests it selected.
#[derive(Debug, Clone)]
pub struct SubmissionDetails {
    pub submission: InterestSubmission,
    pub interests: Vec<String>,
}

impl SubmissionDetails {
    pub fn interests_display(&self) -> String {
        if self.interests.is_empty() {
            "None selected".to_string()
        } else {
            self.interests.join(", ")
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSubmissionData {
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub interest_ids: Vec<Uuid>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// The submission was just marked as contacted
    Marked,
    /// Someone had already marked it; nothing changed
    AlreadyContacted,
}
