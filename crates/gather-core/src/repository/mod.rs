use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    CategoryUsage, ContactOutcome, Event, EventCategory, EventSeries, GenerationConfig,
    GenerationSummary, ImageAttachment, InterestGroup, InterestSubmission, InterestTag,
    NewAttachmentData, NewEventData, NewSeriesData, NewSubmissionData, OccurrenceKey,
    SeriesChange, SubmissionDetails, UpdateEventData, UpdateSeriesData,
};
use crate::schedule::{PlannedOccurrence, SeriesDefinition};
use crate::slug;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

pub mod attachments;
pub mod categories;
pub mod events;
pub mod intake;
pub mod occurrences;
pub mod series;

// Traits are defined in this module and implemented in respective domain modules

/// Persistence of generated occurrences, keyed by (series id, start).
#[async_trait]
pub trait OccurrenceStore {
    /// Returns the occurrence for `(definition.id, planned.start)`, creating it
    /// from the series template when absent. The flag is `true` when this call
    /// inserted the row. Safe to call concurrently for the same key.
    async fn get_or_create_occurrence(
        &self,
        definition: &SeriesDefinition,
        planned: &PlannedOccurrence,
    ) -> Result<(Event, bool), CoreError>;

    /// Local date (series timezone) of the latest-starting occurrence.
    async fn watermark(&self, series_id: Uuid) -> Result<Option<NaiveDate>, CoreError>;
}

/// Generation and propagation of series occurrences
#[async_trait]
pub trait OccurrenceRepository: OccurrenceStore {
    /// Creates the occurrences of `series` that fall in `[from, to]` after the
    /// watermark. Returns the keys created by this call.
    async fn generate_occurrences(
        &self,
        series: &EventSeries,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccurrenceKey>, CoreError>;

    /// `generate_occurrences` over `[today, today + lookahead_days]`.
    async fn generate_forward(
        &self,
        series: &EventSeries,
        today: NaiveDate,
    ) -> Result<Vec<OccurrenceKey>, CoreError>;

    /// Copies series-level fields onto occurrences starting at or after `now`.
    async fn sync_future_events(
        &self,
        series: &EventSeries,
        sync_image: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, CoreError>;

    /// Runs forward generation for every active series, each from the
    /// date `now` falls on in its own timezone.
    async fn refresh_all(&self, now: DateTime<Utc>) -> Result<GenerationSummary, CoreError>;
}

/// Domain-specific trait for series operations
#[async_trait]
pub trait SeriesRepository {
    async fn create_series(&self, data: NewSeriesData) -> Result<SeriesChange, CoreError>;
    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<EventSeries>, CoreError>;
    async fn find_series_by_slug(&self, slug: &str) -> Result<Option<EventSeries>, CoreError>;
    async fn find_series_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<EventSeries>, CoreError>;
    async fn list_series(&self) -> Result<Vec<EventSeries>, CoreError>;
    async fn find_active_series(&self) -> Result<Vec<EventSeries>, CoreError>;
    async fn update_series(&self, id: Uuid, data: UpdateSeriesData) -> Result<SeriesChange, CoreError>;
    async fn delete_series(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for event operations
#[async_trait]
pub trait EventRepository {
    async fn add_event(&self, data: NewEventData) -> Result<Event, CoreError>;
    async fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>, CoreError>;
    async fn find_event_by_slug(&self, slug: &str) -> Result<Option<Event>, CoreError>;
    async fn find_events_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Event>, CoreError>;
    async fn update_event(&self, id: Uuid, data: UpdateEventData) -> Result<Event, CoreError>;
    async fn cancel_event(&self, id: Uuid) -> Result<Event, CoreError>;
    async fn delete_event(&self, id: Uuid) -> Result<(), CoreError>;
    async fn list_events(&self) -> Result<Vec<Event>, CoreError>;
    async fn find_upcoming_standalone(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError>;
    async fn find_recurring_next(&self, now: DateTime<Utc>) -> Result<Vec<(EventSeries, Event)>, CoreError>;
    async fn find_events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>, CoreError>;
}

/// Domain-specific trait for category operations
#[async_trait]
pub trait CategoryRepository {
    async fn add_category(&self, name: String, slug: Option<String>) -> Result<EventCategory, CoreError>;
    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<EventCategory>, CoreError>;
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<EventCategory>, CoreError>;
    async fn list_categories(&self) -> Result<Vec<EventCategory>, CoreError>;
    async fn category_usage(&self, id: Uuid) -> Result<CategoryUsage, CoreError>;
    async fn delete_category(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for image attachments
#[async_trait]
pub trait AttachmentRepository {
    async fn add_attachment(&self, data: NewAttachmentData) -> Result<ImageAttachment, CoreError>;
    async fn find_attachment(&self, id: Uuid) -> Result<Option<ImageAttachment>, CoreError>;
    /// True when no series or event references the attachment.
    async fn is_orphan(&self, id: Uuid) -> Result<bool, CoreError>;
    /// Deletes the attachment only if nothing references it.
    async fn delete_if_orphan(&self, id: Uuid) -> Result<bool, CoreError>;
}

/// Domain-specific trait for the interest intake inbox
#[async_trait]
pub trait IntakeRepository {
    async fn add_interest_tag(&self, name: String, group: InterestGroup) -> Result<InterestTag, CoreError>;
    async fn set_interest_tag_active(&self, id: Uuid, is_active: bool) -> Result<InterestTag, CoreError>;
    async fn list_interest_tags(&self, active_only: bool) -> Result<Vec<InterestTag>, CoreError>;
    async fn submit_interest(&self, data: NewSubmissionData) -> Result<InterestSubmission, CoreError>;
    async fn list_submissions(&self) -> Result<Vec<SubmissionDetails>, CoreError>;
    async fn find_submission(&self, id: Uuid) -> Result<Option<SubmissionDetails>, CoreError>;
    async fn find_submissions_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<InterestSubmission>, CoreError>;
    async fn mark_contacted(&self, id: Uuid, now: DateTime<Utc>) -> Result<ContactOutcome, CoreError>;
    async fn update_submission_notes(&self, id: Uuid, notes: Option<String>) -> Result<InterestSubmission, CoreError>;
}

/// Main repository trait that composes all domain traits
#[async_trait]
pub trait Repository:
    OccurrenceRepository
    + SeriesRepository
    + EventRepository
    + CategoryRepository
    + AttachmentRepository
    + IntakeRepository
{
}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    config: GenerationConfig,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, config: GenerationConfig) -> Self {
        Self { pool, config }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

impl Repository for SqliteRepository {}

/// Picks the first free slug among `base`, `base-2`, `base-3`, ... in `table`,
/// ignoring the row `exclude` (the row being renamed).
pub(crate) async fn unique_slug(
    conn: &mut SqliteConnection,
    table: &'static str,
    base: &str,
    exclude: Option<Uuid>,
) -> Result<String, CoreError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE slug = $1 AND id IS NOT $2)");
    for candidate in slug::candidates(base) {
        let taken: bool = sqlx::query_scalar(&sql)
            .bind(&candidate)
            .bind(exclude)
            .fetch_one(&mut *conn)
            .await?;
        if !taken {
            return Ok(candidate);
        }
    }
    Err(CoreError::InvalidInput(format!("No free slug for '{base}'")))
}

/// Fails with `NotFound` unless `table` has a row with this id.
pub(crate) async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    id: Uuid,
    what: &str,
) -> Result<(), CoreError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    let found: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;
    if found {
        Ok(())
    } else {
        Err(CoreError::NotFound(format!("{what} with id {id} not found")))
    }
}

/// Normalizes a short-id prefix for matching against `lower(hex(id))`.
/// `None` when the prefix holds anything but hex digits and dashes, since
/// no id can match it.
pub(crate) fn short_id_pattern(short_id: &str) -> Option<String> {
    let hex: String = short_id
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("{hex}%"))
}

/// Trims a free-text field, mapping blank input to `None`.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
