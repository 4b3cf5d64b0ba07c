use crate::error::CoreError;
use crate::models::{EventSeries, NewSeriesData, SeriesChange, UpdateSeriesData};
use crate::repository::{
    clean_optional, ensure_exists, short_id_pattern, unique_slug, AttachmentRepository,
    OccurrenceRepository, SqliteRepository,
};
use crate::schedule::MAX_DURATION_MINUTES;
use crate::slug::slugify_or;
use crate::timezone::{local_date, parse_timezone, today_in, validate_timezone};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

#[async_trait]
impl super::SeriesRepository for SqliteRepository {
    async fn create_series(&self, data: NewSeriesData) -> Result<SeriesChange, CoreError> {
        let now = Utc::now();
        let mut series = EventSeries {
            id: Uuid::new_v4(),
            title: data.title.trim().to_string(),
            slug: String::new(),
            description: clean_optional(data.description),
            content: clean_optional(data.content),
            image_id: data.image_id,
            category_id: data.category_id,
            visibility: data.visibility.unwrap_or_default(),
            default_location: clean_optional(data.default_location),
            default_address: clean_optional(data.default_address),
            default_duration_minutes: data.default_duration_minutes.unwrap_or(60),
            start_date: data.start_date,
            end_date: data.end_date,
            start_time: data.start_time,
            timezone: data
                .timezone
                .unwrap_or_else(|| self.config().default_timezone.clone()),
            recurrence: data.recurrence,
            weekday: data.weekday,
            week_of_month: data.week_of_month,
            is_active: data.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        validate_series(&series)?;

        let mut tx = self.pool().begin().await?;
        ensure_references(&mut tx, &series).await?;

        let base = slugify_or(data.slug.as_deref().unwrap_or(&series.title), "series");
        series.slug = unique_slug(&mut tx, "event_series", &base, None).await?;

        sqlx::query(
            r#"INSERT INTO event_series (id, title, slug, description, content, image_id, category_id,
                visibility, default_location, default_address, default_duration_minutes, start_date,
                end_date, start_time, timezone, recurrence, weekday, week_of_month, is_active,
                created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)"#,
        )
        .bind(series.id)
        .bind(&series.title)
        .bind(&series.slug)
        .bind(&series.description)
        .bind(&series.content)
        .bind(series.image_id)
        .bind(series.category_id)
        .bind(series.visibility)
        .bind(&series.default_location)
        .bind(&series.default_address)
        .bind(series.default_duration_minutes)
        .bind(series.start_date)
        .bind(series.end_date)
        .bind(series.start_time)
        .bind(&series.timezone)
        .bind(series.recurrence)
        .bind(series.weekday)
        .bind(series.week_of_month)
        .bind(series.is_active)
        .bind(series.created_at)
        .bind(series.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(series_id = %series.id, slug = %series.slug, "created series");

        let today = today_in(&series.timezone)?;
        let generated = self.generate_forward(&series, today).await?.len();

        Ok(SeriesChange {
            series,
            generated,
            synced: 0,
        })
    }

    async fn find_series_by_id(&self, id: Uuid) -> Result<Option<EventSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM event_series WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(series)
    }

    async fn find_series_by_slug(&self, slug: &str) -> Result<Option<EventSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM event_series WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(series)
    }

    async fn find_series_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<EventSeries>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let series = sqlx::query_as("SELECT * FROM event_series WHERE lower(hex(id)) LIKE $1 ORDER BY title")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(series)
    }

    async fn list_series(&self) -> Result<Vec<EventSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM event_series ORDER BY title")
            .fetch_all(self.pool())
            .await?;
        Ok(series)
    }

    async fn find_active_series(&self) -> Result<Vec<EventSeries>, CoreError> {
        let series = sqlx::query_as("SELECT * FROM event_series WHERE is_active = 1 ORDER BY title")
            .fetch_all(self.pool())
            .await?;
        Ok(series)
    }

    async fn update_series(&self, id: Uuid, data: UpdateSeriesData) -> Result<SeriesChange, CoreError> {
        let mut tx = self.pool().begin().await?;

        let current: EventSeries = sqlx::query_as("SELECT * FROM event_series WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Series with id {} not found", id)))?;

        let mut series = current.clone();
        if let Some(title) = data.title {
            series.title = title.trim().to_string();
        }
        if let Some(description) = data.description {
            series.description = clean_optional(description);
        }
        if let Some(content) = data.content {
            series.content = clean_optional(content);
        }
        if let Some(image_id) = data.image_id {
            series.image_id = image_id;
        }
        if let Some(category_id) = data.category_id {
            series.category_id = category_id;
        }
        if let Some(visibility) = data.visibility {
            series.visibility = visibility;
        }
        if let Some(location) = data.default_location {
            series.default_location = clean_optional(location);
        }
        if let Some(address) = data.default_address {
            series.default_address = clean_optional(address);
        }
        if let Some(duration) = data.default_duration_minutes {
            series.default_duration_minutes = duration;
        }
        if let Some(start_date) = data.start_date {
            series.start_date = start_date;
        }
        if let Some(end_date) = data.end_date {
            series.end_date = end_date;
        }
        if let Some(start_time) = data.start_time {
            series.start_time = start_time;
        }
        if let Some(timezone) = data.timezone {
            series.timezone = timezone;
        }
        if let Some(recurrence) = data.recurrence {
            series.recurrence = recurrence;
        }
        if let Some(weekday) = data.weekday {
            series.weekday = weekday;
        }
        if let Some(week_of_month) = data.week_of_month {
            series.week_of_month = week_of_month;
        }
        if let Some(is_active) = data.is_active {
            series.is_active = is_active;
        }
        series.updated_at = Utc::now();

        validate_series(&series)?;
        ensure_references(&mut tx, &series).await?;

        sqlx::query(
            r#"UPDATE event_series SET title = $1, description = $2, content = $3, image_id = $4,
                category_id = $5, visibility = $6, default_location = $7, default_address = $8,
                default_duration_minutes = $9, start_date = $10, end_date = $11, start_time = $12,
                timezone = $13, recurrence = $14, weekday = $15, week_of_month = $16, is_active = $17,
                updated_at = $18
            WHERE id = $19"#,
        )
        .bind(&series.title)
        .bind(&series.description)
        .bind(&series.content)
        .bind(series.image_id)
        .bind(series.category_id)
        .bind(series.visibility)
        .bind(&series.default_location)
        .bind(&series.default_address)
        .bind(series.default_duration_minutes)
        .bind(series.start_date)
        .bind(series.end_date)
        .bind(series.start_time)
        .bind(&series.timezone)
        .bind(series.recurrence)
        .bind(series.weekday)
        .bind(series.week_of_month)
        .bind(series.is_active)
        .bind(series.updated_at)
        .bind(series.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let image_changed = current.image_id != series.image_id;
        let now = Utc::now();
        let synced = self.sync_future_events(&series, image_changed, now).await?;

        let today = local_date(&parse_timezone(&series.timezone)?, now);
        let generated = self.generate_forward(&series, today).await?.len();

        if image_changed {
            if let Some(old_image) = current.image_id {
                self.delete_if_orphan(old_image).await?;
            }
        }

        tracing::info!(series_id = %series.id, synced, generated, image_changed, "updated series");
        Ok(SeriesChange {
            series,
            generated,
            synced,
        })
    }

    async fn delete_series(&self, id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let series: EventSeries = sqlx::query_as("SELECT * FROM event_series WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Series with id {} not found", id)))?;

        // Images referenced from the series or its occurrences may become orphans
        let mut images: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT image_id FROM events WHERE series_id = $1 AND image_id IS NOT NULL",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        images.extend(series.image_id);
        images.sort();
        images.dedup();

        // Occurrences cascade
        sqlx::query("DELETE FROM event_series WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut removed = 0;
        for image in images {
            if self.delete_if_orphan(image).await? {
                removed += 1;
            }
        }

        tracing::info!(series_id = %id, images_removed = removed, "deleted series");
        Ok(())
    }
}

fn validate_series(series: &EventSeries) -> Result<(), CoreError> {
    if series.title.is_empty() {
        return Err(CoreError::InvalidInput("Series title cannot be empty".to_string()));
    }
    if !(0..=MAX_DURATION_MINUTES).contains(&series.default_duration_minutes) {
        return Err(CoreError::InvalidInput(format!(
            "Duration must be between 0 and {} minutes, got {}",
            MAX_DURATION_MINUTES, series.default_duration_minutes
        )));
    }
    if let Some(end_date) = series.end_date {
        if end_date < series.start_date {
            return Err(CoreError::InvalidInput(format!(
                "End date {} is before start date {}",
                end_date, series.start_date
            )));
        }
    }
    validate_timezone(&series.timezone)
}

async fn ensure_references(conn: &mut SqliteConnection, series: &EventSeries) -> Result<(), CoreError> {
    if let Some(category_id) = series.category_id {
        ensure_exists(conn, "event_categories", category_id, "Category").await?;
    }
    if let Some(image_id) = series.image_id {
        ensure_exists(conn, "image_attachments", image_id, "Image").await?;
    }
    Ok(())
}
