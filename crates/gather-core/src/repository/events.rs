use crate::error::CoreError;
use crate::models::{Event, EventSeries, EventStatus, NewEventData, UpdateEventData};
use crate::repository::{
    clean_optional, ensure_exists, short_id_pattern, unique_slug, AttachmentRepository,
    SeriesRepository, SqliteRepository,
};
use crate::slug::slugify_or;
use crate::timezone::validate_timezone;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

#[async_trait]
impl super::EventRepository for SqliteRepository {
    async fn add_event(&self, data: NewEventData) -> Result<Event, CoreError> {
        let now = Utc::now();
        let mut event = Event {
            id: Uuid::new_v4(),
            title: data.title.trim().to_string(),
            slug: String::new(),
            summary: clean_optional(data.summary),
            content: clean_optional(data.content),
            image_id: data.image_id,
            start: data.start,
            end: data.end,
            timezone: data
                .timezone
                .unwrap_or_else(|| self.config().default_timezone.clone()),
            location_name: clean_optional(data.location_name),
            address: clean_optional(data.address),
            is_online: data.is_online,
            meeting_url: clean_optional(data.meeting_url),
            registration_url: clean_optional(data.registration_url),
            capacity: data.capacity,
            status: data.status.unwrap_or_default(),
            visibility: data.visibility.unwrap_or_default(),
            series_id: None,
            category_id: data.category_id,
            is_featured: data.is_featured,
            requires_registration: data.requires_registration,
            registration_deadline: data.registration_deadline,
            created_at: now,
            updated_at: now,
        };
        validate_event(&event)?;

        let mut tx = self.pool().begin().await?;
        ensure_references(&mut tx, &event).await?;

        let base = slugify_or(data.slug.as_deref().unwrap_or(&event.title), "event");
        event.slug = unique_slug(&mut tx, "events", &base, None).await?;

        sqlx::query(
            r#"INSERT INTO events (id, title, slug, summary, content, image_id, start, "end", timezone,
                location_name, address, is_online, meeting_url, registration_url, capacity, status,
                visibility, series_id, category_id, is_featured, requires_registration,
                registration_deadline, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)"#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.summary)
        .bind(&event.content)
        .bind(event.image_id)
        .bind(event.start)
        .bind(event.end)
        .bind(&event.timezone)
        .bind(&event.location_name)
        .bind(&event.address)
        .bind(event.is_online)
        .bind(&event.meeting_url)
        .bind(&event.registration_url)
        .bind(event.capacity)
        .bind(event.status)
        .bind(event.visibility)
        .bind(event.series_id)
        .bind(event.category_id)
        .bind(event.is_featured)
        .bind(event.requires_registration)
        .bind(event.registration_deadline)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(event_id = %event.id, slug = %event.slug, "created event");
        Ok(event)
    }

    async fn find_event_by_id(&self, id: Uuid) -> Result<Option<Event>, CoreError> {
        let event = sqlx::query_as("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(event)
    }

    async fn find_event_by_slug(&self, slug: &str) -> Result<Option<Event>, CoreError> {
        let event = sqlx::query_as("SELECT * FROM events WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(event)
    }

    async fn find_events_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Event>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let events = sqlx::query_as("SELECT * FROM events WHERE lower(hex(id)) LIKE $1 ORDER BY start")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(events)
    }

    async fn update_event(&self, id: Uuid, data: UpdateEventData) -> Result<Event, CoreError> {
        let mut tx = self.pool().begin().await?;

        let current: Event = sqlx::query_as("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Event with id {} not found", id)))?;

        let mut event = current.clone();
        if let Some(title) = data.title {
            event.title = title.trim().to_string();
        }
        if let Some(summary) = data.summary {
            event.summary = clean_optional(summary);
        }
        if let Some(content) = data.content {
            event.content = clean_optional(content);
        }
        if let Some(image_id) = data.image_id {
            event.image_id = image_id;
        }
        if let Some(start) = data.start {
            event.start = start;
        }
        if let Some(end) = data.end {
            event.end = end;
        }
        if let Some(location_name) = data.location_name {
            event.location_name = clean_optional(location_name);
        }
        if let Some(address) = data.address {
            event.address = clean_optional(address);
        }
        if let Some(is_online) = data.is_online {
            event.is_online = is_online;
        }
        if let Some(meeting_url) = data.meeting_url {
            event.meeting_url = clean_optional(meeting_url);
        }
        if let Some(registration_url) = data.registration_url {
            event.registration_url = clean_optional(registration_url);
        }
        if let Some(capacity) = data.capacity {
            event.capacity = capacity;
        }
        if let Some(status) = data.status {
            event.status = status;
        }
        if let Some(visibility) = data.visibility {
            event.visibility = visibility;
        }
        if let Some(category_id) = data.category_id {
            event.category_id = category_id;
        }
        if let Some(is_featured) = data.is_featured {
            event.is_featured = is_featured;
        }
        if let Some(requires_registration) = data.requires_registration {
            event.requires_registration = requires_registration;
        }
        if let Some(deadline) = data.registration_deadline {
            event.registration_deadline = deadline;
        }
        event.updated_at = Utc::now();

        validate_event(&event)?;
        ensure_references(&mut tx, &event).await?;

        if event.title != current.title {
            let base = slugify_or(&event.title, "event");
            event.slug = unique_slug(&mut tx, "events", &base, Some(event.id)).await?;
        }

        sqlx::query(
            r#"UPDATE events SET title = $1, slug = $2, summary = $3, content = $4, image_id = $5,
                start = $6, "end" = $7, location_name = $8, address = $9, is_online = $10,
                meeting_url = $11, registration_url = $12, capacity = $13, status = $14,
                visibility = $15, category_id = $16, is_featured = $17, requires_registration = $18,
                registration_deadline = $19, updated_at = $20
            WHERE id = $21"#,
        )
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.summary)
        .bind(&event.content)
        .bind(event.image_id)
        .bind(event.start)
        .bind(event.end)
        .bind(&event.location_name)
        .bind(&event.address)
        .bind(event.is_online)
        .bind(&event.meeting_url)
        .bind(&event.registration_url)
        .bind(event.capacity)
        .bind(event.status)
        .bind(event.visibility)
        .bind(event.category_id)
        .bind(event.is_featured)
        .bind(event.requires_registration)
        .bind(event.registration_deadline)
        .bind(event.updated_at)
        .bind(event.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if current.image_id != event.image_id {
            if let Some(old_image) = current.image_id {
                self.delete_if_orphan(old_image).await?;
            }
        }

        Ok(event)
    }

    async fn cancel_event(&self, id: Uuid) -> Result<Event, CoreError> {
        let data = UpdateEventData {
            status: Some(EventStatus::Canceled),
            ..Default::default()
        };
        self.update_event(id, data).await
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), CoreError> {
        let event: Event = sqlx::query_as("DELETE FROM events WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_all(self.pool())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NotFound(format!("Event with id {} not found", id)))?;

        // A shared series image is still referenced by its series and survives
        if let Some(image_id) = event.image_id {
            self.delete_if_orphan(image_id).await?;
        }

        tracing::info!(event_id = %id, series_id = ?event.series_id, "deleted event");
        Ok(())
    }

    async fn list_events(&self) -> Result<Vec<Event>, CoreError> {
        let events = sqlx::query_as("SELECT * FROM events ORDER BY start")
            .fetch_all(self.pool())
            .await?;
        Ok(events)
    }

    async fn find_upcoming_standalone(&self, now: DateTime<Utc>) -> Result<Vec<Event>, CoreError> {
        let events = sqlx::query_as(
            "SELECT * FROM events WHERE series_id IS NULL AND start >= $1 ORDER BY start",
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;
        Ok(events)
    }

    async fn find_recurring_next(&self, now: DateTime<Utc>) -> Result<Vec<(EventSeries, Event)>, CoreError> {
        let mut pairs = Vec::new();
        for series in self.find_active_series().await? {
            let next: Option<Event> = sqlx::query_as(
                "SELECT * FROM events WHERE series_id = $1 AND start >= $2 ORDER BY start LIMIT 1",
            )
            .bind(series.id)
            .bind(now)
            .fetch_optional(self.pool())
            .await?;

            if let Some(event) = next {
                pairs.push((series, event));
            }
        }
        Ok(pairs)
    }

    async fn find_events_for_series(&self, series_id: Uuid) -> Result<Vec<Event>, CoreError> {
        let events = sqlx::query_as("SELECT * FROM events WHERE series_id = $1 ORDER BY start")
            .bind(series_id)
            .fetch_all(self.pool())
            .await?;
        Ok(events)
    }
}

fn validate_event(event: &Event) -> Result<(), CoreError> {
    if event.title.is_empty() {
        return Err(CoreError::InvalidInput("Event title cannot be empty".to_string()));
    }
    if let Some(end) = event.end {
        if end < event.start {
            return Err(CoreError::InvalidInput(format!(
                "Event ends ({}) before it starts ({})",
                end, event.start
            )));
        }
    }
    if let Some(capacity) = event.capacity {
        if capacity < 0 {
            return Err(CoreError::InvalidInput(format!("Capacity cannot be negative: {}", capacity)));
        }
    }
    validate_timezone(&event.timezone)
}

async fn ensure_references(conn: &mut SqliteConnection, event: &Event) -> Result<(), CoreError> {
    if let Some(category_id) = event.category_id {
        ensure_exists(conn, "event_categories", category_id, "Category").await?;
    }
    if let Some(image_id) = event.image_id {
        ensure_exists(conn, "image_attachments", image_id, "Image").await?;
    }
    Ok(())
}
