use crate::error::CoreError;
use crate::models::{Event, EventSeries, EventStatus, GenerationSummary, OccurrenceKey};
use crate::repository::{unique_slug, OccurrenceStore, SeriesRepository, SqliteRepository};
use crate::schedule::{effective_window, plan_occurrences, DateWindow, PlannedOccurrence, SeriesDefinition};
use crate::timezone::{local_date, parse_timezone};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

#[async_trait]
impl super::OccurrenceStore for SqliteRepository {
    async fn get_or_create_occurrence(
        &self,
        definition: &SeriesDefinition,
        planned: &PlannedOccurrence,
    ) -> Result<(Event, bool), CoreError> {
        let mut conn = self.pool().acquire().await?;
        let template = &definition.template;

        let base = format!("{}-{}", template.slug, planned.date.format("%Y-%m-%d"));
        let slug = unique_slug(&mut conn, "events", &base, None).await?;
        let now = Utc::now();

        let inserted = sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (id, title, slug, summary, content, image_id, start, "end", timezone,
                location_name, address, is_online, status, visibility, series_id, category_id,
                is_featured, requires_registration, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 0, $12, $13, $14, $15, 0, 0, $16, $17)
            ON CONFLICT (series_id, start) DO NOTHING
            RETURNING *"#,
        )
        .bind(Uuid::new_v4())
        .bind(&template.title)
        .bind(&slug)
        .bind(&template.summary)
        .bind(&template.content)
        .bind(template.image_id)
        .bind(planned.start)
        .bind(planned.end)
        .bind(&template.timezone)
        .bind(&template.location_name)
        .bind(&template.address)
        .bind(EventStatus::Published)
        .bind(template.visibility)
        .bind(definition.id)
        .bind(template.category_id)
        .bind(now)
        .bind(now)
        .fetch_all(&mut *conn)
        .await
        .map(|rows| rows.into_iter().next());

        // A racing writer can still surface the key (or the derived slug) as a
        // unique violation; either way the existing row for the key is the answer.
        let (inserted, conflict) = match inserted {
            Ok(row) => (row, None),
            Err(err) if err.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
                (None, Some(err))
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(event) = inserted {
            return Ok((event, true));
        }

        match find_by_key(&mut conn, definition.id, planned.start).await? {
            Some(existing) => Ok((existing, false)),
            None => Err(match conflict {
                Some(err) => err.into(),
                None => CoreError::NotFound(format!(
                    "Occurrence of series {} at {} vanished after conflict",
                    definition.id, planned.start
                )),
            }),
        }
    }

    async fn watermark(&self, series_id: Uuid) -> Result<Option<NaiveDate>, CoreError> {
        let latest: Option<(DateTime<Utc>, String)> = sqlx::query_as(
            r#"SELECT e.start, s.timezone FROM events e
            JOIN event_series s ON s.id = e.series_id
            WHERE e.series_id = $1
            ORDER BY e.start DESC
            LIMIT 1"#,
        )
        .bind(series_id)
        .fetch_optional(self.pool())
        .await?;

        latest
            .map(|(start, timezone)| Ok(local_date(&parse_timezone(&timezone)?, start)))
            .transpose()
    }
}

#[async_trait]
impl super::OccurrenceRepository for SqliteRepository {
    async fn generate_occurrences(
        &self,
        series: &EventSeries,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<OccurrenceKey>, CoreError> {
        let definition = SeriesDefinition::try_from(series)?;
        if !definition.active || definition.rule.is_none() {
            tracing::debug!(series_id = %series.id, "series has no active rule, nothing to generate");
            return Ok(Vec::new());
        }

        let watermark = self.watermark(series.id).await?;
        let Some(window) = effective_window(&definition, DateWindow::new(from, to), watermark) else {
            tracing::debug!(series_id = %series.id, ?watermark, "generation window is empty");
            return Ok(Vec::new());
        };

        let mut created = Vec::new();
        for planned in plan_occurrences(&definition, window) {
            let (event, inserted) = self.get_or_create_occurrence(&definition, &planned).await?;
            if inserted {
                created.push(OccurrenceKey {
                    series_id: series.id,
                    start: event.start,
                });
            }
        }

        tracing::info!(
            series_id = %series.id,
            from = %window.from,
            to = %window.to,
            created = created.len(),
            "generated occurrences"
        );
        Ok(created)
    }

    async fn generate_forward(
        &self,
        series: &EventSeries,
        today: NaiveDate,
    ) -> Result<Vec<OccurrenceKey>, CoreError> {
        let window = DateWindow::forward(today, self.config().lookahead_days);
        self.generate_occurrences(series, window.from, window.to).await
    }

    async fn sync_future_events(
        &self,
        series: &EventSeries,
        sync_image: bool,
        now: DateTime<Utc>,
    ) -> Result<u64, CoreError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE events SET category_id = ");
        qb.push_bind(series.category_id);
        qb.push(", location_name = ");
        qb.push_bind(series.default_location.clone());
        qb.push(", address = ");
        qb.push_bind(series.default_address.clone());
        qb.push(", visibility = ");
        qb.push_bind(series.visibility);
        qb.push(", content = ");
        qb.push_bind(series.content.clone());
        if sync_image {
            qb.push(", image_id = ");
            qb.push_bind(series.image_id);
        }
        qb.push(", updated_at = ");
        qb.push_bind(Utc::now());
        qb.push(" WHERE series_id = ");
        qb.push_bind(series.id);
        qb.push(" AND start >= ");
        qb.push_bind(now);

        let updated = qb.build().execute(self.pool()).await?.rows_affected();
        tracing::info!(series_id = %series.id, sync_image, updated, "synced future occurrences");
        Ok(updated)
    }

    async fn refresh_all(&self, now: DateTime<Utc>) -> Result<GenerationSummary, CoreError> {
        let mut summary = GenerationSummary::default();
        for series in self.find_active_series().await? {
            let today = local_date(&parse_timezone(&series.timezone)?, now);
            let created = self.generate_forward(&series, today).await?;
            summary.series_processed += 1;
            summary.occurrences_created += created.len();
        }

        tracing::info!(
            series = summary.series_processed,
            created = summary.occurrences_created,
            "refreshed all active series"
        );
        Ok(summary)
    }
}

async fn find_by_key(
    conn: &mut SqliteConnection,
    series_id: Uuid,
    start: DateTime<Utc>,
) -> Result<Option<Event>, CoreError> {
    let event = sqlx::query_as("SELECT * FROM events WHERE series_id = $1 AND start = $2")
        .bind(series_id)
        .bind(start)
        .fetch_optional(conn)
        .await?;
    Ok(event)
}
