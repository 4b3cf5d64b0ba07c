use crate::error::CoreError;
use crate::models::{CategoryUsage, EventCategory};
use crate::repository::{unique_slug, SqliteRepository};
use crate::slug::slugify_or;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::CategoryRepository for SqliteRepository {
    async fn add_category(&self, name: String, slug: Option<String>) -> Result<EventCategory, CoreError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Category name cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;

        let existing: Option<EventCategory> = sqlx::query_as("SELECT * FROM event_categories WHERE name = $1")
            .bind(&name)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(CoreError::InvalidInput(format!("Category '{}' already exists", name)));
        }

        let base = slugify_or(slug.as_deref().unwrap_or(&name), "category");
        let now = Utc::now();
        let category = EventCategory {
            id: Uuid::new_v4(),
            slug: unique_slug(&mut tx, "event_categories", &base, None).await?,
            name,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO event_categories (id, name, slug, created_at, updated_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.slug)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(category)
    }

    async fn find_category_by_id(&self, id: Uuid) -> Result<Option<EventCategory>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM event_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<EventCategory>, CoreError> {
        let category = sqlx::query_as("SELECT * FROM event_categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<EventCategory>, CoreError> {
        let categories = sqlx::query_as("SELECT * FROM event_categories ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(categories)
    }

    async fn category_usage(&self, id: Uuid) -> Result<CategoryUsage, CoreError> {
        let (events, series): (i64, i64) = sqlx::query_as(
            r#"SELECT
                (SELECT COUNT(*) FROM events WHERE category_id = $1),
                (SELECT COUNT(*) FROM event_series WHERE category_id = $2)"#,
        )
        .bind(id)
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(CategoryUsage { events, series })
    }

    async fn delete_category(&self, id: Uuid) -> Result<(), CoreError> {
        // References on events and series are nulled by the schema
        let result = sqlx::query("DELETE FROM event_categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Category with id {} not found", id)));
        }
        Ok(())
    }
}
