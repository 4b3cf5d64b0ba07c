use crate::error::CoreError;
use crate::models::{ImageAttachment, NewAttachmentData};
use crate::repository::{clean_optional, SqliteRepository};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::AttachmentRepository for SqliteRepository {
    async fn add_attachment(&self, data: NewAttachmentData) -> Result<ImageAttachment, CoreError> {
        let path = data.path.trim().to_string();
        if path.is_empty() {
            return Err(CoreError::InvalidInput("Attachment path cannot be empty".to_string()));
        }

        let attachment = ImageAttachment {
            id: Uuid::new_v4(),
            path,
            alt_text: clean_optional(data.alt_text),
            caption: clean_optional(data.caption),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO image_attachments (id, path, alt_text, caption, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(attachment.id)
        .bind(&attachment.path)
        .bind(&attachment.alt_text)
        .bind(&attachment.caption)
        .bind(attachment.created_at)
        .execute(self.pool())
        .await?;

        Ok(attachment)
    }

    async fn find_attachment(&self, id: Uuid) -> Result<Option<ImageAttachment>, CoreError> {
        let attachment = sqlx::query_as("SELECT * FROM image_attachments WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(attachment)
    }

    async fn is_orphan(&self, id: Uuid) -> Result<bool, CoreError> {
        let orphan: bool = sqlx::query_scalar(
            r#"SELECT NOT EXISTS(SELECT 1 FROM event_series WHERE image_id = $1)
                AND NOT EXISTS(SELECT 1 FROM events WHERE image_id = $2)"#,
        )
        .bind(id)
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(orphan)
    }

    async fn delete_if_orphan(&self, id: Uuid) -> Result<bool, CoreError> {
        // Orphan check and delete in one statement
        let result = sqlx::query(
            r#"DELETE FROM image_attachments WHERE id = $1
                AND NOT EXISTS(SELECT 1 FROM event_series WHERE image_id = $2)
                AND NOT EXISTS(SELECT 1 FROM events WHERE image_id = $3)"#,
        )
        .bind(id)
        .bind(id)
        .bind(id)
        .execute(self.pool())
        .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(image_id = %id, "deleted orphaned image");
        }
        Ok(deleted)
    }
}
