use crate::error::CoreError;
use crate::models::{
    ContactOutcome, InterestGroup, InterestSubmission, InterestTag, NewSubmissionData,
    SubmissionDetails,
};
use crate::repository::{clean_optional, short_id_pattern, unique_slug, SqliteRepository};
use crate::slug::slugify_or;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
impl super::IntakeRepository for SqliteRepository {
    async fn add_interest_tag(&self, name: String, group: InterestGroup) -> Result<InterestTag, CoreError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("Interest name cannot be empty".to_string()));
        }

        let mut tx = self.pool().begin().await?;
        let base = slugify_or(&name, "interest");
        let now = Utc::now();
        let tag = InterestTag {
            id: Uuid::new_v4(),
            slug: unique_slug(&mut tx, "interest_tags", &base, None).await?,
            name,
            is_active: true,
            group,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO interest_tags (id, name, slug, is_active, "group", created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(tag.id)
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(tag.is_active)
        .bind(tag.group)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tag)
    }

    async fn set_interest_tag_active(&self, id: Uuid, is_active: bool) -> Result<InterestTag, CoreError> {
        let tag = sqlx::query_as(
            "UPDATE interest_tags SET is_active = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::NotFound(format!("Interest with id {} not found", id)))?;
        Ok(tag)
    }

    async fn list_interest_tags(&self, active_only: bool) -> Result<Vec<InterestTag>, CoreError> {
        let sql = if active_only {
            r#"SELECT * FROM interest_tags WHERE is_active = 1 ORDER BY "group", name"#
        } else {
            r#"SELECT * FROM interest_tags ORDER BY "group", name"#
        };
        let tags = sqlx::query_as(sql).fetch_all(self.pool()).await?;
        Ok(tags)
    }

    async fn submit_interest(&self, data: NewSubmissionData) -> Result<InterestSubmission, CoreError> {
        let first_name = data.first_name.trim().to_string();
        if first_name.is_empty() {
            return Err(CoreError::InvalidInput("First name is required".to_string()));
        }
        let email = data.email.trim().to_string();
        if !is_valid_email(&email) {
            return Err(CoreError::InvalidInput(format!("Invalid email address: {}", email)));
        }

        let mut interest_ids = data.interest_ids;
        interest_ids.sort();
        interest_ids.dedup();

        let mut tx = self.pool().begin().await?;

        for tag_id in &interest_ids {
            let active: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM interest_tags WHERE id = $1 AND is_active = 1)",
            )
            .bind(tag_id)
            .fetch_one(&mut *tx)
            .await?;
            if !active {
                return Err(CoreError::InvalidInput(format!(
                    "Unknown or inactive interest: {}",
                    tag_id
                )));
            }
        }

        let now = Utc::now();
        let submission = InterestSubmission {
            id: Uuid::new_v4(),
            first_name,
            last_name: clean_optional(data.last_name),
            email,
            phone: clean_optional(data.phone),
            message: clean_optional(data.message),
            contacted: false,
            contacted_at: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"INSERT INTO interest_submissions (id, first_name, last_name, email, phone, message,
                contacted, contacted_at, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(submission.id)
        .bind(&submission.first_name)
        .bind(&submission.last_name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(&submission.message)
        .bind(submission.contacted)
        .bind(submission.contacted_at)
        .bind(&submission.notes)
        .bind(submission.created_at)
        .bind(submission.updated_at)
        .execute(&mut *tx)
        .await?;

        for tag_id in &interest_ids {
            sqlx::query("INSERT INTO submission_interests (submission_id, tag_id) VALUES ($1, $2)")
                .bind(submission.id)
                .bind(tag_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::info!(
            submission_id = %submission.id,
            interests = interest_ids.len(),
            "received interest submission"
        );
        Ok(submission)
    }

    async fn list_submissions(&self) -> Result<Vec<SubmissionDetails>, CoreError> {
        let submissions: Vec<InterestSubmission> =
            sqlx::query_as("SELECT * FROM interest_submissions ORDER BY created_at DESC")
                .fetch_all(self.pool())
                .await?;

        let mut details = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let interests = self.interest_names(submission.id).await?;
            details.push(SubmissionDetails {
                submission,
                interests,
            });
        }
        Ok(details)
    }

    async fn find_submission(&self, id: Uuid) -> Result<Option<SubmissionDetails>, CoreError> {
        let submission: Option<InterestSubmission> =
            sqlx::query_as("SELECT * FROM interest_submissions WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        match submission {
            Some(submission) => {
                let interests = self.interest_names(submission.id).await?;
                Ok(Some(SubmissionDetails {
                    submission,
                    interests,
                }))
            }
            None => Ok(None),
        }
    }

    async fn find_submissions_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<InterestSubmission>, CoreError> {
        let Some(pattern) = short_id_pattern(short_id) else {
            return Ok(Vec::new());
        };
        let submissions = sqlx::query_as(
            "SELECT * FROM interest_submissions WHERE lower(hex(id)) LIKE $1 ORDER BY created_at DESC",
        )
        .bind(pattern)
        .fetch_all(self.pool())
        .await?;
        Ok(submissions)
    }

    async fn mark_contacted(&self, id: Uuid, now: DateTime<Utc>) -> Result<ContactOutcome, CoreError> {
        let result = sqlx::query(
            "UPDATE interest_submissions SET contacted = 1, contacted_at = $1, updated_at = $2 WHERE id = $3 AND contacted = 0",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() > 0 {
            tracing::info!(submission_id = %id, "marked submission as contacted");
            return Ok(ContactOutcome::Marked);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM interest_submissions WHERE id = $1)")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        if exists {
            Ok(ContactOutcome::AlreadyContacted)
        } else {
            Err(CoreError::NotFound(format!("Submission with id {} not found", id)))
        }
    }

    async fn update_submission_notes(&self, id: Uuid, notes: Option<String>) -> Result<InterestSubmission, CoreError> {
        let submission = sqlx::query_as(
            "UPDATE interest_submissions SET notes = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(clean_optional(notes))
        .bind(Utc::now())
        .bind(id)
        .fetch_all(self.pool())
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| CoreError::NotFound(format!("Submission with id {} not found", id)))?;
        Ok(submission)
    }
}

impl SqliteRepository {
    /// Display names of the interests a submission selected.
    async fn interest_names(&self, submission_id: Uuid) -> Result<Vec<String>, CoreError> {
        let tags: Vec<InterestTag> = sqlx::query_as(
            r#"SELECT t.* FROM interest_tags t
            JOIN submission_interests si ON si.tag_id = t.id
            WHERE si.submission_id = $1
            ORDER BY t."group", t.name"#,
        )
        .bind(submission_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tags.iter().map(InterestTag::display_name).collect())
    }
}

/// Loose syntactic check: one `@`, a non-empty local part and a dotted domain.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}
