use anyhow::{anyhow, Result};
use gather_core::error::CoreError;
use gather_core::models::{Event, EventCategory, EventSeries, InterestSubmission, InterestTag};
use gather_core::repository::Repository;
use uuid::Uuid;

/// Narrows prefix matches down to exactly one, or explains why it can't.
fn pick_one<T>(
    short_id: &str,
    kind: &str,
    mut matches: Vec<T>,
    describe: impl Fn(&T) -> (Uuid, String),
) -> Result<T> {
    if matches.len() == 1 {
        return Ok(matches.remove(0));
    }
    if matches.is_empty() {
        return Err(anyhow!(CoreError::NotFound(format!(
            "No {} found matching '{}'",
            kind, short_id
        ))));
    }
    let candidates: Vec<(String, String)> = matches
        .iter()
        .map(|m| {
            let (id, title) = describe(m);
            (id.to_string(), title)
        })
        .collect();
    Err(anyhow!(CoreError::AmbiguousId(candidates)))
}

fn check_short_id(short_id: &str) -> Result<()> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }
    Ok(())
}

/// Finds a series by slug, falling back to an ID prefix.
pub async fn resolve_series(repo: &impl Repository, key: &str) -> Result<EventSeries> {
    if let Some(series) = repo.find_series_by_slug(key).await? {
        return Ok(series);
    }
    check_short_id(key)?;
    let matches = repo.find_series_by_short_id_prefix(key).await?;
    pick_one(key, "series", matches, |s| (s.id, s.title.clone()))
}

/// Finds an event by slug, falling back to an ID prefix.
pub async fn resolve_event(repo: &impl Repository, key: &str) -> Result<Event> {
    if let Some(event) = repo.find_event_by_slug(key).await? {
        return Ok(event);
    }
    check_short_id(key)?;
    let matches = repo.find_events_by_short_id_prefix(key).await?;
    pick_one(key, "event", matches, |e| (e.id, e.title.clone()))
}

pub async fn resolve_submission(repo: &impl Repository, short_id: &str) -> Result<InterestSubmission> {
    check_short_id(short_id)?;
    let matches = repo.find_submissions_by_short_id_prefix(short_id).await?;
    pick_one(short_id, "submission", matches, |s| (s.id, s.full_name()))
}

/// Categories are addressed by slug or exact name.
pub async fn resolve_category(repo: &impl Repository, key: &str) -> Result<EventCategory> {
    if let Some(category) = repo.find_category_by_slug(key).await? {
        return Ok(category);
    }
    repo.list_categories()
        .await?
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(key))
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("No category named '{}'", key))))
}

pub async fn resolve_interest_tag(repo: &impl Repository, slug: &str) -> Result<InterestTag> {
    repo.list_interest_tags(false)
        .await?
        .into_iter()
        .find(|t| t.slug == slug)
        .ok_or_else(|| anyhow!(CoreError::NotFound(format!("No interest option '{}'", slug))))
}

/// Short form of an ID for tables and messages.
pub fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}
