use crate::views::table::display_upcoming;
use anyhow::Result;
use chrono::Utc;
use gather_core::repository::Repository;
use owo_colors::OwoColorize;

/// Nightly job: keeps every active series generated through the lookahead window.
pub async fn refresh(repo: &impl Repository) -> Result<()> {
    let summary = repo.refresh_all(Utc::now()).await?;
    println!(
        "{} Refreshed {} series, {} new occurrences",
        "✓".green(),
        summary.series_processed,
        summary.occurrences_created
    );
    Ok(())
}

pub async fn upcoming(repo: &impl Repository) -> Result<()> {
    let now = Utc::now();
    let standalone = repo.find_upcoming_standalone(now).await?;
    let recurring = repo.find_recurring_next(now).await?;
    display_upcoming(&standalone, &recurring, now);
    Ok(())
}
