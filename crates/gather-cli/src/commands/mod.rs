use anyhow::Result;
use dialoguer::Confirm;
use gather_core::models::NewAttachmentData;
use gather_core::repository::Repository;
use uuid::Uuid;

pub mod category;
pub mod event;
pub mod intake;
pub mod refresh;
pub mod series;

/// Asks before a destructive action unless `--force` was given.
pub(crate) fn confirm(prompt: String, force: bool) -> bool {
    if force {
        return true;
    }
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false);
    if !confirmed {
        println!("Deletion cancelled.");
    }
    confirmed
}

/// Records an image path as an attachment and returns its id.
pub(crate) async fn attach_image(repo: &impl Repository, path: Option<String>) -> Result<Option<Uuid>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let attachment = repo
        .add_attachment(NewAttachmentData {
            path,
            alt_text: None,
            caption: None,
        })
        .await?;
    Ok(Some(attachment.id))
}

/// Resolves an optional `--category` argument to its id.
pub(crate) async fn category_id(repo: &impl Repository, key: Option<&str>) -> Result<Option<Uuid>> {
    match key {
        Some(key) => Ok(Some(crate::util::resolve_category(repo, key).await?.id)),
        None => Ok(None),
    }
}
