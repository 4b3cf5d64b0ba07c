use crate::cli::{IntakeCommand, SubmitCommand};
use crate::util::{resolve_interest_tag, resolve_submission, short_id};
use crate::views::table::{display_submission_details, display_submissions, display_tags};
use anyhow::Result;
use chrono::Utc;
use gather_core::error::CoreError;
use gather_core::models::{ContactOutcome, NewSubmissionData};
use gather_core::repository::Repository;
use owo_colors::OwoColorize;

pub async fn intake_command(repo: &impl Repository, command: IntakeCommand) -> Result<()> {
    match command {
        IntakeCommand::Tags { all } => {
            let tags = repo.list_interest_tags(!all).await?;
            display_tags(&tags);
        }
        IntakeCommand::TagAdd { name, group } => {
            let tag = repo.add_interest_tag(name, group).await?;
            println!("{} Added interest option '{}'", "✓".green(), tag.display_name().bold());
        }
        IntakeCommand::TagDisable { slug } => {
            let tag = resolve_interest_tag(repo, &slug).await?;
            let tag = repo.set_interest_tag_active(tag.id, false).await?;
            println!("{} '{}' is hidden from the form", "✓".green(), tag.display_name().bold());
        }
        IntakeCommand::Submit(command) => submit(repo, command).await?,
        IntakeCommand::List => {
            let submissions = repo.list_submissions().await?;
            display_submissions(&submissions);
        }
        IntakeCommand::Show(arg) => {
            let submission = resolve_submission(repo, &arg.id).await?;
            let details = repo
                .find_submission(submission.id)
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Submission {} not found", submission.id)))?;
            display_submission_details(&details);
        }
        IntakeCommand::Contact(arg) => {
            let submission = resolve_submission(repo, &arg.id).await?;
            match repo.mark_contacted(submission.id, Utc::now()).await? {
                ContactOutcome::Marked => {
                    println!("{} Marked {} as contacted", "✓".green(), submission.full_name().bold());
                }
                ContactOutcome::AlreadyContacted => {
                    println!("{} was already marked as contacted", submission.full_name().yellow());
                }
            }
        }
        IntakeCommand::Note { id, notes } => {
            let submission = resolve_submission(repo, &id).await?;
            let cleared = notes.is_none();
            repo.update_submission_notes(submission.id, notes).await?;
            let verb = if cleared { "Cleared" } else { "Saved" };
            println!("{} {} notes for {}", "✓".green(), verb, submission.full_name().bold());
        }
    }
    Ok(())
}

async fn submit(repo: &impl Repository, command: SubmitCommand) -> Result<()> {
    let mut interest_ids = Vec::with_capacity(command.interest.len());
    for slug in &command.interest {
        interest_ids.push(resolve_interest_tag(repo, slug).await?.id);
    }

    let data = NewSubmissionData {
        first_name: command.first_name,
        last_name: command.last_name,
        email: command.email,
        phone: command.phone,
        interest_ids,
        message: command.message,
    };

    let submission = repo.submit_interest(data).await?;
    println!(
        "{} Received submission from {} ({})",
        "✓".green(),
        submission.full_name().bold(),
        short_id(submission.id).bright_black()
    );
    Ok(())
}
