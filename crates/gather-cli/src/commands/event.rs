use super::{attach_image, category_id, confirm};
use crate::cli::{EventAddCommand, EventCommand, EventEditCommand, EventListCommand};
use crate::config::Config;
use crate::parser::parse_datetime;
use crate::util::{resolve_event, resolve_series, short_id};
use crate::views::table::{display_event_details, display_events};
use anyhow::Result;
use chrono::Utc;
use gather_core::models::{NewEventData, UpdateEventData};
use gather_core::repository::Repository;
use gather_core::timezone::parse_timezone;
use owo_colors::OwoColorize;

pub async fn event_command(repo: &impl Repository, config: &Config, command: EventCommand) -> Result<()> {
    match command {
        EventCommand::Add(command) => add_event(repo, config, command).await,
        EventCommand::List(command) => list_events(repo, command).await,
        EventCommand::Show(arg) => {
            let event = resolve_event(repo, &arg.id).await?;
            display_event_details(&event);
            Ok(())
        }
        EventCommand::Edit(command) => edit_event(repo, command).await,
        EventCommand::Cancel(arg) => {
            let event = resolve_event(repo, &arg.id).await?;
            let event = repo.cancel_event(event.id).await?;
            println!("{} Canceled '{}'", "✓".green(), event.title.bold());
            Ok(())
        }
        EventCommand::Delete(args) => {
            let event = resolve_event(repo, &args.id).await?;
            if !confirm(format!("Delete event '{}'?", event.title), args.force) {
                return Ok(());
            }
            repo.delete_event(event.id).await?;
            println!("{} Deleted event '{}'", "✓".green(), event.title.bold());
            if event.series_id.is_some() {
                println!(
                    "  {}",
                    "This date will not come back unless generated over an explicit window.".bright_black()
                );
            }
            Ok(())
        }
    }
}

async fn add_event(repo: &impl Repository, config: &Config, command: EventAddCommand) -> Result<()> {
    let timezone = command
        .timezone
        .unwrap_or_else(|| config.default_timezone.clone());
    let tz = parse_timezone(&timezone)?;

    let start = parse_datetime(&command.start, &tz)?;
    let end = command.end.as_deref().map(|e| parse_datetime(e, &tz)).transpose()?;
    let category_id = category_id(repo, command.category.as_deref()).await?;
    let image_id = attach_image(repo, command.image).await?;

    let data = NewEventData {
        title: command.title,
        slug: command.slug,
        summary: command.summary,
        content: command.content,
        image_id,
        start,
        end,
        timezone: Some(timezone),
        location_name: command.location,
        address: command.address,
        is_online: command.online,
        meeting_url: command.meeting_url,
        requires_registration: command.registration_url.is_some(),
        registration_url: command.registration_url,
        capacity: command.capacity,
        status: command.status,
        visibility: command.visibility,
        category_id,
        is_featured: command.featured,
        registration_deadline: None,
    };

    let event = repo.add_event(data).await?;
    println!(
        "{} Added event '{}' ({})",
        "✓".green(),
        event.title.bold(),
        short_id(event.id).bright_black()
    );
    println!("  {} {}", "Slug:".bright_black(), event.slug);
    Ok(())
}

async fn list_events(repo: &impl Repository, command: EventListCommand) -> Result<()> {
    let mut events = match command.series {
        Some(key) => {
            let series = resolve_series(repo, &key).await?;
            repo.find_events_for_series(series.id).await?
        }
        None => repo.list_events().await?,
    };

    if command.upcoming {
        let now = Utc::now();
        events.retain(|e| e.is_upcoming(now));
    }

    display_events(&events);
    Ok(())
}

async fn edit_event(repo: &impl Repository, command: EventEditCommand) -> Result<()> {
    let current = resolve_event(repo, &command.id).await?;
    let tz = parse_timezone(&current.timezone)?;

    let category = if command.no_category {
        Some(None)
    } else {
        category_id(repo, command.category.as_deref()).await?.map(Some)
    };

    let data = UpdateEventData {
        title: command.title,
        summary: command.summary.map(Some),
        start: command.start.as_deref().map(|s| parse_datetime(s, &tz)).transpose()?,
        end: command
            .end
            .as_deref()
            .map(|e| parse_datetime(e, &tz))
            .transpose()?
            .map(Some),
        location_name: command.location.map(Some),
        address: command.address.map(Some),
        status: command.status,
        visibility: command.visibility,
        category_id: category,
        capacity: command.capacity.map(Some),
        is_featured: command.featured,
        ..Default::default()
    };

    let event = repo.update_event(current.id, data).await?;
    println!("{} Updated event '{}'", "✓".green(), event.title.bold());
    if event.slug != current.slug {
        println!("  {} {} → {}", "Slug:".bright_black(), current.slug, event.slug);
    }
    Ok(())
}
