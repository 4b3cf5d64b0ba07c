use super::{attach_image, category_id, confirm};
use crate::cli::{GenerateCommand, SeriesAddCommand, SeriesCommand, SeriesEditCommand};
use crate::config::Config;
use crate::parser::{parse_date, parse_time};
use crate::util::{resolve_series, short_id};
use crate::views::table::{describe_rule, display_series, display_series_details};
use anyhow::Result;
use gather_core::error::CoreError;
use gather_core::models::{NewSeriesData, Recurrence, UpdateSeriesData};
use gather_core::repository::Repository;
use gather_core::timezone::parse_timezone;
use owo_colors::OwoColorize;

pub async fn series_command(repo: &impl Repository, config: &Config, command: SeriesCommand) -> Result<()> {
    match command {
        SeriesCommand::Add(command) => add_series(repo, config, command).await,
        SeriesCommand::List => {
            let series = repo.list_series().await?;
            display_series(&series);
            Ok(())
        }
        SeriesCommand::Show(arg) => {
            let series = resolve_series(repo, &arg.id).await?;
            let occurrences = repo.find_events_for_series(series.id).await?;
            display_series_details(&series, &occurrences);
            Ok(())
        }
        SeriesCommand::Edit(command) => edit_series(repo, command).await,
        SeriesCommand::Delete(args) => {
            let series = resolve_series(repo, &args.id).await?;
            let prompt = format!(
                "Delete series '{}' and all of its occurrences?",
                series.title
            );
            if !confirm(prompt, args.force) {
                return Ok(());
            }
            repo.delete_series(series.id).await?;
            println!("{} Deleted series '{}'", "✓".green(), series.title.bold());
            Ok(())
        }
        SeriesCommand::Generate(command) => generate(repo, command).await,
    }
}

async fn add_series(repo: &impl Repository, config: &Config, command: SeriesAddCommand) -> Result<()> {
    let timezone = command
        .timezone
        .unwrap_or_else(|| config.default_timezone.clone());
    let tz = parse_timezone(&timezone)?;

    let start_date = parse_date(&command.start, &tz)?;
    let end_date = command.until.as_deref().map(|d| parse_date(d, &tz)).transpose()?;
    let start_time = parse_time(&command.at)?;
    let category_id = category_id(repo, command.category.as_deref()).await?;
    let image_id = attach_image(repo, command.image).await?;

    let data = NewSeriesData {
        title: command.title,
        slug: command.slug,
        description: command.description,
        content: command.content,
        image_id,
        category_id,
        visibility: command.visibility,
        default_location: command.location,
        default_address: command.address,
        default_duration_minutes: command.duration,
        start_date,
        end_date,
        start_time,
        timezone: Some(timezone),
        recurrence: command.every,
        weekday: command.on,
        week_of_month: command.week,
        is_active: Some(!command.inactive),
    };

    let change = repo.create_series(data).await?;
    let series = &change.series;

    println!(
        "{} Created series '{}' ({})",
        "✓".green(),
        series.title.bold(),
        short_id(series.id).bright_black()
    );
    println!("  {}", describe_rule(series));
    println!("  {} occurrences generated", change.generated);

    if series.weekday.is_none()
        || series.recurrence == Recurrence::Biweekly
        || (series.recurrence == Recurrence::Monthly && series.week_of_month.is_none())
    {
        println!(
            "  {}",
            "This rule produces no dates; set --on (and --week for monthly series).".yellow()
        );
    }
    Ok(())
}

async fn edit_series(repo: &impl Repository, command: SeriesEditCommand) -> Result<()> {
    let current = resolve_series(repo, &command.id).await?;
    let timezone = command.timezone.clone().unwrap_or_else(|| current.timezone.clone());
    let tz = parse_timezone(&timezone)?;

    let end_date = if command.no_until {
        Some(None)
    } else {
        command.until.as_deref().map(|d| parse_date(d, &tz)).transpose()?.map(Some)
    };
    let category = if command.no_category {
        Some(None)
    } else {
        category_id(repo, command.category.as_deref()).await?.map(Some)
    };
    let image = if command.no_image {
        Some(None)
    } else {
        attach_image(repo, command.image).await?.map(Some)
    };
    let is_active = match (command.resume, command.pause) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };

    let data = UpdateSeriesData {
        title: command.title,
        description: command.description.map(Some),
        content: command.content.map(Some),
        image_id: image,
        category_id: category,
        visibility: command.visibility,
        default_location: command.location.map(Some),
        default_address: command.address.map(Some),
        default_duration_minutes: command.duration,
        start_date: command.start.as_deref().map(|d| parse_date(d, &tz)).transpose()?,
        end_date,
        start_time: command.at.as_deref().map(parse_time).transpose()?,
        timezone: command.timezone,
        recurrence: command.every,
        weekday: command.on.map(Some),
        week_of_month: command.week.map(Some),
        is_active,
    };

    let change = repo.update_series(current.id, data).await?;
    println!("{} Updated series '{}'", "✓".green(), change.series.title.bold());
    println!(
        "  {} future occurrences updated, {} new occurrences generated",
        change.synced, change.generated
    );
    Ok(())
}

async fn generate(repo: &impl Repository, command: GenerateCommand) -> Result<()> {
    let series = resolve_series(repo, &command.id).await?;
    let tz = parse_timezone(&series.timezone)?;
    let from = parse_date(&command.from, &tz)?;
    let to = parse_date(&command.to, &tz)?;
    if from > to {
        return Err(CoreError::InvalidInput(format!("Window start {} is after its end {}", from, to)).into());
    }

    let created = repo.generate_occurrences(&series, from, to).await?;
    println!(
        "{} Generated {} occurrences of '{}' between {} and {}",
        "✓".green(),
        created.len(),
        series.title.bold(),
        from,
        to
    );
    Ok(())
}
