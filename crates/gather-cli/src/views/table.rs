use crate::util::short_id;
use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use gather_core::models::{
    CategoryUsage, Choice, Event, EventCategory, EventSeries, EventStatus, InterestTag, Recurrence,
    SubmissionDetails,
};
use owo_colors::OwoColorize;

/// Formats a UTC instant on the wall clock of `timezone`.
fn local_time(at: DateTime<Utc>, timezone: &str) -> String {
    match timezone.parse::<Tz>() {
        Ok(tz) => at.with_timezone(&tz).format("%a %Y-%m-%d %H:%M %Z").to_string(),
        Err(_) => at.format("%a %Y-%m-%d %H:%M UTC").to_string(),
    }
}

/// Human description of a series rule, e.g. "Last Friday of the month".
pub fn describe_rule(series: &EventSeries) -> String {
    let day = series.weekday.map(|d| d.label()).unwrap_or("?");
    match (series.recurrence, series.week_of_month) {
        (Recurrence::Weekly, _) => format!("Every {}", day),
        (Recurrence::Biweekly, _) => format!("Every other {} (not generated)", day),
        (Recurrence::Monthly, Some(week)) => format!("{} {} of the month", week.label(), day),
        (Recurrence::Monthly, None) => format!("Monthly on {} (week not set)", day),
    }
}

fn status_cell(status: EventStatus) -> Cell {
    let cell = Cell::new(status.label());
    match status {
        EventStatus::Published => cell.fg(Color::Green),
        EventStatus::Draft => cell.fg(Color::Yellow),
        EventStatus::Canceled => cell.fg(Color::DarkGrey).add_attribute(Attribute::CrossedOut),
    }
}

pub fn display_series(series: &[EventSeries]) {
    if series.is_empty() {
        println!("No series found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Rule", "Time", "Dates", "Active"]);

    for s in series {
        let dates = match s.end_date {
            Some(end) => format!("{} to {}", s.start_date, end),
            None => format!("from {}", s.start_date),
        };
        let mut title = Cell::new(&s.title);
        if !s.is_active {
            title = title.fg(Color::DarkGrey);
        }

        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(s.id)));
        row.add_cell(title);
        row.add_cell(Cell::new(describe_rule(s)));
        row.add_cell(Cell::new(format!("{} {}", s.start_time.format("%H:%M"), s.timezone)));
        row.add_cell(Cell::new(dates));
        row.add_cell(Cell::new(if s.is_active { "yes" } else { "no" }));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_series_details(series: &EventSeries, occurrences: &[Event]) {
    println!("{}", series.title.bold());
    println!("  {} {}", "ID:".bright_black(), series.id);
    println!("  {} {}", "Slug:".bright_black(), series.slug);
    println!("  {} {}", "Rule:".bright_black(), describe_rule(series));
    println!(
        "  {} {} ({} min, {})",
        "Starts:".bright_black(),
        series.start_time.format("%H:%M"),
        series.default_duration_minutes,
        series.timezone
    );
    if let Some(location) = &series.default_location {
        println!("  {} {}", "Location:".bright_black(), location);
    }
    println!("  {} {}", "Visibility:".bright_black(), series.visibility.label());
    if !series.is_active {
        println!("  {}", "Paused: no new occurrences are generated".yellow());
    }
    println!();
    display_events(occurrences);
}

pub fn display_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Starts", "Location", "Status", "Visibility"]);

    for event in events {
        let mut title = event.title.clone();
        if event.series_id.is_some() {
            title.insert_str(0, "↻ ");
        }

        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(event.id)));
        row.add_cell(Cell::new(title));
        row.add_cell(Cell::new(local_time(event.start, &event.timezone)));
        row.add_cell(Cell::new(event.location_name.as_deref().unwrap_or("")));
        row.add_cell(status_cell(event.status));
        row.add_cell(Cell::new(event.visibility.label()));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_event_details(event: &Event) {
    println!("{}", event.title.bold());
    println!("  {} {}", "ID:".bright_black(), event.id);
    println!("  {} {}", "Slug:".bright_black(), event.slug);
    println!("  {} {}", "Starts:".bright_black(), local_time(event.start, &event.timezone));
    if let Some(end) = event.end {
        println!("  {} {}", "Ends:".bright_black(), local_time(end, &event.timezone));
    }
    if let Some(location) = &event.location_name {
        println!("  {} {}", "Location:".bright_black(), location);
    }
    if let Some(address) = &event.address {
        println!("  {} {}", "Address:".bright_black(), address);
    }
    if event.is_online {
        let url = event.meeting_url.as_deref().unwrap_or("link to follow");
        println!("  {} {}", "Online:".bright_black(), url);
    }
    println!("  {} {}", "Status:".bright_black(), event.status.label());
    println!("  {} {}", "Visibility:".bright_black(), event.visibility.label());
    if let Some(summary) = &event.summary {
        println!();
        println!("{}", summary);
    }
}

/// Public listing: one-off events, then the next date of each series.
pub fn display_upcoming(standalone: &[Event], recurring: &[(EventSeries, Event)], now: DateTime<Utc>) {
    println!("{}", "Upcoming events".bold());
    if standalone.is_empty() {
        println!("  {}", "Nothing scheduled.".bright_black());
    }
    for event in standalone {
        println!(
            "  {} {} ({})",
            local_time(event.start, &event.timezone),
            event.title.bright_white(),
            (event.start - now).humanize()
        );
    }

    println!();
    println!("{}", "Recurring".bold());
    if recurring.is_empty() {
        println!("  {}", "No recurring events.".bright_black());
    }
    for (series, next) in recurring {
        println!(
            "  {} {}: next {}",
            series.title.bright_white(),
            describe_rule(series).bright_black(),
            local_time(next.start, &next.timezone)
        );
    }
}

pub fn display_categories(categories: &[(EventCategory, CategoryUsage)]) {
    if categories.is_empty() {
        println!("No categories found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Slug", "Events", "Series"]);
    for (category, usage) in categories {
        table.add_row(vec![
            Cell::new(&category.name),
            Cell::new(&category.slug),
            Cell::new(usage.events),
            Cell::new(usage.series),
        ]);
    }
    println!("{table}");
}

pub fn display_tags(tags: &[InterestTag]) {
    if tags.is_empty() {
        println!("No interest options found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Group", "Name", "Slug", "Active"]);
    for tag in tags {
        let mut name = Cell::new(&tag.name);
        if !tag.is_active {
            name = name.fg(Color::DarkGrey);
        }
        table.add_row(vec![
            Cell::new(tag.group.label()),
            name,
            Cell::new(&tag.slug),
            Cell::new(if tag.is_active { "yes" } else { "no" }),
        ]);
    }
    println!("{table}");
}

pub fn display_submissions(submissions: &[SubmissionDetails]) {
    if submissions.is_empty() {
        println!("No submissions yet.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Email", "Interests", "Received", "Contacted"]);
    for details in submissions {
        let s = &details.submission;
        let mut name = Cell::new(s.full_name());
        if !s.contacted {
            name = name.add_attribute(Attribute::Bold);
        }

        let mut row = Row::new();
        row.add_cell(Cell::new(short_id(s.id)));
        row.add_cell(name);
        row.add_cell(Cell::new(&s.email));
        row.add_cell(Cell::new(details.interests_display()));
        row.add_cell(Cell::new(s.created_at.format("%Y-%m-%d %H:%M")));
        row.add_cell(Cell::new(if s.contacted { "yes" } else { "no" }));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_submission_details(details: &SubmissionDetails) {
    let s = &details.submission;
    println!("{}", s.full_name().bold());
    println!("  {} {}", "ID:".bright_black(), s.id);
    println!("  {} {}", "Email:".bright_black(), s.email);
    if let Some(phone) = &s.phone {
        println!("  {} {}", "Phone:".bright_black(), phone);
    }
    println!("  {} {}", "Interests:".bright_black(), details.interests_display());
    println!("  {} {}", "Received:".bright_black(), s.created_at.format("%Y-%m-%d %H:%M UTC"));
    match s.contacted_at {
        Some(at) => println!("  {} {}", "Contacted:".bright_black(), at.format("%Y-%m-%d %H:%M UTC")),
        None => println!("  {} {}", "Contacted:".bright_black(), "not yet".yellow()),
    }
    if let Some(message) = &s.message {
        println!();
        println!("{}", message);
    }
    if let Some(notes) = &s.notes {
        println!();
        println!("{} {}", "Notes:".bright_black(), notes);
    }
}
