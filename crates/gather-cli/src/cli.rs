use clap::{Args, Parser, Subcommand};
use gather_core::models::{DayOfWeek, EventStatus, EventVisibility, InterestGroup, Recurrence, WeekOfMonth};

/// Staff command line for the Gather community site
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage recurring event series
    #[command(subcommand)]
    Series(SeriesCommand),
    /// Manage dated events
    #[command(subcommand)]
    Event(EventCommand),
    /// Manage event categories
    #[command(subcommand)]
    Category(CategoryCommand),
    /// Interest intake inbox
    #[command(subcommand)]
    Intake(IntakeCommand),
    /// Extend every active series over the lookahead window (run nightly)
    Refresh,
    /// Show the public listing: upcoming one-off events and the next date of each series
    Upcoming,
}

// ============================================================================
// Series
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum SeriesCommand {
    /// Create a series and generate its upcoming occurrences
    Add(SeriesAddCommand),
    /// List all series
    List,
    /// Show a series with its occurrences
    Show(IdArg),
    /// Edit a series; future occurrences pick up the changes
    Edit(SeriesEditCommand),
    /// Delete a series and all of its occurrences
    Delete(DeleteArgs),
    /// Generate occurrences over an explicit date window
    Generate(GenerateCommand),
}

#[derive(Args, Debug, Clone)]
pub struct SeriesAddCommand {
    /// Title of the series
    pub title: String,
    /// How the series repeats (weekly, biweekly, monthly)
    #[clap(long, default_value = "weekly")]
    pub every: Recurrence,
    /// Day of the week the series falls on
    #[clap(long)]
    pub on: Option<DayOfWeek>,
    /// Which week of the month, for monthly series (first..fourth, last)
    #[clap(long)]
    pub week: Option<WeekOfMonth>,
    /// First date the series may occur on (e.g. '2024-01-01', 'next monday')
    #[clap(long)]
    pub start: String,
    /// Last date the series may occur on
    #[clap(long)]
    pub until: Option<String>,
    /// Local start time (e.g. '18:30', '6:30 PM')
    #[clap(long)]
    pub at: String,
    /// Length of each occurrence in minutes
    #[clap(long)]
    pub duration: Option<i64>,
    /// IANA timezone of the start time
    #[clap(long)]
    pub timezone: Option<String>,
    #[clap(short, long)]
    pub description: Option<String>,
    #[clap(long)]
    pub content: Option<String>,
    #[clap(short, long)]
    pub location: Option<String>,
    #[clap(long)]
    pub address: Option<String>,
    /// Category slug
    #[clap(short, long)]
    pub category: Option<String>,
    #[clap(long)]
    pub visibility: Option<EventVisibility>,
    /// Path of an image to attach
    #[clap(long)]
    pub image: Option<String>,
    /// Custom slug (derived from the title otherwise)
    #[clap(long)]
    pub slug: Option<String>,
    /// Create the series paused
    #[clap(long)]
    pub inactive: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SeriesEditCommand {
    /// Series ID (or unique prefix) or slug
    pub id: String,
    #[clap(long)]
    pub title: Option<String>,
    #[clap(long)]
    pub every: Option<Recurrence>,
    #[clap(long)]
    pub on: Option<DayOfWeek>,
    #[clap(long)]
    pub week: Option<WeekOfMonth>,
    #[clap(long)]
    pub start: Option<String>,
    #[clap(long, conflicts_with = "no_until")]
    pub until: Option<String>,
    /// Remove the end date
    #[clap(long)]
    pub no_until: bool,
    #[clap(long)]
    pub at: Option<String>,
    #[clap(long)]
    pub duration: Option<i64>,
    #[clap(long)]
    pub timezone: Option<String>,
    #[clap(short, long)]
    pub description: Option<String>,
    #[clap(long)]
    pub content: Option<String>,
    #[clap(short, long)]
    pub location: Option<String>,
    #[clap(long)]
    pub address: Option<String>,
    #[clap(short, long, conflicts_with = "no_category")]
    pub category: Option<String>,
    /// Remove the category
    #[clap(long)]
    pub no_category: bool,
    #[clap(long)]
    pub visibility: Option<EventVisibility>,
    #[clap(long, conflicts_with = "no_image")]
    pub image: Option<String>,
    /// Remove the image
    #[clap(long)]
    pub no_image: bool,
    /// Resume generation
    #[clap(long, conflicts_with = "pause")]
    pub resume: bool,
    /// Stop generating new occurrences
    #[clap(long)]
    pub pause: bool,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
    /// Series ID (or unique prefix) or slug
    pub id: String,
    /// First date of the window
    #[clap(long)]
    pub from: String,
    /// Last date of the window
    #[clap(long)]
    pub to: String,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum EventCommand {
    /// Add a one-off event
    Add(EventAddCommand),
    /// List events
    List(EventListCommand),
    /// Show one event
    Show(IdArg),
    /// Edit an event
    Edit(EventEditCommand),
    /// Mark an event as canceled
    Cancel(IdArg),
    /// Delete an event
    Delete(DeleteArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EventAddCommand {
    pub title: String,
    /// Start date and time (e.g. '2024-06-01 18:00', 'next friday 7pm')
    #[clap(long)]
    pub start: String,
    #[clap(long)]
    pub end: Option<String>,
    /// IANA timezone the times are given in
    #[clap(long)]
    pub timezone: Option<String>,
    #[clap(short, long)]
    pub summary: Option<String>,
    #[clap(long)]
    pub content: Option<String>,
    #[clap(short, long)]
    pub location: Option<String>,
    #[clap(long)]
    pub address: Option<String>,
    #[clap(long)]
    pub online: bool,
    #[clap(long)]
    pub meeting_url: Option<String>,
    #[clap(long)]
    pub registration_url: Option<String>,
    #[clap(long)]
    pub capacity: Option<i64>,
    #[clap(long)]
    pub status: Option<EventStatus>,
    #[clap(long)]
    pub visibility: Option<EventVisibility>,
    /// Category slug
    #[clap(short, long)]
    pub category: Option<String>,
    #[clap(long)]
    pub image: Option<String>,
    #[clap(long)]
    pub featured: bool,
    #[clap(long)]
    pub slug: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EventListCommand {
    /// Only events that have not started yet
    #[clap(long)]
    pub upcoming: bool,
    /// Only occurrences of this series (ID, prefix or slug)
    #[clap(long)]
    pub series: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct EventEditCommand {
    /// Event ID (or unique prefix) or slug
    pub id: String,
    #[clap(long)]
    pub title: Option<String>,
    #[clap(long)]
    pub start: Option<String>,
    #[clap(long)]
    pub end: Option<String>,
    #[clap(short, long)]
    pub summary: Option<String>,
    #[clap(short, long)]
    pub location: Option<String>,
    #[clap(long)]
    pub address: Option<String>,
    #[clap(long)]
    pub status: Option<EventStatus>,
    #[clap(long)]
    pub visibility: Option<EventVisibility>,
    #[clap(short, long, conflicts_with = "no_category")]
    pub category: Option<String>,
    #[clap(long)]
    pub no_category: bool,
    #[clap(long)]
    pub capacity: Option<i64>,
    #[clap(long)]
    pub featured: Option<bool>,
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum CategoryCommand {
    /// Add a category
    Add {
        name: String,
        #[clap(long)]
        slug: Option<String>,
    },
    /// List categories with usage counts
    List,
    /// Delete a category; events and series keep existing without one
    Delete(DeleteArgs),
}

// ============================================================================
// Intake
// ============================================================================

#[derive(Subcommand, Debug, Clone)]
pub enum IntakeCommand {
    /// List interest options
    Tags {
        /// Include inactive options
        #[clap(long)]
        all: bool,
    },
    /// Add an interest option
    TagAdd {
        name: String,
        #[clap(long, default_value = "connect")]
        group: InterestGroup,
    },
    /// Hide an interest option from the form
    TagDisable { slug: String },
    /// Record a submission (as the public form would)
    Submit(SubmitCommand),
    /// List submissions, newest first
    List,
    /// Show one submission
    Show(IdArg),
    /// Mark a submission as contacted
    Contact(IdArg),
    /// Set or clear staff notes on a submission
    Note {
        id: String,
        /// Omit to clear the notes
        notes: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SubmitCommand {
    #[clap(long)]
    pub first_name: String,
    #[clap(long)]
    pub last_name: Option<String>,
    #[clap(long)]
    pub email: String,
    #[clap(long)]
    pub phone: Option<String>,
    /// Interest slugs
    #[clap(long, num_args = 1..)]
    pub interest: Vec<String>,
    #[clap(short, long)]
    pub message: Option<String>,
}

// ============================================================================
// Shared
// ============================================================================

#[derive(Args, Debug, Clone)]
pub struct IdArg {
    /// ID (or unique prefix) or slug
    pub id: String,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    /// ID (or unique prefix) or slug
    pub id: String,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}
