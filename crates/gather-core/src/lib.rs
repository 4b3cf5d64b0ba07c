//! # Gather Core Library
//!
//! Back end of a small community website: one-off events, recurring event
//! series with generated occurrences, a visitor interest-intake inbox and
//! shared image attachments.
//!
//! ## Features
//!
//! - **Recurring Series**: weekly and "nth weekday of month" rules expanded
//!   into concrete dated events over a rolling window
//! - **Idempotent Generation**: occurrences are keyed by (series, start) and
//!   created through a conflict-tolerant insert, so overlapping runs never
//!   duplicate
//! - **Future Sync**: series edits propagate to occurrences that have not
//!   started yet, never to past ones
//! - **Timezone Awareness**: IANA timezones with DST gap and overlap handling
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures and transfer objects
//! - [`schedule`]: Pure recurrence arithmetic (date rule, window, planner)
//! - [`repository`]: Data access layer with Repository pattern
//! - [`slug`]: URL slug derivation
//! - [`timezone`]: Timezone utilities and validation
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::{NaiveDate, NaiveTime};
//! use gather_core::{
//!     db,
//!     error::CoreError,
//!     models::{DayOfWeek, GenerationConfig, NewSeriesData, Recurrence},
//!     repository::{SeriesRepository, SqliteRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CoreError> {
//!     let pool = db::establish_connection("gather.db").await?;
//!     let repo = SqliteRepository::new(pool, GenerationConfig::default());
//!
//!     let change = repo
//!         .create_series(NewSeriesData {
//!             title: "Tuesday Supper".to_string(),
//!             start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
//!             start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
//!             recurrence: Recurrence::Weekly,
//!             weekday: Some(DayOfWeek::Tuesday),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} generated {} occurrences", change.series.title, change.generated);
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod schedule;
pub mod slug;
pub mod timezone;
