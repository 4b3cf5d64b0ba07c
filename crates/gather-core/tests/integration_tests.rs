use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use gather_core::db::establish_connection;
use gather_core::error::CoreError;
use gather_core::models::*;
use gather_core::repository::{
    AttachmentRepository, CategoryRepository, EventRepository, IntakeRepository,
    OccurrenceRepository, OccurrenceStore, SeriesRepository, SqliteRepository,
};
use gather_core::schedule::{plan_occurrences, DateWindow, SeriesDefinition};
use std::sync::Arc;
use tempfile::TempDir;

/// Helper function to create a test database
async fn setup_test_db() -> (SqliteRepository, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    let config = GenerationConfig {
        lookahead_days: 90,
        default_timezone: "UTC".to_string(),
    };
    let repository = SqliteRepository::new(pool, config);

    (repository, temp_dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn six_pm() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap()
}

/// A series confined to 2024, so creation (which generates from
/// today) leaves it empty and tests drive the windows themselves.
async fn create_2024_series(repo: &SqliteRepository, title: &str, data: NewSeriesData) -> EventSeries {
    let change = repo
        .create_series(NewSeriesData {
            title: title.to_string(),
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 12, 31)),
            start_time: six_pm(),
            timezone: Some("UTC".to_string()),
            ..data
        })
        .await
        .expect("Failed to create test series");
    assert_eq!(change.generated, 0);
    change.series
}

fn weekly_on(day: DayOfWeek) -> NewSeriesData {
    NewSeriesData {
        recurrence: Recurrence::Weekly,
        weekday: Some(day),
        ..Default::default()
    }
}

/// Weekday of tomorrow (UTC), so every generated occurrence lies in the future.
fn tomorrow_weekday() -> DayOfWeek {
    DayOfWeek::from((Utc::now().date_naive() + Duration::days(1)).weekday())
}

fn event_dates(events: &[Event]) -> Vec<NaiveDate> {
    events.iter().map(|e| e.start.date_naive()).collect()
}

#[tokio::test]
async fn test_weekly_generation_over_window() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Tuesday Supper", weekly_on(DayOfWeek::Tuesday)).await;

    let created = repo
        .generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    assert_eq!(created.len(), 5);

    let events = repo.find_events_for_series(series.id).await.unwrap();
    assert_eq!(
        event_dates(&events),
        vec![date(2024, 1, 2), date(2024, 1, 9), date(2024, 1, 16), date(2024, 1, 23), date(2024, 1, 30)]
    );

    let first = &events[0];
    assert_eq!(first.start, at(2024, 1, 2, 18));
    assert_eq!(first.end, Some(at(2024, 1, 2, 19)));
    assert_eq!(first.title, "Tuesday Supper");
    assert_eq!(first.slug, "tuesday-supper-2024-01-02");
    assert_eq!(first.status, EventStatus::Published);
    assert_eq!(first.series_id, Some(series.id));
}

#[tokio::test]
async fn test_monthly_last_friday_generation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(
        &repo,
        "Last Friday Social",
        NewSeriesData {
            recurrence: Recurrence::Monthly,
            weekday: Some(DayOfWeek::Friday),
            week_of_month: Some(WeekOfMonth::Last),
            ..Default::default()
        },
    )
    .await;

    repo.generate_occurrences(&series, date(2024, 2, 1), date(2024, 4, 30))
        .await
        .unwrap();

    let events = repo.find_events_for_series(series.id).await.unwrap();
    assert_eq!(
        event_dates(&events),
        vec![date(2024, 2, 23), date(2024, 3, 29), date(2024, 4, 26)]
    );
}

#[tokio::test]
async fn test_overlapping_generation_creates_no_duplicates() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Game Night", weekly_on(DayOfWeek::Thursday)).await;

    let first = repo
        .generate_occurrences(&series, date(2024, 3, 1), date(2024, 3, 31))
        .await
        .unwrap();
    let second = repo
        .generate_occurrences(&series, date(2024, 3, 1), date(2024, 3, 31))
        .await
        .unwrap();
    let third = repo
        .generate_occurrences(&series, date(2024, 3, 15), date(2024, 4, 15))
        .await
        .unwrap();

    assert_eq!(first.len(), 4);
    assert!(second.is_empty());
    assert_eq!(third.len(), 2);

    let events = repo.find_events_for_series(series.id).await.unwrap();
    assert_eq!(events.len(), 6);
}

#[tokio::test]
async fn test_watermark_overrides_requested_start() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Tuesday Supper", weekly_on(DayOfWeek::Tuesday)).await;

    repo.generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 30))
        .await
        .unwrap();
    assert_eq!(repo.watermark(series.id).await.unwrap(), Some(date(2024, 1, 30)));

    // Remove one inside the covered range; the watermark keeps it from coming back
    let events = repo.find_events_for_series(series.id).await.unwrap();
    repo.delete_event(events[1].id).await.unwrap();

    let created = repo
        .generate_occurrences(&series, date(2024, 1, 1), date(2024, 2, 28))
        .await
        .unwrap();
    let created_dates: Vec<NaiveDate> = created.iter().map(|k| k.start.date_naive()).collect();
    assert_eq!(
        created_dates,
        vec![date(2024, 2, 6), date(2024, 2, 13), date(2024, 2, 20), date(2024, 2, 27)]
    );
    assert!(created.iter().all(|k| k.start.date_naive() >= date(2024, 1, 31)));

    let remaining = repo.find_events_for_series(series.id).await.unwrap();
    assert!(!event_dates(&remaining).contains(&date(2024, 1, 9)));
}

#[tokio::test]
async fn test_watermark_uses_series_timezone() {
    let (repo, _temp_dir) = setup_test_db().await;
    let change = repo
        .create_series(NewSeriesData {
            title: "Late Jam".to_string(),
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 12, 31)),
            // 22:00 in Denver is 05:00 UTC the next day
            start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            timezone: Some("America/Denver".to_string()),
            ..weekly_on(DayOfWeek::Tuesday)
        })
        .await
        .unwrap();

    repo.generate_occurrences(&change.series, date(2024, 1, 1), date(2024, 1, 9))
        .await
        .unwrap();

    let events = repo.find_events_for_series(change.series.id).await.unwrap();
    assert_eq!(events[1].start, at(2024, 1, 10, 5));
    assert_eq!(repo.watermark(change.series.id).await.unwrap(), Some(date(2024, 1, 9)));
}

#[tokio::test]
async fn test_end_date_bounds_generation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Short Run", weekly_on(DayOfWeek::Monday)).await;
    let change = repo
        .update_series(
            series.id,
            UpdateSeriesData {
                end_date: Some(Some(date(2024, 1, 15))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(change.generated, 0);

    repo.generate_occurrences(&change.series, date(2024, 1, 1), date(2024, 3, 1))
        .await
        .unwrap();
    let events = repo.find_events_for_series(series.id).await.unwrap();
    assert_eq!(
        event_dates(&events),
        vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]
    );
}

#[tokio::test]
async fn test_noop_rules_generate_nothing() {
    let (repo, _temp_dir) = setup_test_db().await;

    let monthly_without_ordinal = NewSeriesData {
        recurrence: Recurrence::Monthly,
        weekday: Some(DayOfWeek::Friday),
        ..Default::default()
    };
    let biweekly = NewSeriesData {
        recurrence: Recurrence::Biweekly,
        weekday: Some(DayOfWeek::Friday),
        ..Default::default()
    };
    let inactive = NewSeriesData {
        is_active: Some(false),
        ..weekly_on(DayOfWeek::Friday)
    };

    for (title, data) in [("Monthly", monthly_without_ordinal), ("Biweekly", biweekly), ("Inactive", inactive)] {
        let series = create_2024_series(&repo, title, data).await;
        let created = repo
            .generate_occurrences(&series, date(2024, 1, 1), date(2024, 12, 31))
            .await
            .unwrap();
        assert!(created.is_empty(), "{title} should not generate");
    }
}

#[tokio::test]
async fn test_create_series_generates_forward_window() {
    let (repo, _temp_dir) = setup_test_db().await;
    let today = Utc::now().date_naive();

    let change = repo
        .create_series(NewSeriesData {
            title: "Open Studio".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            timezone: Some("UTC".to_string()),
            ..weekly_on(tomorrow_weekday())
        })
        .await
        .unwrap();

    // 91 days in [today, today + 90], none of them before tomorrow
    assert_eq!(change.generated, 13);
    assert_eq!(change.synced, 0);

    let events = repo.find_events_for_series(change.series.id).await.unwrap();
    assert_eq!(events.len(), 13);
    assert!(events.iter().all(|e| e.start.date_naive() > today));
    assert!(events.iter().all(|e| e.start.date_naive() <= today + Duration::days(90)));
}

#[tokio::test]
async fn test_sync_updates_only_future_fields() {
    let (repo, _temp_dir) = setup_test_db().await;
    let category = repo.add_category("Music".to_string(), None).await.unwrap();
    let image_a = repo
        .add_attachment(NewAttachmentData {
            path: "events/a.jpg".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let image_b = repo
        .add_attachment(NewAttachmentData {
            path: "events/b.jpg".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let series = create_2024_series(
        &repo,
        "Jam Session",
        NewSeriesData {
            image_id: Some(image_a.id),
            default_location: Some("Hall".to_string()),
            ..weekly_on(DayOfWeek::Wednesday)
        },
    )
    .await;
    repo.generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();

    let mut edited = series.clone();
    edited.title = "Renamed Jam".to_string();
    edited.category_id = Some(category.id);
    edited.default_location = Some("Park".to_string());
    edited.default_address = Some("1 Main St".to_string());
    edited.visibility = EventVisibility::Public;
    edited.content = Some("Bring an instrument".to_string());
    edited.image_id = Some(image_b.id);

    let cutoff = at(2024, 1, 15, 0);
    let updated = repo.sync_future_events(&edited, false, cutoff).await.unwrap();
    assert_eq!(updated, 3);

    for event in repo.find_events_for_series(series.id).await.unwrap() {
        assert_eq!(event.title, "Jam Session");
        assert_eq!(event.image_id, Some(image_a.id));
        assert_eq!(event.end, Some(event.start + Duration::minutes(60)));
        if event.start >= cutoff {
            assert_eq!(event.category_id, Some(category.id));
            assert_eq!(event.location_name.as_deref(), Some("Park"));
            assert_eq!(event.address.as_deref(), Some("1 Main St"));
            assert_eq!(event.visibility, EventVisibility::Public);
            assert_eq!(event.content.as_deref(), Some("Bring an instrument"));
        } else {
            assert_eq!(event.category_id, None);
            assert_eq!(event.location_name.as_deref(), Some("Hall"));
            assert_eq!(event.visibility, EventVisibility::Private);
            assert_eq!(event.content, None);
        }
    }

    repo.sync_future_events(&edited, true, cutoff).await.unwrap();
    for event in repo.find_events_for_series(series.id).await.unwrap() {
        let expected = if event.start >= cutoff { image_b.id } else { image_a.id };
        assert_eq!(event.image_id, Some(expected));
    }
}

#[tokio::test]
async fn test_update_series_syncs_and_cleans_up_image() {
    let (repo, _temp_dir) = setup_test_db().await;
    let old_image = repo
        .add_attachment(NewAttachmentData {
            path: "series/old.jpg".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    let new_image = repo
        .add_attachment(NewAttachmentData {
            path: "series/new.jpg".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let created = repo
        .create_series(NewSeriesData {
            title: "Open Studio".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            timezone: Some("UTC".to_string()),
            image_id: Some(old_image.id),
            ..weekly_on(tomorrow_weekday())
        })
        .await
        .unwrap();

    let change = repo
        .update_series(
            created.series.id,
            UpdateSeriesData {
                title: Some("Studio Night".to_string()),
                default_location: Some(Some("Annex".to_string())),
                image_id: Some(Some(new_image.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(change.synced, 13);
    assert_eq!(change.generated, 0);
    assert_eq!(change.series.title, "Studio Night");
    assert_eq!(change.series.slug, "open-studio");

    for event in repo.find_events_for_series(created.series.id).await.unwrap() {
        assert_eq!(event.title, "Open Studio");
        assert_eq!(event.location_name.as_deref(), Some("Annex"));
        assert_eq!(event.image_id, Some(new_image.id));
    }

    assert!(repo.find_attachment(old_image.id).await.unwrap().is_none());
    assert!(repo.find_attachment(new_image.id).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_inserts_once() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Race", weekly_on(DayOfWeek::Tuesday)).await;

    let definition = SeriesDefinition::try_from(&series).unwrap();
    let planned = plan_occurrences(&definition, DateWindow::new(date(2024, 1, 1), date(2024, 1, 7)))[0];

    let repo = Arc::new(repo);
    let definition = Arc::new(definition);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let definition = Arc::clone(&definition);
            tokio::spawn(async move { repo.get_or_create_occurrence(&definition, &planned).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(results.iter().filter(|(_, created)| *created).count(), 1);
    let id = results[0].0.id;
    assert!(results.iter().all(|(event, _)| event.id == id));
    assert_eq!(repo.find_events_for_series(series.id).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generation_creates_each_occurrence_once() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Crowded", weekly_on(DayOfWeek::Tuesday)).await;

    let repo = Arc::new(repo);
    let series = Arc::new(series);
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let repo = Arc::clone(&repo);
            let series = Arc::clone(&series);
            tokio::spawn(async move {
                repo.generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 31)).await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        created += handle.await.unwrap().unwrap().len();
    }

    assert_eq!(created, 5);
    assert_eq!(repo.find_events_for_series(series.id).await.unwrap().len(), 5);
    assert_eq!(repo.watermark(series.id).await.unwrap(), Some(date(2024, 1, 30)));
}

/// Writes must be committed before the call returns: a second pool on the
/// same file sees every one of them.
#[tokio::test]
async fn test_writes_are_visible_to_another_connection() {
    let (repo, temp_dir) = setup_test_db().await;
    let db_path = temp_dir.path().join("test.db");

    let series = create_2024_series(&repo, "Tuesday Supper", weekly_on(DayOfWeek::Tuesday)).await;
    let created = repo
        .generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();
    assert_eq!(created.len(), 5);

    let standalone = repo
        .add_event(NewEventData {
            title: "Potluck".to_string(),
            start: at(2030, 4, 12, 17),
            ..Default::default()
        })
        .await
        .unwrap();
    repo.delete_event(standalone.id).await.unwrap();

    let tag = repo
        .add_interest_tag("Gardening".to_string(), InterestGroup::Programs)
        .await
        .unwrap();
    repo.set_interest_tag_active(tag.id, false).await.unwrap();

    let submission = repo
        .submit_interest(NewSubmissionData {
            first_name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    repo.update_submission_notes(submission.id, Some("Call back".to_string()))
        .await
        .unwrap();

    let other_pool = establish_connection(&db_path.to_string_lossy()).await.unwrap();
    let other = SqliteRepository::new(other_pool, GenerationConfig::default());

    assert_eq!(other.find_events_for_series(series.id).await.unwrap().len(), 5);
    assert_eq!(other.watermark(series.id).await.unwrap(), Some(date(2024, 1, 30)));
    assert!(other.find_event_by_id(standalone.id).await.unwrap().is_none());
    assert!(other.list_interest_tags(true).await.unwrap().is_empty());
    let details = other.find_submission(submission.id).await.unwrap().unwrap();
    assert_eq!(details.submission.notes.as_deref(), Some("Call back"));
}

#[tokio::test]
async fn test_existing_occurrence_is_never_rewritten_by_generation() {
    let (repo, _temp_dir) = setup_test_db().await;
    let series = create_2024_series(&repo, "Tuesday Supper", weekly_on(DayOfWeek::Tuesday)).await;

    let definition = SeriesDefinition::try_from(&series).unwrap();
    let planned = plan_occurrences(&definition, DateWindow::new(date(2024, 1, 1), date(2024, 1, 7)))[0];
    let (event, created) = repo.get_or_create_occurrence(&definition, &planned).await.unwrap();
    assert!(created);

    repo.update_event(
        event.id,
        UpdateEventData {
            location_name: Some(Some("Moved".to_string())),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let (again, created) = repo.get_or_create_occurrence(&definition, &planned).await.unwrap();
    assert!(!created);
    assert_eq!(again.id, event.id);
    assert_eq!(again.location_name.as_deref(), Some("Moved"));
}

#[tokio::test]
async fn test_refresh_all_is_idempotent() {
    let (repo, _temp_dir) = setup_test_db().await;
    let now = Utc::now();

    repo.create_series(NewSeriesData {
        title: "Weekly".to_string(),
        start_date: date(2024, 1, 1),
        start_time: six_pm(),
        ..weekly_on(DayOfWeek::Monday)
    })
    .await
    .unwrap();
    create_2024_series(&repo, "Past", weekly_on(DayOfWeek::Monday)).await;

    let summary = repo.refresh_all(now).await.unwrap();
    assert_eq!(summary.series_processed, 2);
    assert_eq!(summary.occurrences_created, 0);

    // A later run extends the window by the days that passed
    let later = repo.refresh_all(now + Duration::days(7)).await.unwrap();
    assert_eq!(later.occurrences_created, 1);
}

#[tokio::test]
async fn test_refresh_all_uses_each_series_local_date() {
    let (repo, _temp_dir) = setup_test_db().await;
    let utc = create_2024_series(&repo, "Greenwich", weekly_on(DayOfWeek::Monday)).await;
    let ahead = repo
        .create_series(NewSeriesData {
            title: "Line Islands".to_string(),
            start_date: date(2024, 1, 1),
            end_date: Some(date(2024, 12, 31)),
            start_time: six_pm(),
            timezone: Some("Pacific/Kiritimati".to_string()),
            ..weekly_on(DayOfWeek::Monday)
        })
        .await
        .unwrap()
        .series;

    // Monday 2024-01-01 in UTC is already Tuesday in UTC+14
    repo.refresh_all(at(2024, 1, 1, 11)).await.unwrap();

    let utc_events = repo.find_events_for_series(utc.id).await.unwrap();
    assert_eq!(utc_events[0].start, at(2024, 1, 1, 18));
    let ahead_events = repo.find_events_for_series(ahead.id).await.unwrap();
    assert_eq!(ahead_events[0].start, at(2024, 1, 8, 4));
}

#[tokio::test]
async fn test_delete_series_cascades_and_removes_orphaned_image() {
    let (repo, _temp_dir) = setup_test_db().await;
    let image = repo
        .add_attachment(NewAttachmentData {
            path: "series/hero.jpg".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let series = create_2024_series(
        &repo,
        "Doomed",
        NewSeriesData {
            image_id: Some(image.id),
            ..weekly_on(DayOfWeek::Friday)
        },
    )
    .await;
    repo.generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 31))
        .await
        .unwrap();

    // Deleting one occurrence leaves the shared image alone
    let events = repo.find_events_for_series(series.id).await.unwrap();
    repo.delete_event(events[0].id).await.unwrap();
    assert!(!repo.is_orphan(image.id).await.unwrap());
    assert!(repo.find_attachment(image.id).await.unwrap().is_some());

    repo.delete_series(series.id).await.unwrap();
    assert!(repo.find_series_by_id(series.id).await.unwrap().is_none());
    assert!(repo.find_events_for_series(series.id).await.unwrap().is_empty());
    assert!(repo.find_attachment(image.id).await.unwrap().is_none());

    assert!(matches!(repo.delete_series(series.id).await, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_standalone_event_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;
    let image = repo
        .add_attachment(NewAttachmentData {
            path: "events/flyer.png".to_string(),
            alt_text: Some("  Flyer ".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(image.alt_text.as_deref(), Some("Flyer"));

    let start = Utc::now() + Duration::days(3);
    let event = repo
        .add_event(NewEventData {
            title: "Game Night".to_string(),
            start,
            image_id: Some(image.id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(event.slug, "game-night");
    assert_eq!(event.status, EventStatus::Draft);
    assert_eq!(event.visibility, EventVisibility::Private);
    assert_eq!(event.timezone, "UTC");

    let twin = repo
        .add_event(NewEventData {
            title: "Game Night".to_string(),
            start: start + Duration::days(7),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(twin.slug, "game-night-2");

    let symbols = repo
        .add_event(NewEventData {
            title: "!!!".to_string(),
            start,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(symbols.slug, "event");

    let renamed = repo
        .update_event(
            twin.id,
            UpdateEventData {
                title: Some("Board Games".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.slug, "board-games");
    assert!(repo.find_event_by_slug("board-games").await.unwrap().is_some());

    let canceled = repo.cancel_event(event.id).await.unwrap();
    assert_eq!(canceled.status, EventStatus::Canceled);

    let short_id = &event.id.to_string()[..8];
    let matches = repo.find_events_by_short_id_prefix(short_id).await.unwrap();
    assert!(matches.iter().any(|e| e.id == event.id));
    let wildcard = format!("{}_", &short_id[..1]);
    assert!(repo.find_events_by_short_id_prefix(&wildcard).await.unwrap().is_empty());
    assert!(repo.find_events_by_short_id_prefix("%%").await.unwrap().is_empty());

    repo.delete_event(event.id).await.unwrap();
    assert!(repo.find_event_by_id(event.id).await.unwrap().is_none());
    assert!(repo.find_attachment(image.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_public_listings() {
    let (repo, _temp_dir) = setup_test_db().await;
    let now = Utc::now();

    repo.add_event(NewEventData {
        title: "Past Talk".to_string(),
        start: now - Duration::days(2),
        ..Default::default()
    })
    .await
    .unwrap();
    let later = repo
        .add_event(NewEventData {
            title: "Later Talk".to_string(),
            start: now + Duration::days(10),
            ..Default::default()
        })
        .await
        .unwrap();
    let sooner = repo
        .add_event(NewEventData {
            title: "Sooner Talk".to_string(),
            start: now + Duration::days(1),
            ..Default::default()
        })
        .await
        .unwrap();

    let recurring = repo
        .create_series(NewSeriesData {
            title: "Weekly Walk".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            ..weekly_on(tomorrow_weekday())
        })
        .await
        .unwrap();
    create_2024_series(&repo, "Finished Series", weekly_on(DayOfWeek::Monday)).await;

    let upcoming = repo.find_upcoming_standalone(now).await.unwrap();
    let ids: Vec<_> = upcoming.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![sooner.id, later.id]);

    let next = repo.find_recurring_next(now).await.unwrap();
    assert_eq!(next.len(), 1);
    let (series, event) = &next[0];
    assert_eq!(series.id, recurring.series.id);
    assert!(event.is_upcoming(now));
    assert_eq!(event.start.date_naive(), now.date_naive() + Duration::days(1));
}

#[tokio::test]
async fn test_category_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    let category = repo.add_category("  Arts & Crafts ".to_string(), None).await.unwrap();
    assert_eq!(category.name, "Arts & Crafts");
    assert_eq!(category.slug, "arts-crafts");

    let duplicate = repo.add_category("Arts & Crafts".to_string(), None).await;
    assert!(matches!(duplicate, Err(CoreError::InvalidInput(_))));

    let series = create_2024_series(
        &repo,
        "Craft Club",
        NewSeriesData {
            category_id: Some(category.id),
            ..weekly_on(DayOfWeek::Saturday)
        },
    )
    .await;
    repo.generate_occurrences(&series, date(2024, 1, 1), date(2024, 1, 14))
        .await
        .unwrap();

    let usage = repo.category_usage(category.id).await.unwrap();
    assert_eq!(usage, CategoryUsage { events: 2, series: 1 });

    repo.delete_category(category.id).await.unwrap();
    let series = repo.find_series_by_id(series.id).await.unwrap().unwrap();
    assert_eq!(series.category_id, None);
    assert!(repo
        .find_events_for_series(series.id)
        .await
        .unwrap()
        .iter()
        .all(|e| e.category_id.is_none()));
}

#[tokio::test]
async fn test_series_validation() {
    let (repo, _temp_dir) = setup_test_db().await;

    let empty_title = repo
        .create_series(NewSeriesData {
            title: "   ".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            ..Default::default()
        })
        .await;
    assert!(matches!(empty_title, Err(CoreError::InvalidInput(_))));

    let bad_timezone = repo
        .create_series(NewSeriesData {
            title: "Somewhere".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            timezone: Some("Nowhere/Special".to_string()),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_timezone, Err(CoreError::InvalidTimezone(_))));

    let backwards = repo
        .create_series(NewSeriesData {
            title: "Backwards".to_string(),
            start_date: date(2024, 2, 1),
            end_date: Some(date(2024, 1, 1)),
            start_time: six_pm(),
            ..Default::default()
        })
        .await;
    assert!(matches!(backwards, Err(CoreError::InvalidInput(_))));

    let missing_category = repo
        .create_series(NewSeriesData {
            title: "Orphan".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            category_id: Some(uuid::Uuid::new_v4()),
            ..Default::default()
        })
        .await;
    assert!(matches!(missing_category, Err(CoreError::NotFound(_))));

    let endless = repo
        .create_series(NewSeriesData {
            title: "Endless".to_string(),
            start_date: date(2024, 1, 1),
            start_time: six_pm(),
            default_duration_minutes: Some(1_000_000_000_000),
            ..weekly_on(DayOfWeek::Monday)
        })
        .await;
    assert!(matches!(endless, Err(CoreError::InvalidInput(_))));

    assert!(repo.list_series().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_interest_intake_workflow() {
    let (repo, _temp_dir) = setup_test_db().await;

    let gardening = repo
        .add_interest_tag("Gardening".to_string(), InterestGroup::Programs)
        .await
        .unwrap();
    let volunteering = repo
        .add_interest_tag("Volunteering".to_string(), InterestGroup::Connect)
        .await
        .unwrap();
    let retired = repo
        .add_interest_tag("Retired Program".to_string(), InterestGroup::Learn)
        .await
        .unwrap();
    repo.set_interest_tag_active(retired.id, false).await.unwrap();

    let active = repo.list_interest_tags(true).await.unwrap();
    let names: Vec<_> = active.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Volunteering", "Gardening"]);
    assert_eq!(repo.list_interest_tags(false).await.unwrap().len(), 3);

    let rejected = repo
        .submit_interest(NewSubmissionData {
            first_name: "Ada".to_string(),
            email: "ada@example.org".to_string(),
            interest_ids: vec![retired.id],
            ..Default::default()
        })
        .await;
    assert!(matches!(rejected, Err(CoreError::InvalidInput(_))));

    let bad_email = repo
        .submit_interest(NewSubmissionData {
            first_name: "Ada".to_string(),
            email: "not-an-email".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad_email, Err(CoreError::InvalidInput(_))));

    let first = repo
        .submit_interest(NewSubmissionData {
            first_name: "  Ada ".to_string(),
            last_name: Some("Lovelace".to_string()),
            email: " ada@example.org ".to_string(),
            interest_ids: vec![gardening.id, volunteering.id, gardening.id],
            message: Some("  Happy to help  ".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first.full_name(), "Ada Lovelace");
    assert_eq!(first.email, "ada@example.org");
    assert_eq!(first.message.as_deref(), Some("Happy to help"));

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = repo
        .submit_interest(NewSubmissionData {
            first_name: "Grace".to_string(),
            email: "grace@example.org".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let inbox = repo.list_submissions().await.unwrap();
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].submission.id, second.id);
    assert_eq!(inbox[0].interests_display(), "None selected");
    assert_eq!(inbox[1].interests, vec!["Connect: Volunteering", "Programs: Gardening"]);

    let contacted_at = at(2024, 5, 1, 12);
    assert_eq!(repo.mark_contacted(first.id, contacted_at).await.unwrap(), ContactOutcome::Marked);
    assert_eq!(
        repo.mark_contacted(first.id, contacted_at + Duration::days(1)).await.unwrap(),
        ContactOutcome::AlreadyContacted
    );

    let updated = repo
        .update_submission_notes(first.id, Some("Called back".to_string()))
        .await
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("Called back"));

    let details = repo.find_submission(first.id).await.unwrap().unwrap();
    assert!(details.submission.contacted);
    assert_eq!(details.submission.contacted_at, Some(contacted_at));

    assert!(matches!(
        repo.mark_contacted(uuid::Uuid::new_v4(), contacted_at).await,
        Err(CoreError::NotFound(_))
    ));
}
