// Integration tests for review sessions and the countdown driver
use chrono::Utc;
use hazardwatch::config::Config;
use hazardwatch::review::{
    run_countdown, Annotation, AnnotationStatus, ReviewSession, ReviewSettings, Verdict,
    SYSTEM_ACTOR,
};
use hazardwatch::HazardError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time;

fn session_with(ids: &[&str], ticks: u32) -> ReviewSession {
    let mut session = ReviewSession::new(
        Some("SEM-01".to_string()),
        ReviewSettings {
            auto_confirm_ticks: ticks,
            ..Default::default()
        },
    );
    for id in ids {
        assert!(session.enqueue(*id));
    }
    session
}

#[test]
fn test_full_review_lifecycle() {
    let mut session = session_with(&["HR-1", "HR-2", "HR-3"], 60);
    let now = Utc::now();

    session.advance(10, now);
    session
        .confirm("HR-1", Verdict::Duplicate, "alice", None, now)
        .unwrap();
    session
        .confirm(
            "HR-2",
            Verdict::NotDuplicate,
            "bob",
            Some("different bench, different hazard"),
            now,
        )
        .unwrap();

    let confirmed = session.advance(50, now);
    assert_eq!(confirmed, vec!["HR-3".to_string()]);
    assert!(session.is_settled());

    let hr2 = session.get("HR-2").unwrap();
    assert_eq!(hr2.note.as_deref(), Some("different bench, different hazard"));
    assert_eq!(hr2.remaining, 50);

    let hr3 = session.get("HR-3").unwrap();
    assert_eq!(hr3.confirmed_by.as_deref(), Some(SYSTEM_ACTOR));

    let summary = session.finish();
    assert_eq!(summary.cluster_id.as_deref(), Some("SEM-01"));
    assert_eq!(summary.total, 3);
    assert_eq!(summary.duplicate, 1);
    assert_eq!(summary.not_duplicate, 1);
    assert_eq!(summary.auto_confirmed, 1);
    assert_eq!(summary.pending, 0);
}

#[test]
fn test_rejected_verdict_leaves_annotation_untouched() {
    let mut session = session_with(&["HR-1"], 60);
    let now = Utc::now();
    session.advance(5, now);

    let err = session
        .confirm("HR-1", Verdict::NotDuplicate, "alice", Some("   "), now)
        .unwrap_err();
    assert!(matches!(err, HazardError::MissingJustification { .. }));

    let annotation = session.get("HR-1").unwrap();
    assert!(annotation.is_pending());
    assert_eq!(annotation.remaining, 55);
}

#[test]
fn test_pure_advance_matches_session_ticks() {
    let now = Utc::now();
    let start = Annotation::pending("HR-9", 60);

    let stepped = (0..60).fold(start.clone(), |a, _| a.advanced(1, SYSTEM_ACTOR, now));
    let jumped = start.advanced(60, SYSTEM_ACTOR, now);
    let overshoot = start.advanced(500, SYSTEM_ACTOR, now);

    assert_eq!(stepped, jumped);
    assert_eq!(jumped, overshoot);
    assert_eq!(jumped.status, AnnotationStatus::AutoConfirmed);
    assert_eq!(jumped.remaining, 0);

    let almost = start.advanced(59, SYSTEM_ACTOR, now);
    assert!(almost.is_pending());
    assert_eq!(almost.remaining, 1);
}

#[test]
fn test_settings_from_config() {
    let mut config = Config::default();
    config.review.auto_confirm_ticks = 3;
    config.review.system_actor = "Auto".to_string();

    let mut session = ReviewSession::new(None, config.review.settings());
    session.enqueue("HR-1");
    session.advance(3, Utc::now());

    let annotation = session.get("HR-1").unwrap();
    assert_eq!(annotation.status, AnnotationStatus::AutoConfirmed);
    assert_eq!(annotation.confirmed_by.as_deref(), Some("Auto"));
}

#[tokio::test(start_paused = true)]
async fn test_late_item_gets_its_own_countdown() {
    let shared = Arc::new(Mutex::new(session_with(&["HR-1"], 10)));
    let (_tx, rx) = watch::channel(false);

    let driver = tokio::spawn(run_countdown(shared.clone(), Duration::from_secs(1), rx));

    time::sleep(Duration::from_millis(4_500)).await;
    shared.lock().unwrap().enqueue("HR-2");

    let stats = driver.await.unwrap();
    // HR-2 joined after 4 ticks and needs 10 of its own
    assert_eq!(stats.ticks, 14);
    assert_eq!(stats.auto_confirmed, 2);

    let session = shared.lock().unwrap();
    assert!(session.is_settled());
}

#[tokio::test(start_paused = true)]
async fn test_configured_interval_drives_countdown() {
    let mut config = Config::default();
    config.review.auto_confirm_ticks = 4;
    config.review.tick_interval = "250ms".to_string();

    let mut session = ReviewSession::new(None, config.review.settings());
    session.enqueue("HR-1");
    let shared = Arc::new(Mutex::new(session));
    let (_tx, rx) = watch::channel(false);

    let started = time::Instant::now();
    let stats = run_countdown(shared, config.review.tick_duration().unwrap(), rx).await;

    assert_eq!(stats.ticks, 4);
    assert_eq!(started.elapsed(), Duration::from_secs(1));
}
