// Cooperative tick driver for review countdowns

use crate::review::ReviewSession;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

/// What a countdown run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountdownStats {
    /// Ticks applied to the session
    pub ticks: u64,
    /// Annotations auto-confirmed during the run
    pub auto_confirmed: usize,
    /// True if the run ended because of the shutdown signal
    pub interrupted: bool,
}

/// Drive a session's countdowns once per `tick_interval`
///
/// All pending annotations are advanced under one lock per tick, so no two
/// ticks for the same annotation interleave with each other or with a manual
/// confirmation. Returns once nothing is pending or `shutdown` turns true.
pub async fn run_countdown(
    session: Arc<Mutex<ReviewSession>>,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> CountdownStats {
    let mut stats = CountdownStats::default();

    if lock(&session).is_settled() {
        return stats;
    }

    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; countdowns start one interval later
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (confirmed, settled) = {
                    let mut guard = lock(&session);
                    let confirmed = guard.tick(Utc::now());
                    (confirmed, guard.is_settled())
                };

                stats.ticks += 1;
                stats.auto_confirmed += confirmed.len();

                if settled {
                    tracing::debug!("Review countdown settled after {} tick(s)", stats.ticks);
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    tracing::info!("Review countdown stopped after {} tick(s)", stats.ticks);
                    stats.interrupted = true;
                    break;
                }
            }
        }
    }

    stats
}

fn lock(session: &Mutex<ReviewSession>) -> std::sync::MutexGuard<'_, ReviewSession> {
    // A panic while holding the lock leaves the annotations themselves consistent
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{AnnotationStatus, ReviewSettings, Verdict};

    fn shared(ids: &[&str], ticks: u32) -> Arc<Mutex<ReviewSession>> {
        let settings = ReviewSettings {
            auto_confirm_ticks: ticks,
            ..Default::default()
        };
        let mut session = ReviewSession::new(None, settings);
        for id in ids {
            session.enqueue(*id);
        }
        Arc::new(Mutex::new(session))
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_until_settled() {
        let session = shared(&["HR-1", "HR-2"], 60);
        let (_tx, rx) = watch::channel(false);

        let stats = run_countdown(session.clone(), Duration::from_secs(1), rx).await;

        assert_eq!(stats.ticks, 60);
        assert_eq!(stats.auto_confirmed, 2);
        assert!(!stats.interrupted);
        assert!(session.lock().unwrap().is_settled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_confirm_mid_countdown() {
        let session = shared(&["HR-1", "HR-2"], 60);
        let (_tx, rx) = watch::channel(false);

        let driver = tokio::spawn(run_countdown(session.clone(), Duration::from_secs(1), rx));

        time::sleep(Duration::from_millis(30_500)).await;
        {
            let mut guard = session.lock().unwrap();
            assert_eq!(guard.get("HR-1").unwrap().remaining, 30);
            guard
                .confirm("HR-1", Verdict::Duplicate, "alice", None, Utc::now())
                .unwrap();
        }

        let stats = driver.await.unwrap();
        assert_eq!(stats.ticks, 60);
        assert_eq!(stats.auto_confirmed, 1);

        let guard = session.lock().unwrap();
        assert_eq!(guard.get("HR-1").unwrap().status, AnnotationStatus::Duplicate);
        assert_eq!(guard.get("HR-1").unwrap().remaining, 30);
        assert_eq!(
            guard.get("HR-2").unwrap().status,
            AnnotationStatus::AutoConfirmed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts() {
        let session = shared(&["HR-1"], 60);
        let (tx, rx) = watch::channel(false);

        let driver = tokio::spawn(run_countdown(session.clone(), Duration::from_secs(1), rx));
        time::sleep(Duration::from_millis(5_500)).await;
        tx.send(true).unwrap();

        let stats = driver.await.unwrap();
        assert!(stats.interrupted);
        assert_eq!(stats.ticks, 5);
        assert!(session.lock().unwrap().get("HR-1").unwrap().is_pending());
    }

    #[tokio::test]
    async fn test_settled_session_returns_immediately() {
        let session = shared(&[], 60);
        let (_tx, rx) = watch::channel(false);
        let stats = run_countdown(session, Duration::from_secs(3600), rx).await;
        assert_eq!(stats, CountdownStats::default());
    }
}
