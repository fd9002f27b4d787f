//! Manual duplicate review with auto-confirm countdowns
//!
//! Every comparison item that enters a review session gets an [`Annotation`]
//! with its own countdown. Each tick decrements every still-pending countdown
//! by one; at zero the annotation is auto-confirmed on behalf of the system
//! actor. A manual verdict on a pending item stops its countdown. Resolution
//! happens exactly once and only from `pending`.

mod scheduler;

pub use scheduler::{run_countdown, CountdownStats};

use crate::error::{HazardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const DEFAULT_AUTO_CONFIRM_TICKS: u32 = 60;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const SYSTEM_ACTOR: &str = "System";

/// Review status of one comparison item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    Pending,
    Duplicate,
    NotDuplicate,
    AutoConfirmed,
}

impl AnnotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Duplicate => "duplicate",
            Self::NotDuplicate => "not_duplicate",
            Self::AutoConfirmed => "auto_confirmed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self != Self::Pending
    }
}

impl std::fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reviewer's manual decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Duplicate,
    NotDuplicate,
}

impl From<Verdict> for AnnotationStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Duplicate => AnnotationStatus::Duplicate,
            Verdict::NotDuplicate => AnnotationStatus::NotDuplicate,
        }
    }
}

/// Review state of one comparison item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub report_id: String,
    pub status: AnnotationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Ticks left before auto-confirmation
    pub remaining: u32,
}

impl Annotation {
    pub fn pending(report_id: impl Into<String>, countdown: u32) -> Self {
        Self {
            report_id: report_id.into(),
            status: AnnotationStatus::Pending,
            note: None,
            confirmed_by: None,
            confirmed_at: None,
            remaining: countdown,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == AnnotationStatus::Pending
    }

    /// State after `ticks` elapsed ticks
    ///
    /// Resolved annotations are returned unchanged. The countdown stops at zero.
    pub fn advanced(&self, ticks: u32, actor: &str, now: DateTime<Utc>) -> Annotation {
        if !self.is_pending() || ticks == 0 {
            return self.clone();
        }

        let remaining = self.remaining.saturating_sub(ticks);
        if remaining > 0 {
            return Annotation {
                remaining,
                ..self.clone()
            };
        }

        Annotation {
            status: AnnotationStatus::AutoConfirmed,
            confirmed_by: Some(actor.to_string()),
            confirmed_at: Some(now),
            remaining: 0,
            ..self.clone()
        }
    }

    /// State after a manual verdict
    ///
    /// `NotDuplicate` requires a non-blank note. Resolving twice is a bug in
    /// the caller and panics in debug builds.
    pub fn resolved(
        &self,
        verdict: Verdict,
        actor: &str,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Annotation> {
        if !self.is_pending() {
            debug_assert!(
                false,
                "annotation for {} already resolved as {}",
                self.report_id, self.status
            );
            return Err(HazardError::AlreadyResolved {
                id: self.report_id.clone(),
                status: self.status,
            });
        }

        let note = note.map(str::trim).filter(|n| !n.is_empty());
        if verdict == Verdict::NotDuplicate && note.is_none() {
            return Err(HazardError::MissingJustification {
                id: self.report_id.clone(),
            });
        }

        Ok(Annotation {
            status: verdict.into(),
            note: note.map(String::from),
            confirmed_by: Some(actor.to_string()),
            confirmed_at: Some(now),
            ..self.clone()
        })
    }
}

/// Countdown settings for a review session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSettings {
    pub auto_confirm_ticks: u32,
    pub system_actor: String,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            auto_confirm_ticks: DEFAULT_AUTO_CONFIRM_TICKS,
            system_actor: SYSTEM_ACTOR.to_string(),
        }
    }
}

/// Tally of a finished review session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSummary {
    pub session_id: Uuid,
    pub cluster_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub duplicate: usize,
    pub not_duplicate: usize,
    pub auto_confirmed: usize,
    pub pending: usize,
}

/// All annotations for one cluster review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewSession {
    pub id: Uuid,
    pub cluster_id: Option<String>,
    pub started_at: DateTime<Utc>,
    settings: ReviewSettings,
    annotations: Vec<Annotation>,
}

impl ReviewSession {
    pub fn new(cluster_id: Option<String>, settings: ReviewSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            cluster_id,
            started_at: Utc::now(),
            settings,
            annotations: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ReviewSettings {
        &self.settings
    }

    /// Add a comparison item to the review list with a fresh countdown
    ///
    /// Returns false if the report is already in the list.
    pub fn enqueue(&mut self, report_id: impl Into<String>) -> bool {
        let report_id = report_id.into();
        if self.position(&report_id).is_some() {
            tracing::debug!("Report {} is already under review", report_id);
            return false;
        }

        self.annotations.push(Annotation::pending(
            report_id,
            self.settings.auto_confirm_ticks,
        ));
        true
    }

    pub fn get(&self, report_id: &str) -> Option<&Annotation> {
        self.position(report_id).map(|idx| &self.annotations[idx])
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn pending(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(|a| a.is_pending())
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// True once nothing is left pending
    pub fn is_settled(&self) -> bool {
        self.pending_count() == 0
    }

    /// Owned copy of every annotation
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    /// Record a manual verdict, cancelling the item's countdown
    ///
    /// On rejection the annotation is left untouched.
    pub fn confirm(
        &mut self,
        report_id: &str,
        verdict: Verdict,
        actor: &str,
        note: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<&Annotation> {
        let idx = self
            .position(report_id)
            .ok_or_else(|| HazardError::AnnotationNotFound {
                id: report_id.to_string(),
            })?;

        let next = self.annotations[idx].resolved(verdict, actor, note, now)?;
        tracing::info!(
            "Report {} marked {} by {} with {} tick(s) left",
            report_id,
            next.status,
            actor,
            next.remaining
        );
        self.annotations[idx] = next;
        Ok(&self.annotations[idx])
    }

    /// Advance every pending countdown by one tick
    ///
    /// Returns the ids auto-confirmed by this tick.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<String> {
        self.advance(1, now)
    }

    /// Advance every pending countdown by `ticks` in one turn
    pub fn advance(&mut self, ticks: u32, now: DateTime<Utc>) -> Vec<String> {
        let actor = self.settings.system_actor.clone();
        let mut confirmed = Vec::new();

        for annotation in self.annotations.iter_mut().filter(|a| a.is_pending()) {
            *annotation = annotation.advanced(ticks, &actor, now);
            if annotation.status == AnnotationStatus::AutoConfirmed {
                tracing::info!("Report {} auto-confirmed by {}", annotation.report_id, actor);
                confirmed.push(annotation.report_id.clone());
            }
        }

        tracing::trace!(
            "Advanced {} tick(s), {} still pending",
            ticks,
            self.pending_count()
        );
        confirmed
    }

    /// End the session and tally the outcome
    pub fn finish(self) -> ReviewSummary {
        let count = |status: AnnotationStatus| {
            self.annotations
                .iter()
                .filter(|a| a.status == status)
                .count()
        };

        ReviewSummary {
            session_id: self.id,
            cluster_id: self.cluster_id.clone(),
            started_at: self.started_at,
            total: self.annotations.len(),
            duplicate: count(AnnotationStatus::Duplicate),
            not_duplicate: count(AnnotationStatus::NotDuplicate),
            auto_confirmed: count(AnnotationStatus::AutoConfirmed),
            pending: count(AnnotationStatus::Pending),
        }
    }

    fn position(&self, report_id: &str) -> Option<usize> {
        self.annotations
            .iter()
            .position(|a| a.report_id == report_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(ids: &[&str]) -> ReviewSession {
        let mut s = ReviewSession::new(Some("C-1".to_string()), ReviewSettings::default());
        for id in ids {
            s.enqueue(*id);
        }
        s
    }

    #[test]
    fn test_auto_confirm_after_exactly_sixty_ticks() {
        let mut s = session(&["HR-1"]);
        let now = Utc::now();

        for _ in 0..59 {
            assert!(s.tick(now).is_empty());
        }
        assert_eq!(s.get("HR-1").unwrap().remaining, 1);

        assert_eq!(s.tick(now), vec!["HR-1".to_string()]);
        let a = s.get("HR-1").unwrap();
        assert_eq!(a.status, AnnotationStatus::AutoConfirmed);
        assert_eq!(a.confirmed_by.as_deref(), Some("System"));
        assert_eq!(a.remaining, 0);

        // never negative, never re-triggered
        assert!(s.tick(now).is_empty());
        assert_eq!(s.get("HR-1").unwrap().remaining, 0);
    }

    #[test]
    fn test_manual_confirm_stops_countdown() {
        let mut s = session(&["HR-1"]);
        let now = Utc::now();
        s.advance(30, now);

        s.confirm("HR-1", Verdict::Duplicate, "alice", None, now).unwrap();
        s.advance(100, now);

        let a = s.get("HR-1").unwrap();
        assert_eq!(a.status, AnnotationStatus::Duplicate);
        assert_eq!(a.remaining, 30);
        assert_eq!(a.confirmed_by.as_deref(), Some("alice"));
    }

    #[test]
    fn test_not_duplicate_requires_note() {
        let mut s = session(&["HR-1"]);
        let now = Utc::now();

        let err = s
            .confirm("HR-1", Verdict::NotDuplicate, "alice", Some("   "), now)
            .unwrap_err();
        assert!(matches!(err, HazardError::MissingJustification { .. }));
        assert!(s.get("HR-1").unwrap().is_pending());

        let a = s
            .confirm("HR-1", Verdict::NotDuplicate, "alice", Some("different bench"), now)
            .unwrap();
        assert_eq!(a.status, AnnotationStatus::NotDuplicate);
        assert_eq!(a.note.as_deref(), Some("different bench"));
    }

    #[test]
    fn test_countdowns_are_independent() {
        let mut s = session(&["HR-1", "HR-2"]);
        let now = Utc::now();
        s.advance(10, now);
        s.enqueue("HR-3");
        s.confirm("HR-1", Verdict::Duplicate, "alice", None, now).unwrap();

        let confirmed = s.advance(50, now);
        assert_eq!(confirmed, vec!["HR-2".to_string()]);
        assert_eq!(s.get("HR-3").unwrap().remaining, 10);
    }

    #[test]
    fn test_unknown_annotation() {
        let mut s = session(&[]);
        let err = s
            .confirm("HR-9", Verdict::Duplicate, "alice", None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, HazardError::AnnotationNotFound { .. }));
    }

    #[test]
    fn test_enqueue_is_idempotent() {
        let mut s = session(&["HR-1"]);
        assert!(!s.enqueue("HR-1"));
        assert_eq!(s.annotations().len(), 1);
    }

    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "already resolved"))]
    fn test_double_resolution_fails_loudly() {
        let mut s = session(&["HR-1"]);
        let now = Utc::now();
        s.advance(60, now);
        let err = s
            .confirm("HR-1", Verdict::Duplicate, "alice", None, now)
            .unwrap_err();
        assert!(matches!(err, HazardError::AlreadyResolved { .. }));
    }

    #[test]
    fn test_finish_summary() {
        let mut s = session(&["HR-1", "HR-2", "HR-3"]);
        let now = Utc::now();
        s.confirm("HR-1", Verdict::Duplicate, "alice", None, now).unwrap();
        s.confirm("HR-2", Verdict::NotDuplicate, "alice", Some("other site"), now)
            .unwrap();

        let summary = s.finish();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.duplicate, 1);
        assert_eq!(summary.not_duplicate, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.cluster_id.as_deref(), Some("C-1"));
    }
}
