//! Composite orderings for report lists
//!
//! All comparators are total and every sort is stable, so equal keys keep
//! their input order.

use crate::model::{Report, ScoreComponent};
use crate::stage::{PipelinePhase, StageDeriver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort bucket for a phase: in-flight first, then queued, completed, failed
pub fn phase_bucket(phase: PipelinePhase) -> u8 {
    match phase {
        PipelinePhase::AnalyzingGeo
        | PipelinePhase::AnalyzingLexical
        | PipelinePhase::AnalyzingSemantic
        | PipelinePhase::Aggregating => 0,
        PipelinePhase::Queued => 1,
        PipelinePhase::Completed => 2,
        PipelinePhase::Failed => 3,
    }
}

/// Timestamp used for ordering; reports without one sort as the Unix epoch
pub fn effective_timestamp(report: &Report) -> DateTime<Utc> {
    report.timestamp.unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// How a report list should be ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "by", content = "key")]
pub enum SortOrder {
    /// Phase bucket ascending, then newest first
    #[default]
    Priority,
    /// Timestamp only
    Recency(SortDirection),
    /// One component score, highest first; missing scores count as 0
    Score(ScoreComponent),
}

pub fn compare_priority(a: &Report, b: &Report) -> Ordering {
    let bucket_a = phase_bucket(StageDeriver::derive(a).phase);
    let bucket_b = phase_bucket(StageDeriver::derive(b).phase);

    bucket_a
        .cmp(&bucket_b)
        .then_with(|| effective_timestamp(b).cmp(&effective_timestamp(a)))
}

pub fn compare_recency(a: &Report, b: &Report, direction: SortDirection) -> Ordering {
    let ordering = effective_timestamp(a).cmp(&effective_timestamp(b));
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

pub fn compare_score(a: &Report, b: &Report, component: ScoreComponent) -> Ordering {
    let score_a = a.scores.component(component).unwrap_or(0.0);
    let score_b = b.scores.component(component).unwrap_or(0.0);
    score_b.total_cmp(&score_a)
}

impl SortOrder {
    pub fn compare(&self, a: &Report, b: &Report) -> Ordering {
        match self {
            SortOrder::Priority => compare_priority(a, b),
            SortOrder::Recency(direction) => compare_recency(a, b, *direction),
            SortOrder::Score(component) => compare_score(a, b, *component),
        }
    }

    /// Sort in place
    pub fn sort(&self, reports: &mut [Report]) {
        if *self == SortOrder::Priority {
            // Derive each phase once instead of on every comparison
            reports.sort_by_cached_key(|r| {
                (
                    phase_bucket(StageDeriver::derive(r).phase),
                    std::cmp::Reverse(effective_timestamp(r)),
                )
            });
        } else {
            reports.sort_by(|a, b| self.compare(a, b));
        }
    }

    /// Sort a list of borrowed reports
    pub fn sort_refs(&self, reports: &mut [&Report]) {
        reports.sort_by(|a, b| self.compare(a, b));
    }

    /// Parse a command-line name: priority, newest, oldest, geo, lexical, semantic, rule_based
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "priority" => Some(Self::Priority),
            "newest" | "recent" => Some(Self::Recency(SortDirection::Descending)),
            "oldest" => Some(Self::Recency(SortDirection::Ascending)),
            "geo" => Some(Self::Score(ScoreComponent::Geo)),
            "lexical" => Some(Self::Score(ScoreComponent::Lexical)),
            "semantic" => Some(Self::Score(ScoreComponent::Semantic)),
            "rule_based" | "rule-based" => Some(Self::Score(ScoreComponent::RuleBased)),
            _ => None,
        }
    }
}
