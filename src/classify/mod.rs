//! Duplicate likelihood tiers
//!
//! Two independent schemes coexist:
//! - per report, four tiers cut at 0.85 / 0.75 / 0.70
//! - per cluster, three tiers cut at 0.75 / 0.50
//!
//! Each bucket is closed below and open above; the top bucket has no upper bound.
//! An absent score is never given a default tier.

use crate::model::{Cluster, Report};
use serde::{Deserialize, Serialize};

pub const REPORT_STRONG_THRESHOLD: f64 = 0.85;
pub const REPORT_POSSIBLE_THRESHOLD: f64 = 0.75;
pub const REPORT_LOW_THRESHOLD: f64 = 0.70;

pub const CLUSTER_STRONG_THRESHOLD: f64 = 0.75;
pub const CLUSTER_POSSIBLE_THRESHOLD: f64 = 0.50;

/// Per-report duplicate tier, ordered from least to most likely duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTier {
    NotDuplicate,
    LowSimilarity,
    PossibleDuplicate,
    StrongDuplicate,
}

impl DuplicateTier {
    pub const ALL: [DuplicateTier; 4] = [
        DuplicateTier::StrongDuplicate,
        DuplicateTier::PossibleDuplicate,
        DuplicateTier::LowSimilarity,
        DuplicateTier::NotDuplicate,
    ];

    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongDuplicate => "Strong duplicate",
            Self::PossibleDuplicate => "Possible duplicate",
            Self::LowSimilarity => "Low similarity",
            Self::NotDuplicate => "Not duplicate",
        }
    }

    /// Parse a snake_case tier name such as `strong_duplicate`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "strong_duplicate" | "strong" => Some(Self::StrongDuplicate),
            "possible_duplicate" | "possible" => Some(Self::PossibleDuplicate),
            "low_similarity" | "low" => Some(Self::LowSimilarity),
            "not_duplicate" | "none" => Some(Self::NotDuplicate),
            _ => None,
        }
    }
}

impl std::fmt::Display for DuplicateTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-cluster duplicate tier (coarser than [`DuplicateTier`])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterTier {
    NotDuplicate,
    PossibleDuplicate,
    StrongDuplicate,
}

impl ClusterTier {
    pub const ALL: [ClusterTier; 3] = [
        ClusterTier::StrongDuplicate,
        ClusterTier::PossibleDuplicate,
        ClusterTier::NotDuplicate,
    ];

    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::StrongDuplicate => "Strong duplicate",
            Self::PossibleDuplicate => "Possible duplicate",
            Self::NotDuplicate => "Not duplicate",
        }
    }
}

impl std::fmt::Display for ClusterTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cut points for the per-report scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportThresholds {
    pub strong: f64,
    pub possible: f64,
    pub low: f64,
}

impl Default for ReportThresholds {
    fn default() -> Self {
        Self {
            strong: REPORT_STRONG_THRESHOLD,
            possible: REPORT_POSSIBLE_THRESHOLD,
            low: REPORT_LOW_THRESHOLD,
        }
    }
}

/// Cut points for the per-cluster scheme
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterThresholds {
    pub strong: f64,
    pub possible: f64,
}

impl Default for ClusterThresholds {
    fn default() -> Self {
        Self {
            strong: CLUSTER_STRONG_THRESHOLD,
            possible: CLUSTER_POSSIBLE_THRESHOLD,
        }
    }
}

/// Maps overall similarity scores onto duplicate tiers
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DuplicateClassifier {
    report: ReportThresholds,
    cluster: ClusterThresholds,
}

impl DuplicateClassifier {
    pub fn new(report: ReportThresholds, cluster: ClusterThresholds) -> Self {
        Self { report, cluster }
    }

    pub fn report_thresholds(&self) -> &ReportThresholds {
        &self.report
    }

    pub fn cluster_thresholds(&self) -> &ClusterThresholds {
        &self.cluster
    }

    /// Four-way tier for a report's overall score
    ///
    /// Returns `None` while the score is absent (or NaN): the report is not yet classifiable.
    pub fn classify(&self, overall: Option<f64>) -> Option<DuplicateTier> {
        let score = usable(overall)?;
        let t = &self.report;

        let tier = if score >= t.strong {
            DuplicateTier::StrongDuplicate
        } else if score >= t.possible {
            DuplicateTier::PossibleDuplicate
        } else if score >= t.low {
            DuplicateTier::LowSimilarity
        } else {
            DuplicateTier::NotDuplicate
        };
        Some(tier)
    }

    /// Three-way tier for a cluster's overall score
    pub fn classify_cluster_score(&self, overall: Option<f64>) -> Option<ClusterTier> {
        let score = usable(overall)?;
        let t = &self.cluster;

        let tier = if score >= t.strong {
            ClusterTier::StrongDuplicate
        } else if score >= t.possible {
            ClusterTier::PossibleDuplicate
        } else {
            ClusterTier::NotDuplicate
        };
        Some(tier)
    }

    pub fn classify_report(&self, report: &Report) -> Option<DuplicateTier> {
        self.classify(report.scores.overall)
    }

    pub fn classify_cluster(&self, cluster: &Cluster) -> Option<ClusterTier> {
        self.classify_cluster_score(Some(cluster.overall))
    }
}

fn usable(score: Option<f64>) -> Option<f64> {
    match score {
        Some(v) if v.is_nan() => {
            tracing::warn!("Ignoring NaN similarity score");
            None
        }
        other => other,
    }
}
