//! Read-only projections of the externally supplied report and cluster data
//!
//! Reports and clusters are owned by the data source. Nothing in this crate
//! mutates them; phases and tiers are derived on demand.

use crate::error::{HazardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// One of the four component scores produced by the analysis pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreComponent {
    RuleBased,
    Geo,
    Lexical,
    Semantic,
}

impl ScoreComponent {
    pub const ALL: [ScoreComponent; 4] = [
        ScoreComponent::RuleBased,
        ScoreComponent::Geo,
        ScoreComponent::Lexical,
        ScoreComponent::Semantic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBased => "rule_based",
            Self::Geo => "geo",
            Self::Lexical => "lexical",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for ScoreComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which scores of a [`ScoreSet`] are populated, as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScorePresence(u8);

impl ScorePresence {
    pub const GEO: u8 = 1 << 0;
    pub const LEXICAL: u8 = 1 << 1;
    pub const SEMANTIC: u8 = 1 << 2;
    pub const RULE_BASED: u8 = 1 << 3;
    pub const OVERALL: u8 = 1 << 4;

    /// Every component score (not `overall`)
    pub const COMPONENTS: u8 = Self::GEO | Self::LEXICAL | Self::SEMANTIC | Self::RULE_BASED;

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn has(&self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    pub fn has_any(&self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn all_components(&self) -> bool {
        self.has(Self::COMPONENTS)
    }

    /// Same mask with `overall` masked out
    pub fn without_overall(&self) -> Self {
        Self(self.0 & !Self::OVERALL)
    }
}

/// Partially or fully populated similarity scores for a report, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<f64>,
    #[serde(default, alias = "ruleBased", skip_serializing_if = "Option::is_none")]
    pub rule_based: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<f64>,
}

impl ScoreSet {
    /// Fully computed score set
    pub fn complete(overall: f64, rule_based: f64, geo: f64, lexical: f64, semantic: f64) -> Self {
        Self {
            overall: Some(overall),
            rule_based: Some(rule_based),
            geo: Some(geo),
            lexical: Some(lexical),
            semantic: Some(semantic),
        }
    }

    pub fn component(&self, component: ScoreComponent) -> Option<f64> {
        match component {
            ScoreComponent::RuleBased => self.rule_based,
            ScoreComponent::Geo => self.geo,
            ScoreComponent::Lexical => self.lexical,
            ScoreComponent::Semantic => self.semantic,
        }
    }

    pub fn presence(&self) -> ScorePresence {
        let mut bits = 0;
        if self.geo.is_some() {
            bits |= ScorePresence::GEO;
        }
        if self.lexical.is_some() {
            bits |= ScorePresence::LEXICAL;
        }
        if self.semantic.is_some() {
            bits |= ScorePresence::SEMANTIC;
        }
        if self.rule_based.is_some() {
            bits |= ScorePresence::RULE_BASED;
        }
        if self.overall.is_some() {
            bits |= ScorePresence::OVERALL;
        }
        ScorePresence(bits)
    }

    /// Arithmetic mean of geo, lexical and semantic, if all three are present
    pub fn similarity_mean(&self) -> Option<f64> {
        match (self.geo, self.lexical, self.semantic) {
            (Some(g), Some(l), Some(s)) => Some((g + l + s) / 3.0),
            _ => None,
        }
    }

    /// Names of populated scores that are NaN or outside [0, 1]
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let fields = [
            ("overall", self.overall),
            ("rule_based", self.rule_based),
            ("geo", self.geo),
            ("lexical", self.lexical),
            ("semantic", self.semantic),
        ];

        fields
            .into_iter()
            .filter_map(|(name, value)| match value {
                Some(v) if !(0.0..=1.0).contains(&v) => Some(name),
                _ => None,
            })
            .collect()
    }
}

/// Geo, lexical and semantic cluster membership of a report or cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexical: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic: Option<String>,
}

/// A hazard report as supplied by the data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Globally unique report identifier
    pub id: String,
    pub site: String,
    pub location: String,
    #[serde(alias = "detailLocation")]
    pub detail_location: String,
    #[serde(default)]
    pub description: String,
    /// When the report was filed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scores: ScoreSet,
    /// Externally supplied failure marker
    #[serde(default)]
    pub failed: bool,
    /// Externally supplied "analysis has begun" flag
    #[serde(default, alias = "processingStarted")]
    pub processing_started: bool,
    #[serde(default)]
    pub clusters: ClusterAssignment,
}

impl Report {
    pub fn new(
        id: impl Into<String>,
        site: impl Into<String>,
        location: impl Into<String>,
        detail_location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            site: site.into(),
            location: location.into(),
            detail_location: detail_location.into(),
            description: String::new(),
            timestamp: None,
            scores: ScoreSet::default(),
            failed: false,
            processing_started: false,
            clusters: ClusterAssignment::default(),
        }
    }

    pub fn with_scores(mut self, scores: ScoreSet) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_clusters(mut self, clusters: ClusterAssignment) -> Self {
        self.clusters = clusters;
        self
    }

    pub fn started(mut self) -> Self {
        self.processing_started = true;
        self
    }

    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }

    /// True when any of the geo, lexical or semantic assignments is `cluster_id`
    pub fn in_cluster(&self, cluster_id: &str) -> bool {
        [
            &self.clusters.geo,
            &self.clusters.lexical,
            &self.clusters.semantic,
        ]
        .iter()
        .any(|id| id.as_deref() == Some(cluster_id))
    }
}

/// Named sub-scores explaining a cluster's overall similarity
///
/// Each value is independent; they are not required to sum to anything.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentBreakdown {
    pub site_match: f64,
    pub location_match: f64,
    pub detail_location_match: f64,
    pub geo_proximity: f64,
    pub temporal_proximity: f64,
    pub lexical_overlap: f64,
    pub semantic_similarity: f64,
    pub rule_based: f64,
}

impl ComponentBreakdown {
    /// (name, value) pairs in display order
    pub fn entries(&self) -> [(&'static str, f64); 8] {
        [
            ("site_match", self.site_match),
            ("location_match", self.location_match),
            ("detail_location_match", self.detail_location_match),
            ("geo_proximity", self.geo_proximity),
            ("temporal_proximity", self.temporal_proximity),
            ("lexical_overlap", self.lexical_overlap),
            ("semantic_similarity", self.semantic_similarity),
            ("rule_based", self.rule_based),
        ]
    }
}

/// A group of reports suspected to describe the same hazard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(alias = "memberCount")]
    pub member_count: usize,
    pub overall: f64,
    #[serde(default)]
    pub components: ComponentBreakdown,
    /// Position of this cluster within the cluster filter chain
    #[serde(default)]
    pub assignment: ClusterAssignment,
}

/// Reports and clusters loaded from the external data source
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl Dataset {
    /// Load a dataset from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HazardError::Io {
            source: e,
            context: format!("Failed to read dataset: {:?}", path),
        })?;
        Self::from_json(&content)
    }

    /// Parse a dataset and check report identifiers are unique
    pub fn from_json(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content).map_err(|e| HazardError::Json {
            source: e,
            context: "Failed to parse dataset".to_string(),
        })?;
        dataset.check_unique_ids()?;

        for report in &dataset.reports {
            let bad = report.scores.out_of_range();
            if !bad.is_empty() {
                tracing::warn!("Report {} has scores outside [0, 1]: {:?}", report.id, bad);
            }
        }

        Ok(dataset)
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for report in &self.reports {
            if !seen.insert(report.id.as_str()) {
                return Err(HazardError::DuplicateReportId {
                    id: report.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn report(&self, id: &str) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    pub fn cluster(&self, id: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_cluster_checks_every_assignment() {
        let report = Report::new("HR-1", "MINING PIT", "PIT A", "BENCH 1").with_clusters(
            ClusterAssignment {
                geo: Some("GEO-01".to_string()),
                lexical: Some("LEX-02".to_string()),
                semantic: Some("SEM-03".to_string()),
            },
        );
        assert!(report.in_cluster("GEO-01"));
        assert!(report.in_cluster("LEX-02"));
        assert!(report.in_cluster("SEM-03"));
        assert!(!report.in_cluster("SEM-01"));
        assert!(!Report::new("HR-2", "S", "L", "D").in_cluster("GEO-01"));
    }

    #[test]
    fn test_presence_bits() {
        let scores = ScoreSet {
            geo: Some(0.9),
            lexical: Some(0.8),
            ..Default::default()
        };
        let presence = scores.presence();
        assert!(presence.has(ScorePresence::GEO | ScorePresence::LEXICAL));
        assert!(!presence.has_any(ScorePresence::SEMANTIC));
        assert!(!presence.all_components());
    }

    #[test]
    fn test_similarity_mean_requires_three_scores() {
        let partial = ScoreSet {
            geo: Some(0.9),
            lexical: Some(0.7),
            ..Default::default()
        };
        assert!(partial.similarity_mean().is_none());

        let full = ScoreSet {
            semantic: Some(0.8),
            ..partial
        };
        let mean = full.similarity_mean().unwrap();
        assert!((mean - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range() {
        let scores = ScoreSet {
            overall: Some(1.2),
            geo: Some(f64::NAN),
            lexical: Some(0.5),
            ..Default::default()
        };
        assert_eq!(scores.out_of_range(), vec!["overall", "geo"]);
    }

    #[test]
    fn test_dataset_parses_camel_case_aliases() {
        let json = r#"{
            "reports": [{
                "id": "HR-1",
                "site": "MINING PIT",
                "location": "PIT A",
                "detailLocation": "BENCH 1",
                "processingStarted": true,
                "scores": { "ruleBased": 0.4, "geo": 0.9 }
            }]
        }"#;
        let dataset = Dataset::from_json(json).unwrap();
        let report = dataset.report("HR-1").unwrap();
        assert_eq!(report.detail_location, "BENCH 1");
        assert!(report.processing_started);
        assert_eq!(report.scores.rule_based, Some(0.4));
        assert!(report.timestamp.is_none());
    }

    #[test]
    fn test_dataset_rejects_duplicate_ids() {
        let json = r#"{
            "reports": [
                { "id": "HR-1", "site": "S", "location": "L", "detail_location": "D" },
                { "id": "HR-1", "site": "S", "location": "L", "detail_location": "D" }
            ]
        }"#;
        let err = Dataset::from_json(json).unwrap_err();
        assert!(matches!(err, HazardError::DuplicateReportId { id } if id == "HR-1"));
    }
}
