// Cascading filter graph and composite report filters
//
// Location chain: site -> location -> detail location
// Cluster chain:  geo cluster -> lexical cluster -> semantic cluster
//
// Selecting a parent value narrows the child's options and clears the child's selection.

mod graph;
mod node;
mod range;
pub(crate) mod tables;
mod types;

pub use graph::FilterGraph;
pub use node::FilterNode;
pub use range::SimilarityRange;
pub use types::{FilterChainConfig, FilterDimension, FilterState, Filterable, FiltersConfig};

use crate::classify::{ClusterTier, DuplicateClassifier, DuplicateTier};
use crate::model::{Cluster, Report};
use crate::stage::{PipelinePhase, StageDeriver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a report list can be filtered on
///
/// Empty sets and `None` impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub state: FilterState,
    pub similarity: Option<SimilarityRange>,
    pub phases: BTreeSet<PipelinePhase>,
    pub tiers: BTreeSet<DuplicateTier>,
}

impl ReportFilter {
    pub fn new(state: FilterState) -> Self {
        Self {
            state,
            ..Default::default()
        }
    }

    pub fn with_similarity(mut self, range: SimilarityRange) -> Self {
        self.similarity = Some(range);
        self
    }

    pub fn with_phases(mut self, phases: impl IntoIterator<Item = PipelinePhase>) -> Self {
        self.phases = phases.into_iter().collect();
        self
    }

    pub fn with_tiers(mut self, tiers: impl IntoIterator<Item = DuplicateTier>) -> Self {
        self.tiers = tiers.into_iter().collect();
        self
    }

    pub fn matches(&self, report: &Report, classifier: &DuplicateClassifier) -> bool {
        if !self.state.matches(report) {
            return false;
        }

        if let Some(range) = &self.similarity {
            if !range.accepts(&report.scores) {
                return false;
            }
        }

        if !self.phases.is_empty() && !self.phases.contains(&StageDeriver::derive(report).phase) {
            return false;
        }

        if !self.tiers.is_empty() {
            match classifier.classify_report(report) {
                Some(tier) if self.tiers.contains(&tier) => {}
                _ => return false,
            }
        }

        true
    }

    /// Reports matching this filter, in input order
    pub fn apply<'a>(&self, reports: &'a [Report], classifier: &DuplicateClassifier) -> Vec<&'a Report> {
        reports
            .iter()
            .filter(|report| self.matches(report, classifier))
            .collect()
    }
}

/// Filter over clusters: the cluster chain plus a cluster tier set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterFilter {
    pub state: FilterState,
    pub tiers: BTreeSet<ClusterTier>,
}

impl ClusterFilter {
    pub fn matches(&self, cluster: &Cluster, classifier: &DuplicateClassifier) -> bool {
        if !self.state.matches(cluster) {
            return false;
        }
        if self.tiers.is_empty() {
            return true;
        }
        classifier
            .classify_cluster(cluster)
            .map(|tier| self.tiers.contains(&tier))
            .unwrap_or(false)
    }

    pub fn apply<'a>(&self, clusters: &'a [Cluster], classifier: &DuplicateClassifier) -> Vec<&'a Cluster> {
        clusters
            .iter()
            .filter(|cluster| self.matches(cluster, classifier))
            .collect()
    }
}
