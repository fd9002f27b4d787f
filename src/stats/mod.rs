//! Dashboard statistics over a report and cluster collection

use crate::classify::{ClusterTier, DuplicateClassifier, DuplicateTier};
use crate::model::{Cluster, Report};
use crate::stage::{PipelinePhase, StageDeriver};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts shown on the dashboard's summary cards
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_reports: usize,
    pub by_phase: BTreeMap<PipelinePhase, usize>,
    pub by_tier: BTreeMap<DuplicateTier, usize>,
    /// Reports that cannot be tiered yet (no overall score)
    pub unclassified: usize,
    /// Reports whose score set contradicts the pipeline contract
    pub inconsistent: usize,
    /// Mean overall score over classified reports
    pub average_overall: Option<f64>,
    pub total_clusters: usize,
    pub clusters_by_tier: BTreeMap<ClusterTier, usize>,
}

impl DashboardStats {
    pub fn collect(
        reports: &[Report],
        clusters: &[Cluster],
        classifier: &DuplicateClassifier,
    ) -> Self {
        let mut stats = DashboardStats {
            total_reports: reports.len(),
            total_clusters: clusters.len(),
            ..Default::default()
        };
        let mut overall_sum = 0.0;
        let mut overall_count = 0usize;

        for report in reports {
            let outcome = StageDeriver::derive(report);
            *stats.by_phase.entry(outcome.phase).or_insert(0) += 1;
            if !outcome.is_consistent() {
                stats.inconsistent += 1;
            }

            match classifier.classify_report(report) {
                Some(tier) => {
                    *stats.by_tier.entry(tier).or_insert(0) += 1;
                    if let Some(overall) = report.scores.overall {
                        overall_sum += overall;
                        overall_count += 1;
                    }
                }
                None => stats.unclassified += 1,
            }
        }

        for cluster in clusters {
            if let Some(tier) = classifier.classify_cluster(cluster) {
                *stats.clusters_by_tier.entry(tier).or_insert(0) += 1;
            }
        }

        if overall_count > 0 {
            stats.average_overall = Some(overall_sum / overall_count as f64);
        }

        stats
    }

    pub fn phase_count(&self, phase: PipelinePhase) -> usize {
        self.by_phase.get(&phase).copied().unwrap_or(0)
    }

    pub fn tier_count(&self, tier: DuplicateTier) -> usize {
        self.by_tier.get(&tier).copied().unwrap_or(0)
    }

    /// Reports currently moving through the pipeline
    pub fn in_progress(&self) -> usize {
        self.by_phase
            .iter()
            .filter(|(phase, _)| phase.is_processing())
            .map(|(_, count)| count)
            .sum()
    }
}
