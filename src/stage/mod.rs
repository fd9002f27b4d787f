//! Pipeline phase derivation
//!
//! A report's phase is never stored. It is recomputed from which scores are
//! present plus the external `failed` / `processing_started` flags, by walking
//! an ordered rule table over a presence bitmask. First matching rule wins.
//!
//! The analysis pipeline runs geo -> lexical -> semantic -> fusion, so a
//! later-stage score is taken as evidence that earlier stages finished. A
//! geo or lexical score marks its stage as done and the phase names the stage
//! that runs next. A semantic score without fusion started stays in the
//! semantic phase.

use crate::model::{Report, ScorePresence, ScoreSet};
use serde::{Deserialize, Serialize};

/// Discrete step a report occupies in the analysis pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    Queued,
    AnalyzingGeo,
    AnalyzingLexical,
    AnalyzingSemantic,
    Aggregating,
    Completed,
    Failed,
}

impl PipelinePhase {
    pub const ALL: [PipelinePhase; 7] = [
        PipelinePhase::Queued,
        PipelinePhase::AnalyzingGeo,
        PipelinePhase::AnalyzingLexical,
        PipelinePhase::AnalyzingSemantic,
        PipelinePhase::Aggregating,
        PipelinePhase::Completed,
        PipelinePhase::Failed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::AnalyzingGeo => "Analyzing geo proximity",
            Self::AnalyzingLexical => "Analyzing lexical similarity",
            Self::AnalyzingSemantic => "Analyzing semantic similarity",
            Self::Aggregating => "Aggregating scores",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// Parse a snake_case phase name such as `analyzing_geo`
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|phase| phase.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::AnalyzingGeo => "analyzing_geo",
            Self::AnalyzingLexical => "analyzing_lexical",
            Self::AnalyzingSemantic => "analyzing_semantic",
            Self::Aggregating => "aggregating",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// True for every phase in which analysis is actively running
    pub fn is_processing(&self) -> bool {
        matches!(
            self,
            Self::AnalyzingGeo | Self::AnalyzingLexical | Self::AnalyzingSemantic | Self::Aggregating
        )
    }
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Score data that contradicts the pipeline's ordering or completion contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreInconsistency {
    /// `overall` is present but at least one component score is missing.
    /// The overall score is ignored for phase derivation.
    OverallWithoutComponents,
    /// A later-stage score is present while an earlier-stage score is not.
    /// The phase is still inferred from the latest stage present.
    SkippedStage,
}

/// Normalized input to the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageInput {
    pub failed: bool,
    pub processing_started: bool,
    pub presence: ScorePresence,
}

impl StageInput {
    pub fn new(scores: &ScoreSet, failed: bool, processing_started: bool) -> Self {
        Self {
            failed,
            processing_started,
            presence: scores.presence(),
        }
    }
}

/// Result of deriving a report's phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub phase: PipelinePhase,
    pub label: &'static str,
    pub failed: bool,
    /// Name of the rule that matched
    pub rule: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inconsistencies: Vec<ScoreInconsistency>,
}

impl StageOutcome {
    pub fn is_consistent(&self) -> bool {
        self.inconsistencies.is_empty()
    }
}

struct StageRule {
    name: &'static str,
    applies: fn(&StageInput) -> bool,
    phase: PipelinePhase,
}

fn is_failed(input: &StageInput) -> bool {
    input.failed
}

fn has_overall(input: &StageInput) -> bool {
    input.presence.has(ScorePresence::OVERALL)
}

fn awaiting_fusion(input: &StageInput) -> bool {
    input.processing_started && input.presence.all_components()
}

fn has_semantic(input: &StageInput) -> bool {
    input.presence.has(ScorePresence::SEMANTIC)
}

fn has_lexical(input: &StageInput) -> bool {
    input.presence.has(ScorePresence::LEXICAL)
}

fn has_geo(input: &StageInput) -> bool {
    input.presence.has(ScorePresence::GEO)
}

fn started(input: &StageInput) -> bool {
    input.processing_started
}

fn always(_: &StageInput) -> bool {
    true
}

const RULES: [StageRule; 8] = [
    StageRule {
        name: "failed",
        applies: is_failed,
        phase: PipelinePhase::Failed,
    },
    StageRule {
        name: "overall_present",
        applies: has_overall,
        phase: PipelinePhase::Completed,
    },
    StageRule {
        name: "components_awaiting_fusion",
        applies: awaiting_fusion,
        phase: PipelinePhase::Aggregating,
    },
    StageRule {
        name: "semantic_present",
        applies: has_semantic,
        phase: PipelinePhase::AnalyzingSemantic,
    },
    StageRule {
        name: "lexical_done",
        applies: has_lexical,
        phase: PipelinePhase::AnalyzingSemantic,
    },
    StageRule {
        name: "geo_done",
        applies: has_geo,
        phase: PipelinePhase::AnalyzingLexical,
    },
    StageRule {
        name: "started_without_scores",
        applies: started,
        phase: PipelinePhase::AnalyzingGeo,
    },
    StageRule {
        name: "queued",
        applies: always,
        phase: PipelinePhase::Queued,
    },
];

/// Derives pipeline phases from score presence
pub struct StageDeriver;

impl StageDeriver {
    /// Derive the phase of a report
    pub fn derive(report: &Report) -> StageOutcome {
        let outcome = Self::derive_input(StageInput::new(
            &report.scores,
            report.failed,
            report.processing_started,
        ));

        if outcome
            .inconsistencies
            .contains(&ScoreInconsistency::OverallWithoutComponents)
        {
            tracing::warn!(
                "Report {} has an overall score without all component scores; treating as {}",
                report.id,
                outcome.phase
            );
        } else if outcome
            .inconsistencies
            .contains(&ScoreInconsistency::SkippedStage)
        {
            tracing::debug!(
                "Report {} has a later-stage score without an earlier one; inferred {}",
                report.id,
                outcome.phase
            );
        }

        outcome
    }

    /// Derive a phase from raw inputs. Total: every input yields exactly one phase.
    pub fn derive_input(input: StageInput) -> StageOutcome {
        let mut inconsistencies = Vec::new();
        let mut input = input;

        if input.presence.has(ScorePresence::OVERALL) && !input.presence.all_components() {
            inconsistencies.push(ScoreInconsistency::OverallWithoutComponents);
            input.presence = input.presence.without_overall();
        }

        if Self::skips_stage(input.presence) {
            inconsistencies.push(ScoreInconsistency::SkippedStage);
        }

        // The last rule always applies, so the fallback is never reached
        let (name, phase) = RULES
            .iter()
            .find(|rule| (rule.applies)(&input))
            .map(|rule| (rule.name, rule.phase))
            .unwrap_or(("queued", PipelinePhase::Queued));

        StageOutcome {
            phase,
            label: phase.label(),
            failed: phase == PipelinePhase::Failed,
            rule: name,
            inconsistencies,
        }
    }

    /// Names of the rules in evaluation order
    pub fn rule_names() -> impl Iterator<Item = &'static str> {
        RULES.iter().map(|rule| rule.name)
    }

    fn skips_stage(presence: ScorePresence) -> bool {
        let semantic_early = presence.has(ScorePresence::SEMANTIC)
            && !presence.has(ScorePresence::GEO | ScorePresence::LEXICAL);
        let lexical_early =
            presence.has(ScorePresence::LEXICAL) && !presence.has(ScorePresence::GEO);
        semantic_early || lexical_early
    }
}
