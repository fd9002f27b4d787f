// Numeric similarity range filter, independent of the categorical chains
use serde::{Deserialize, Serialize};

use crate::model::ScoreSet;

/// Inclusive [lo, hi] window over the mean of geo, lexical and semantic, in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityRange {
    pub lo: u32,
    pub hi: u32,
}

impl SimilarityRange {
    pub fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    /// Mean component similarity rounded to a whole percent
    ///
    /// Uses the three component scores, not `overall`.
    pub fn percent(scores: &ScoreSet) -> Option<i64> {
        scores
            .similarity_mean()
            .filter(|mean| mean.is_finite())
            .map(|mean| (mean * 100.0).round() as i64)
    }

    /// Reports missing any of the three component scores are rejected
    pub fn accepts(&self, scores: &ScoreSet) -> bool {
        match Self::percent(scores) {
            Some(pct) => i64::from(self.lo) <= pct && pct <= i64::from(self.hi),
            None => false,
        }
    }
}

impl Default for SimilarityRange {
    fn default() -> Self {
        Self { lo: 0, hi: 100 }
    }
}
