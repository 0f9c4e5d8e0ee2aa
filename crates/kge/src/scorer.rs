//! The scoring collaborator seam: anything that maps a batch of triples to
//! one score per row.

use corpus::Triple;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scores for one batch of triples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredBatch {
    /// One score per input row, in input order.
    pub scores: Vec<f32>,
    /// Optional per-row auxiliary factor vectors (e.g. attention weights).
    pub factors: Option<Vec<Vec<f32>>>,
}

impl ScoredBatch {
    pub fn from_scores(scores: Vec<f32>) -> Self {
        Self {
            scores,
            factors: None,
        }
    }
}

/// Scoring model consumed by training and evaluation.
///
/// Must accept any batch size, including slices of a larger candidate pool.
/// Sync trait: burn inference is synchronous.
pub trait TripleScorer {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch>;
}

impl<S: TripleScorer + ?Sized> TripleScorer for &S {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        (**self).score(triples)
    }
}

impl<S: TripleScorer + ?Sized> TripleScorer for Box<S> {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        (**self).score(triples)
    }
}

/// Which direction of the score means "more plausible".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreOrder {
    /// Distances: the smallest score ranks first.
    #[default]
    LowerIsBetter,
    /// Similarities: the largest score ranks first.
    HigherIsBetter,
}

impl ScoreOrder {
    /// Ordering that sorts the better score first. NaN is ordered by
    /// `f32::total_cmp`, so sorting never panics.
    pub fn compare(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::LowerIsBetter => a.total_cmp(&b),
            Self::HigherIsBetter => b.total_cmp(&a),
        }
    }

    /// Whether `a` is strictly better than `b`.
    pub fn is_better(self, a: f32, b: f32) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

impl std::fmt::Display for ScoreOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowerIsBetter => write!(f, "lower_is_better"),
            Self::HigherIsBetter => write!(f, "higher_is_better"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_order_compare() {
        assert!(ScoreOrder::LowerIsBetter.is_better(0.5, 1.0));
        assert!(!ScoreOrder::LowerIsBetter.is_better(1.0, 1.0));
        assert!(ScoreOrder::HigherIsBetter.is_better(2.0, 1.0));
        assert_eq!(ScoreOrder::default(), ScoreOrder::LowerIsBetter);
    }

    #[test]
    fn test_score_order_serde() {
        let order: ScoreOrder = serde_json::from_str("\"higher_is_better\"").unwrap();
        assert_eq!(order, ScoreOrder::HigherIsBetter);
        assert_eq!(order.to_string(), "higher_is_better");
    }

    #[test]
    fn test_nan_sorts_without_panic() {
        let mut scores = vec![1.0, f32::NAN, 0.5];
        scores.sort_by(|a, b| ScoreOrder::LowerIsBetter.compare(*a, *b));
        assert_eq!(scores[0], 0.5);
        assert!(scores[2].is_nan());
    }
}
