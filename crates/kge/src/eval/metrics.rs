//! Rank-based metrics: Hits@K, Mean Rank and Mean Reciprocal Rank.

use serde::{Deserialize, Serialize};

/// Cutoffs reported as Hits@K.
pub const HITS_AT: [usize; 4] = [1, 3, 10, 100];

/// Metrics for one corruption side (or the head/tail average).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SideMetrics {
    /// Fraction of queries ranked first.
    pub hits_at_1: f64,
    /// Fraction with rank <= 3.
    pub hits_at_3: f64,
    /// Fraction with rank <= 10.
    pub hits_at_10: f64,
    /// Fraction with rank <= 100.
    pub hits_at_100: f64,
    /// Arithmetic mean of ranks.
    pub mean_rank: f64,
    /// Arithmetic mean of 1/rank.
    pub mean_reciprocal_rank: f64,
    /// Number of ranked queries.
    pub num_queries: usize,
}

impl SideMetrics {
    /// Aggregate 1-based ranks. An empty slice gives all zeros.
    pub fn from_ranks(ranks: &[usize]) -> Self {
        if ranks.is_empty() {
            return Self::default();
        }
        let n = ranks.len() as f64;
        let hits = |k: usize| ranks.iter().filter(|&&r| r <= k).count() as f64 / n;
        Self {
            hits_at_1: hits(1),
            hits_at_3: hits(3),
            hits_at_10: hits(10),
            hits_at_100: hits(100),
            mean_rank: ranks.iter().map(|&r| r as f64).sum::<f64>() / n,
            mean_reciprocal_rank: ranks.iter().map(|&r| 1.0 / r as f64).sum::<f64>() / n,
            num_queries: ranks.len(),
        }
    }

    /// Per-metric arithmetic mean of two sides.
    pub fn average(a: &Self, b: &Self) -> Self {
        Self {
            hits_at_1: (a.hits_at_1 + b.hits_at_1) / 2.0,
            hits_at_3: (a.hits_at_3 + b.hits_at_3) / 2.0,
            hits_at_10: (a.hits_at_10 + b.hits_at_10) / 2.0,
            hits_at_100: (a.hits_at_100 + b.hits_at_100) / 2.0,
            mean_rank: (a.mean_rank + b.mean_rank) / 2.0,
            mean_reciprocal_rank: (a.mean_reciprocal_rank + b.mean_reciprocal_rank) / 2.0,
            num_queries: a.num_queries.max(b.num_queries),
        }
    }

    /// Hits@K for one of the [`HITS_AT`] cutoffs.
    pub fn hits_at(&self, k: usize) -> Option<f64> {
        match k {
            1 => Some(self.hits_at_1),
            3 => Some(self.hits_at_3),
            10 => Some(self.hits_at_10),
            100 => Some(self.hits_at_100),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "MRR: {:.4} | MR: {:.1} | H@1: {:.3} | H@3: {:.3} | H@10: {:.3} | H@100: {:.3} (n={})",
            self.mean_reciprocal_rank,
            self.mean_rank,
            self.hits_at_1,
            self.hits_at_3,
            self.hits_at_10,
            self.hits_at_100,
            self.num_queries
        )
    }
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub head: SideMetrics,
    pub tail: SideMetrics,
    /// `(head + tail) / 2` per metric.
    pub combined: SideMetrics,
}

impl EvalReport {
    pub fn from_ranks(head_ranks: &[usize], tail_ranks: &[usize]) -> Self {
        let head = SideMetrics::from_ranks(head_ranks);
        let tail = SideMetrics::from_ranks(tail_ranks);
        let combined = SideMetrics::average(&head, &tail);
        Self {
            head,
            tail,
            combined,
        }
    }
}
