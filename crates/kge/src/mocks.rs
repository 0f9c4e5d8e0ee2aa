//! Mock scorers for exercising the sampler, evaluator and link prediction
//! without a trained model.

use std::collections::HashMap;
use std::sync::Mutex;

use corpus::Triple;

use crate::scorer::{ScoredBatch, TripleScorer};

// ---------------------------------------------------------------------------
// FnScorer
// ---------------------------------------------------------------------------

/// Scores each row independently with a closure.
pub struct FnScorer<F> {
    f: F,
}

impl<F: Fn(&Triple) -> f32> FnScorer<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn(&Triple) -> f32> TripleScorer for FnScorer<F> {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        Ok(ScoredBatch::from_scores(triples.iter().map(&self.f).collect()))
    }
}

// ---------------------------------------------------------------------------
// BatchFnScorer
// ---------------------------------------------------------------------------

/// Hands the whole batch to a closure, for scorers that misbehave on purpose.
pub struct BatchFnScorer<F> {
    f: F,
}

impl<F: Fn(&[Triple]) -> anyhow::Result<ScoredBatch>> BatchFnScorer<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F: Fn(&[Triple]) -> anyhow::Result<ScoredBatch>> TripleScorer for BatchFnScorer<F> {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        (self.f)(triples)
    }
}

// ---------------------------------------------------------------------------
// TableScorer
// ---------------------------------------------------------------------------

/// Looks scores up in a table, falling back to a default.
pub struct TableScorer {
    table: HashMap<Triple, f32>,
    default_score: f32,
}

impl TableScorer {
    pub fn new(default_score: f32) -> Self {
        Self {
            table: HashMap::new(),
            default_score,
        }
    }

    /// Set the score returned for `triple`.
    pub fn insert(&mut self, triple: Triple, score: f32) {
        self.table.insert(triple, score);
    }

    pub fn with(mut self, triple: Triple, score: f32) -> Self {
        self.insert(triple, score);
        self
    }
}

impl TripleScorer for TableScorer {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        Ok(ScoredBatch::from_scores(
            triples
                .iter()
                .map(|t| self.table.get(t).copied().unwrap_or(self.default_score))
                .collect(),
        ))
    }
}

// ---------------------------------------------------------------------------
// RecordingScorer
// ---------------------------------------------------------------------------

/// Wraps a scorer and records every batch it receives.
pub struct RecordingScorer<S> {
    inner: S,
    batches: Mutex<Vec<Vec<Triple>>>,
}

impl<S: TripleScorer> RecordingScorer<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Batches seen so far, in call order.
    pub fn batches(&self) -> Vec<Vec<Triple>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Sizes of the batches seen so far.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches().iter().map(Vec::len).collect()
    }
}

impl<S: TripleScorer> TripleScorer for RecordingScorer<S> {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(triples.to_vec());
        }
        self.inner.score(triples)
    }
}

// ---------------------------------------------------------------------------
// FailingScorer
// ---------------------------------------------------------------------------

/// Always fails with the given message.
pub struct FailingScorer {
    message: String,
}

impl FailingScorer {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl TripleScorer for FailingScorer {
    fn score(&self, _triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        Err(anyhow::anyhow!("{}", self.message))
    }
}
