//! Filtered ranking evaluation.
//!
//! For each query and each side, every entity is substituted at that side in
//! id order. Known-true candidates are dropped and the query is placed at
//! index 0. The pool is scored, stably sorted best first, and the query's
//! 1-based position is its rank. A stable sort with the query first means
//! ties resolve in the query's favor.

use corpus::{Side, Triple, TripleIndex};
use serde::{Deserialize, Serialize};

use crate::error::KgeError;
use crate::eval::metrics::EvalReport;
use crate::scorer::{ScoreOrder, TripleScorer};

/// Evaluation settings, read from the `[eval]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Score pools in slices of at most this many rows. `None` = one call.
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub order: ScoreOrder,
    /// Candidates returned per link query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    10
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            chunk_size: None,
            order: ScoreOrder::default(),
            top_k: default_top_k(),
        }
    }
}

impl EvalConfig {
    pub fn validate(&self) -> Result<(), KgeError> {
        if self.chunk_size == Some(0) {
            return Err(KgeError::ZeroChunkSize);
        }
        if self.top_k == 0 {
            return Err(KgeError::Config("top_k must be positive".to_string()));
        }
        Ok(())
    }
}

/// Candidate pool for `query` on `side`: the query at index 0, then every
/// substitution that is not known-true, in entity id order.
pub fn filtered_pool(index: &TripleIndex, query: Triple, side: Side) -> Vec<Triple> {
    let mut pool = Vec::with_capacity(index.entity_count());
    pool.push(query);
    for entity in 0..index.entity_count() as u32 {
        let candidate = query.corrupt(side, entity);
        if candidate != query && !index.contains(&candidate) {
            pool.push(candidate);
        }
    }
    pool
}

/// Score `pool`, optionally in consecutive chunks, checking one score per row.
pub fn score_pool<S: TripleScorer + ?Sized>(
    scorer: &S,
    pool: &[Triple],
    chunk_size: Option<usize>,
) -> Result<Vec<f32>, KgeError> {
    let chunk_size = match chunk_size {
        Some(0) => return Err(KgeError::ZeroChunkSize),
        Some(n) => n,
        None => pool.len().max(1),
    };
    let mut scores = Vec::with_capacity(pool.len());
    for chunk in pool.chunks(chunk_size) {
        let batch = scorer.score(chunk).map_err(KgeError::Scorer)?;
        if batch.scores.len() != chunk.len() {
            return Err(KgeError::ScoreShape {
                expected: chunk.len(),
                got: batch.scores.len(),
            });
        }
        scores.extend(batch.scores);
    }
    Ok(scores)
}

/// Row indices sorted best first. Stable: equal scores keep pool order.
pub fn sort_best_first(scores: &[f32], order: ScoreOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| order.compare(scores[a], scores[b]));
    idx
}

/// 1-based rank of row 0 after a stable best-first sort.
pub fn rank_of_first(scores: &[f32], order: ScoreOrder) -> usize {
    sort_best_first(scores, order)
        .iter()
        .position(|&i| i == 0)
        .map_or(1, |pos| pos + 1)
}

/// Filtered-setting evaluator over a shared known-true index.
pub struct RankEvaluator<'a> {
    index: &'a TripleIndex,
    config: EvalConfig,
}

impl<'a> RankEvaluator<'a> {
    pub fn new(index: &'a TripleIndex, config: EvalConfig) -> Result<Self, KgeError> {
        config.validate()?;
        Ok(Self { index, config })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Filtered rank of `query` when corrupting `side`.
    pub fn rank_query<S: TripleScorer + ?Sized>(
        &self,
        query: Triple,
        side: Side,
        scorer: &S,
    ) -> Result<usize, KgeError> {
        self.index.check_range(&query)?;
        let pool = filtered_pool(self.index, query, side);
        let scores = score_pool(scorer, &pool, self.config.chunk_size)?;
        let rank = rank_of_first(&scores, self.config.order);
        tracing::debug!(%query, %side, pool = pool.len(), rank, "Ranked query");
        Ok(rank)
    }

    /// Rank every query on both sides and aggregate.
    pub fn evaluate<S: TripleScorer + ?Sized>(
        &self,
        queries: &[Triple],
        scorer: &S,
    ) -> Result<EvalReport, KgeError> {
        self.evaluate_with_progress(queries, scorer, |_| {})
    }

    /// [`evaluate`](Self::evaluate) with a callback after each finished query.
    pub fn evaluate_with_progress<S, F>(
        &self,
        queries: &[Triple],
        scorer: &S,
        mut on_query: F,
    ) -> Result<EvalReport, KgeError>
    where
        S: TripleScorer + ?Sized,
        F: FnMut(usize),
    {
        if queries.is_empty() {
            tracing::warn!("Evaluating an empty query set; all metrics are zero");
        }
        let mut head_ranks = Vec::with_capacity(queries.len());
        let mut tail_ranks = Vec::with_capacity(queries.len());
        for (i, query) in queries.iter().enumerate() {
            head_ranks.push(self.rank_query(*query, Side::Head, scorer)?);
            tail_ranks.push(self.rank_query(*query, Side::Tail, scorer)?);
            on_query(i + 1);
        }

        let report = EvalReport::from_ranks(&head_ranks, &tail_ranks);
        tracing::info!(
            queries = queries.len(),
            mrr = format!("{:.4}", report.combined.mean_reciprocal_rank),
            mr = format!("{:.1}", report.combined.mean_rank),
            hits_at_10 = format!("{:.3}", report.combined.hits_at_10),
            "Evaluation complete"
        );
        tracing::debug!(head = %report.head.summary(), "Head-side metrics");
        tracing::debug!(tail = %report.tail.summary(), "Tail-side metrics");
        Ok(report)
    }
}
