//! Link prediction for queries with one unknown position.
//!
//! Unlike filtered ranking, no known-true candidates are removed: every
//! entity is substituted in id order and the best `top_k` are returned.

use corpus::{EntityId, LinkQuery, Triple, TripleIndex};
use serde::{Deserialize, Serialize};

use crate::error::KgeError;
use crate::eval::ranking::{score_pool, sort_best_first, EvalConfig};
use crate::scorer::TripleScorer;

/// Best candidates for one link query, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPrediction {
    pub query: LinkQuery,
    pub entities: Vec<EntityId>,
    pub scores: Vec<f32>,
}

pub struct LinkPredictor<'a> {
    index: &'a TripleIndex,
    config: EvalConfig,
}

impl<'a> LinkPredictor<'a> {
    /// `index` supplies the id spaces; its membership set is not consulted.
    pub fn new(index: &'a TripleIndex, config: EvalConfig) -> Result<Self, KgeError> {
        config.validate()?;
        Ok(Self { index, config })
    }

    pub fn predict<S: TripleScorer + ?Sized>(
        &self,
        query: &LinkQuery,
        scorer: &S,
    ) -> Result<LinkPrediction, KgeError> {
        self.index.check_range(&query.complete(0))?;
        let pool: Vec<Triple> = (0..self.index.entity_count() as u32)
            .map(|e| query.complete(e))
            .collect();
        let scores = score_pool(scorer, &pool, self.config.chunk_size)?;

        let top: Vec<usize> = sort_best_first(&scores, self.config.order)
            .into_iter()
            .take(self.config.top_k)
            .collect();
        Ok(LinkPrediction {
            query: *query,
            entities: top.iter().map(|&i| i as EntityId).collect(),
            scores: top.iter().map(|&i| scores[i]).collect(),
        })
    }

    pub fn predict_all<S: TripleScorer + ?Sized>(
        &self,
        queries: &[LinkQuery],
        scorer: &S,
    ) -> Result<Vec<LinkPrediction>, KgeError> {
        let predictions = queries
            .iter()
            .map(|q| self.predict(q, scorer))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(queries = predictions.len(), top_k = self.config.top_k, "Link prediction complete");
        Ok(predictions)
    }
}
