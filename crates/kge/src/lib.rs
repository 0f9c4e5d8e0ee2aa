//! Knowledge-graph embedding training and evaluation.
//!
//! Builds negative-sampling batches against a known-true index, trains a
//! burn TransE model with margin ranking loss, and evaluates any
//! [`TripleScorer`] with the filtered ranking protocol (Hits@K, MR, MRR).
//! Convention: lower score = more plausible triple.

pub mod error;
pub mod eval;
pub mod mocks;
pub mod model;
pub mod scorer;
pub mod training;

pub use error::KgeError;
pub use eval::link::{LinkPrediction, LinkPredictor};
pub use eval::metrics::{EvalReport, SideMetrics, HITS_AT};
pub use eval::ranking::{EvalConfig, RankEvaluator};
pub use model::transe::{TransE, TransEConfig, TransEScorer};
pub use scorer::{ScoreOrder, ScoredBatch, TripleScorer};
pub use training::sampler::{Batch, BatchSampler, SamplerConfig, ENTROPY_SEED};
pub use training::trainer::{
    load_checkpoint, save_checkpoint, step_lr, train, CheckpointMeta, TrainingConfig, TrainingOutcome,
};
