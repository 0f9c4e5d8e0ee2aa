//! Training pipeline: negative-sampling batches, margin loss, and the
//! AdamW loop with step-decay LR and best/final checkpoints.

pub mod loss;
pub mod sampler;
pub mod trainer;
