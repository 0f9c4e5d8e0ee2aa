//! Margin ranking loss over (positive, negative) score pairs.
//!
//! Convention: lower score = more plausible triple.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::training::sampler::Batch;

/// Hinge loss `mean(max(0, margin + pos - neg))`.
///
/// # Arguments
/// - `pos_scores`: shape `(pairs,)`, score of the positive in each pair
/// - `neg_scores`: shape `(pairs,)`, score of the matching negative
///
/// # Returns
/// Scalar loss tensor of shape `(1,)`.
pub fn margin_ranking_loss<B: Backend>(
    pos_scores: Tensor<B, 1>,
    neg_scores: Tensor<B, 1>,
    margin: f64,
) -> Tensor<B, 1> {
    (pos_scores - neg_scores).add_scalar(margin).clamp_min(0.0).mean()
}

/// Split a batch's row scores into aligned positive and negative tensors
/// using [`Batch::negative_pairs`].
///
/// Returns `None` when the batch has no negatives.
pub fn paired_scores<B: Backend>(
    scores: Tensor<B, 1>,
    batch: &Batch,
) -> Option<(Tensor<B, 1>, Tensor<B, 1>)> {
    let pairs = batch.negative_pairs();
    if pairs.is_empty() {
        return None;
    }
    let device = scores.device();
    let n = pairs.len();
    let (pos_rows, neg_rows): (Vec<i64>, Vec<i64>) = pairs
        .into_iter()
        .map(|(p, q)| (p as i64, q as i64))
        .unzip();
    let pos_idx = Tensor::<B, 1, Int>::from_data(TensorData::new(pos_rows, [n]), &device);
    let neg_idx = Tensor::<B, 1, Int>::from_data(TensorData::new(neg_rows, [n]), &device);
    Some((scores.clone().select(0, pos_idx), scores.select(0, neg_idx)))
}
