//! Epoch-based training loop for TransE.
//!
//! Each epoch reshuffles the training order, runs one pass of negative-sampled
//! batches through margin ranking loss and AdamW, and decays the LR in steps.
//! The epoch with the lowest average loss is kept as the `best` checkpoint;
//! the last epoch is saved as `final`.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::backend::AutodiffBackend;

use crate::model::transe::{TransE, TransEConfig};
use crate::training::loss::{margin_ranking_loss, paired_scores};
use crate::training::sampler::BatchSampler;

/// Metadata saved alongside each checkpoint.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
pub struct CheckpointMeta {
    /// Zero-based epoch the weights come from.
    pub epoch: usize,
    /// Average training loss of that epoch.
    pub avg_loss: f64,
}

/// Configuration for the training loop.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    /// Number of passes over the training split.
    #[config(default = 2)]
    pub epochs: usize,
    /// Base learning rate for AdamW.
    #[config(default = 1e-3)]
    pub lr: f64,
    /// Weight decay for AdamW.
    #[config(default = 1e-5)]
    pub weight_decay: f64,
    /// Epochs between LR decays. 0 disables decay.
    #[config(default = 25)]
    pub step_size: usize,
    /// Multiplicative LR decay per step.
    #[config(default = 0.5)]
    pub gamma: f64,
    /// Margin for the ranking hinge loss.
    #[config(default = 5.0)]
    pub margin: f64,
    /// Iterations between progress logs. 0 disables them.
    #[config(default = 100)]
    pub log_interval: usize,
    /// Directory for `best/` and `final/` checkpoints.
    #[config(default = "String::from(\"checkpoints/kge\")")]
    pub checkpoint_dir: String,
}

/// Step decay: `base_lr * gamma^(epoch / step_size)`.
pub fn step_lr(base_lr: f64, step_size: usize, gamma: f64, epoch: usize) -> f64 {
    if step_size == 0 {
        return base_lr;
    }
    base_lr * gamma.powi((epoch / step_size) as i32)
}

/// Trained model plus the loss history.
pub struct TrainingOutcome<B: AutodiffBackend> {
    /// Weights after the last epoch.
    pub model: TransE<B>,
    /// Average loss per epoch.
    pub epoch_losses: Vec<f64>,
    /// Epoch with the lowest average loss, if any epoch ran.
    pub best_epoch: Option<usize>,
}

/// Run the training loop.
///
/// `model_config` is stored next to every checkpoint so it can be restored
/// with [`load_checkpoint`] alone.
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    model_config: &TransEConfig,
    mut model: TransE<B>,
    sampler: &mut BatchSampler<'_>,
    device: &B::Device,
) -> anyhow::Result<TrainingOutcome<B>> {
    let checkpoint_dir = Path::new(&config.checkpoint_dir);
    std::fs::create_dir_all(checkpoint_dir)
        .with_context(|| format!("failed to create {}", checkpoint_dir.display()))?;

    let mut optimizer = AdamWConfig::new()
        .with_weight_decay(config.weight_decay as f32)
        .init();

    let iterations = sampler.iterations_per_epoch();
    let train_start = Instant::now();
    let mut epoch_losses = Vec::with_capacity(config.epochs);
    let mut best: Option<(usize, f64)> = None;

    tracing::info!(
        epochs = config.epochs,
        iterations,
        margin = config.margin,
        lr = config.lr,
        "Starting training"
    );

    for epoch in 0..config.epochs {
        let lr = step_lr(config.lr, config.step_size, config.gamma, epoch);
        let epoch_start = Instant::now();
        sampler.reshuffle();

        let mut loss_sum = 0.0;
        let mut trained = 0usize;
        for iteration in 0..iterations {
            let batch = sampler.next_batch(iteration)?;
            let scores = model.score_triples(&batch.triples, device);
            let Some((pos, neg)) = paired_scores(scores, &batch) else {
                continue;
            };

            let loss = margin_ranking_loss(pos, neg, config.margin);
            let loss_val: f64 = loss.clone().into_scalar().elem();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(lr, model, grads);

            loss_sum += loss_val;
            trained += 1;

            if config.log_interval > 0 && (iteration + 1) % config.log_interval == 0 {
                tracing::info!(
                    epoch,
                    iteration = iteration + 1,
                    iterations,
                    loss = format!("{loss_val:.4}"),
                    "Training progress"
                );
            }
        }

        let avg_loss = if trained > 0 {
            loss_sum / trained as f64
        } else {
            0.0
        };
        epoch_losses.push(avg_loss);
        tracing::info!(
            epoch,
            avg_loss = format!("{avg_loss:.4}"),
            lr = format!("{lr:.2e}"),
            elapsed_secs = format!("{:.1}", epoch_start.elapsed().as_secs_f64()),
            "Epoch finished"
        );

        if best.map_or(true, |(_, best_loss)| avg_loss < best_loss) {
            best = Some((epoch, avg_loss));
            save_checkpoint(
                &model,
                model_config,
                &checkpoint_dir.join("best"),
                &CheckpointMeta { epoch, avg_loss },
            )?;
            tracing::info!(epoch, "New best epoch, checkpoint saved");
        }
    }

    let final_meta = CheckpointMeta {
        epoch: config.epochs.saturating_sub(1),
        avg_loss: epoch_losses.last().copied().unwrap_or(0.0),
    };
    save_checkpoint(&model, model_config, &checkpoint_dir.join("final"), &final_meta)?;

    tracing::info!(
        epochs = config.epochs,
        best_epoch = ?best.map(|(e, _)| e),
        elapsed_secs = format!("{:.1}", train_start.elapsed().as_secs_f64()),
        "Training complete. Final checkpoint saved."
    );

    Ok(TrainingOutcome {
        model,
        epoch_losses,
        best_epoch: best.map(|(e, _)| e),
    })
}

/// Save weights, model config and metadata into `dir`.
pub fn save_checkpoint<B: Backend>(
    model: &TransE<B>,
    model_config: &TransEConfig,
    dir: &Path,
    meta: &CheckpointMeta,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    model
        .clone()
        .save_file(dir.join("model"), &recorder)
        .map_err(|e| anyhow::anyhow!("Failed to save model to {}: {e}", dir.display()))?;
    model_config
        .save(dir.join("config.json"))
        .with_context(|| format!("failed to save model config to {}", dir.display()))?;
    let meta_path = dir.join("meta.json");
    serde_json::to_writer_pretty(
        std::fs::File::create(&meta_path)
            .with_context(|| format!("failed to create {}", meta_path.display()))?,
        meta,
    )?;
    Ok(())
}

/// Load a TransE model and its metadata from a checkpoint directory.
///
/// Creates a fresh model from the stored config, then loads saved weights on top.
pub fn load_checkpoint<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> anyhow::Result<(TransE<B>, TransEConfig, CheckpointMeta)> {
    let config = TransEConfig::load(dir.join("config.json")).map_err(|e| {
        anyhow::anyhow!("Failed to read model config from {}: {e:?}", dir.display())
    })?;
    let model = config
        .init::<B>(device)
        .load_file(
            dir.join("model"),
            &NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
            device,
        )
        .map_err(|e| anyhow::anyhow!("Failed to load checkpoint from {}: {e}", dir.display()))?;

    let meta_path = dir.join("meta.json");
    let meta: CheckpointMeta = serde_json::from_reader(
        std::fs::File::open(&meta_path)
            .with_context(|| format!("failed to open {}", meta_path.display()))?,
    )
    .with_context(|| format!("failed to parse {}", meta_path.display()))?;
    tracing::info!(path = %dir.display(), epoch = meta.epoch, "Loaded checkpoint");
    Ok((model, config, meta))
}
