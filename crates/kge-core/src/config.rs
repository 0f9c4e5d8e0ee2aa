//! TOML config loading for the kge-rank CLI.
//!
//! Deserializes `configs/kge.toml` which has `[data]`, `[sampler]`, `[model]`,
//! `[training]` and `[eval]` sections, then merges with CLI overrides.

use std::path::Path;

use anyhow::Context;
use corpus::CorpusLayout;
use kge::{EvalConfig, SamplerConfig, TrainingConfig, TransEConfig};
use serde::Deserialize;

/// Top-level structure matching `configs/kge.toml`. Every section is optional.
#[derive(Debug, Default, Deserialize)]
pub struct KgeToml {
    /// Dataset file names.
    #[serde(default)]
    pub data: CorpusLayout,
    /// Batch construction parameters.
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Model hyperparameters.
    #[serde(default)]
    pub model: ModelOverrides,
    /// Training loop hyperparameters.
    #[serde(default)]
    pub training: TrainingOverrides,
    /// Evaluation and link prediction parameters.
    #[serde(default)]
    pub eval: EvalConfig,
}

/// Optional overrides for `TransEConfig`. Entity and relation counts come
/// from the corpus.
#[derive(Debug, Default, Deserialize)]
pub struct ModelOverrides {
    pub embedding_dim: Option<usize>,
    pub norm: Option<usize>,
}

/// Optional overrides for `TrainingConfig`.
#[derive(Debug, Default, Deserialize)]
pub struct TrainingOverrides {
    pub epochs: Option<usize>,
    pub lr: Option<f64>,
    pub weight_decay: Option<f64>,
    pub step_size: Option<usize>,
    pub gamma: Option<f64>,
    pub margin: Option<f64>,
    pub log_interval: Option<usize>,
}

/// CLI flags that take priority over `[sampler]` and `[training]`.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub epochs: Option<usize>,
    pub lr: Option<f64>,
    pub batch_size: Option<usize>,
    pub ratio: Option<usize>,
    pub seed: Option<u64>,
}

impl KgeToml {
    /// Check every section, failing on impossible values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.sampler.validate()?;
        self.eval.validate()?;
        if let Some(norm) = self.model.norm {
            if !matches!(norm, 1 | 2) {
                anyhow::bail!("[model] norm must be 1 or 2, got {norm}");
            }
        }
        if let Some(gamma) = self.training.gamma {
            if gamma <= 0.0 || gamma > 1.0 {
                tracing::warn!(gamma, "[training] gamma outside (0, 1]: LR will not decay normally");
            }
        }
        Ok(())
    }

    /// Apply CLI sampler overrides in place.
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(n) = cli.batch_size {
            self.sampler.batch_size = n;
        }
        if let Some(n) = cli.ratio {
            self.sampler.ratio = n;
        }
        if let Some(seed) = cli.seed {
            self.sampler.seed = Some(seed);
        }
    }
}

/// Load and deserialize a `KgeToml` from a TOML file.
pub fn load_kge_toml(path: &Path) -> anyhow::Result<KgeToml> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: KgeToml =
        toml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))?;
    tracing::info!(path = %path.display(), "Loaded kge config");
    Ok(config)
}

/// Build a `TransEConfig` for a corpus of the given size.
///
/// Priority chain: `TransEConfig` defaults < TOML values.
pub fn build_model_config(
    overrides: &ModelOverrides,
    num_entities: usize,
    num_relations: usize,
) -> TransEConfig {
    let mut config = TransEConfig::new(num_entities, num_relations);
    if let Some(dim) = overrides.embedding_dim {
        config.embedding_dim = dim;
    }
    if let Some(norm) = overrides.norm {
        config.norm = norm;
    }
    config
}

/// Build a `TrainingConfig` writing checkpoints to `checkpoint_dir`.
///
/// Priority chain: `TrainingConfig` defaults < TOML values < CLI flags.
pub fn build_training_config(
    overrides: &TrainingOverrides,
    cli: &CliOverrides,
    checkpoint_dir: &Path,
) -> TrainingConfig {
    let mut config =
        TrainingConfig::new().with_checkpoint_dir(checkpoint_dir.to_string_lossy().into_owned());

    // Apply TOML overrides
    if let Some(n) = overrides.epochs {
        config.epochs = n;
    }
    if let Some(x) = overrides.lr {
        config.lr = x;
    }
    if let Some(x) = overrides.weight_decay {
        config.weight_decay = x;
    }
    if let Some(n) = overrides.step_size {
        config.step_size = n;
    }
    if let Some(x) = overrides.gamma {
        config.gamma = x;
    }
    if let Some(x) = overrides.margin {
        config.margin = x;
    }
    if let Some(n) = overrides.log_interval {
        config.log_interval = n;
    }

    // CLI overrides take highest priority
    if let Some(n) = cli.epochs {
        config.epochs = n;
    }
    if let Some(x) = cli.lr {
        config.lr = x;
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use kge::ScoreOrder;

    #[test]
    fn test_deserialize_full_toml() {
        let toml_str = r#"
[data]
train = "train2id.txt"

[sampler]
batch_size = 64
ratio = 10
seed = 7

[model]
embedding_dim = 50
norm = 2

[training]
epochs = 100
lr = 0.01
margin = 1.0

[eval]
chunk_size = 4096
order = "higher_is_better"
top_k = 5
"#;
        let config: KgeToml = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data.train, "train2id.txt");
        assert_eq!(config.data.test, "test.txt");
        assert_eq!(config.sampler.batch_size, 64);
        assert_eq!(config.sampler.ratio, 10);
        assert_eq!(config.sampler.seed, Some(7));
        assert_eq!(config.sampler.max_redraws, 10_000);
        assert_eq!(config.model.embedding_dim, Some(50));
        assert_eq!(config.training.epochs, Some(100));
        assert!(config.training.gamma.is_none());
        assert_eq!(config.eval.chunk_size, Some(4096));
        assert_eq!(config.eval.order, ScoreOrder::HigherIsBetter);
        assert_eq!(config.eval.top_k, 5);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: KgeToml = toml::from_str("").unwrap();
        assert_eq!(config.sampler, SamplerConfig::default());
        assert_eq!(config.sampler.batch_size, 128);
        assert_eq!(config.sampler.ratio, 40);
        assert_eq!(config.sampler.seed, Some(42));
        assert_eq!(config.eval, EvalConfig::default());
        assert_eq!(config.data, CorpusLayout::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_entropy_seed_from_toml() {
        let config: KgeToml = toml::from_str("[sampler]\nseed = \"entropy\"\n").unwrap();
        assert_eq!(config.sampler.seed, None);
        let config: KgeToml = toml::from_str("[sampler]\nseed = 9\n").unwrap();
        assert_eq!(config.sampler.seed, Some(9));
        assert!(toml::from_str::<KgeToml>("[sampler]\nseed = \"often\"\n").is_err());

        // A CLI seed replaces entropy seeding.
        let mut config: KgeToml = toml::from_str("[sampler]\nseed = \"entropy\"\n").unwrap();
        config.apply_cli(&CliOverrides {
            seed: Some(5),
            ..Default::default()
        });
        assert_eq!(config.sampler.seed, Some(5));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config: KgeToml = toml::from_str("[sampler]\nbatch_size = 0\n").unwrap();
        assert!(config.validate().is_err());
        let config: KgeToml = toml::from_str("[eval]\nchunk_size = 0\n").unwrap();
        assert!(config.validate().is_err());
        let config: KgeToml = toml::from_str("[model]\nnorm = 3\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_override_priority() {
        let overrides = TrainingOverrides {
            epochs: Some(10),
            lr: Some(0.1),
            margin: Some(2.0),
            ..Default::default()
        };
        let cli = CliOverrides {
            epochs: Some(3),
            ..Default::default()
        };
        let config = build_training_config(&overrides, &cli, Path::new("/tmp/ckpt"));
        assert_eq!(config.epochs, 3);
        assert!((config.lr - 0.1).abs() < 1e-12);
        assert!((config.margin - 2.0).abs() < 1e-12);
        assert_eq!(config.step_size, 25);
        assert_eq!(config.checkpoint_dir, "/tmp/ckpt");

        let mut toml: KgeToml = toml::from_str("[sampler]\nbatch_size = 32\n").unwrap();
        toml.apply_cli(&CliOverrides {
            ratio: Some(4),
            seed: Some(1),
            ..Default::default()
        });
        assert_eq!(toml.sampler.batch_size, 32);
        assert_eq!(toml.sampler.ratio, 4);
        assert_eq!(toml.sampler.seed, Some(1));
    }

    #[test]
    fn test_build_model_config() {
        let config = build_model_config(
            &ModelOverrides {
                embedding_dim: Some(32),
                norm: None,
            },
            100,
            7,
        );
        assert_eq!(config.num_entities, 100);
        assert_eq!(config.num_relations, 7);
        assert_eq!(config.embedding_dim, 32);
        assert_eq!(config.norm, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_kge_toml(Path::new("/nonexistent/kge.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/kge.toml"));
    }
}
