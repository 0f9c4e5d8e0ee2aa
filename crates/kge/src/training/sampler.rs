//! Negative-sampling batch construction over a shuffled training order.
//!
//! A batch holds `P` positives followed by `ratio` tiled copies of them.
//! Copies are corrupted in place: for positive slot `i` the first
//! `ratio / 2` corruptions replace the head and the next `ratio / 2` the
//! tail. Head slots fill rows `P + i*(ratio/2) + j`, tail slots rows
//! `P + P*(ratio/2) + i*(ratio/2) + j`. With an odd ratio the final `P`
//! rows are never reached and stay positive copies labeled +1.

use corpus::{Label, Side, Triple, TripleIndex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::KgeError;

/// Config value that selects an entropy-seeded RNG instead of a fixed seed.
pub const ENTROPY_SEED: &str = "entropy";

/// Sampler settings, read from the `[sampler]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Positives per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Negatives generated per positive.
    #[serde(default = "default_ratio")]
    pub ratio: usize,
    /// Draws allowed per corruption slot before giving up.
    #[serde(default = "default_max_redraws")]
    pub max_redraws: usize,
    /// RNG seed. `None` seeds from entropy; written as `seed = "entropy"`.
    #[serde(
        default = "default_seed",
        serialize_with = "serialize_seed",
        deserialize_with = "deserialize_seed"
    )]
    pub seed: Option<u64>,
}

fn default_batch_size() -> usize {
    128
}
fn default_ratio() -> usize {
    40
}
fn default_max_redraws() -> usize {
    10_000
}
fn default_seed() -> Option<u64> {
    Some(42)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SeedSetting {
    Fixed(u64),
    Named(String),
}

fn deserialize_seed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match SeedSetting::deserialize(deserializer)? {
        SeedSetting::Fixed(seed) => Ok(Some(seed)),
        SeedSetting::Named(name) if name == ENTROPY_SEED => Ok(None),
        SeedSetting::Named(name) => Err(de::Error::custom(format!(
            "seed must be an integer or \"{ENTROPY_SEED}\", got \"{name}\""
        ))),
    }
}

fn serialize_seed<S: Serializer>(seed: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error> {
    match seed {
        Some(seed) => serializer.serialize_u64(*seed),
        None => serializer.serialize_str(ENTROPY_SEED),
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            ratio: default_ratio(),
            max_redraws: default_max_redraws(),
            seed: default_seed(),
        }
    }
}

impl SamplerConfig {
    /// Reject impossible settings and warn about suspicious ones.
    pub fn validate(&self) -> Result<(), KgeError> {
        if self.batch_size == 0 {
            return Err(KgeError::ZeroBatchSize);
        }
        if self.max_redraws == 0 {
            return Err(KgeError::Config("max_redraws must be positive".to_string()));
        }
        if self.ratio == 0 {
            tracing::warn!("ratio = 0: batches will contain no negatives");
        } else if self.ratio % 2 == 1 {
            tracing::warn!(
                ratio = self.ratio,
                "Odd ratio: the last block of each batch stays uncorrupted"
            );
        }
        Ok(())
    }
}

/// One training batch: triples with parallel labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub triples: Vec<Triple>,
    pub labels: Vec<Label>,
    /// Number of positives in the leading block.
    pub positives: usize,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn negatives(&self) -> usize {
        self.labels.iter().filter(|l| **l == Label::Negative).count()
    }

    /// Labels as +1.0 / -1.0.
    pub fn label_values(&self) -> Vec<f32> {
        self.labels.iter().map(|l| l.value()).collect()
    }

    /// `(positive_row, negative_row)` for every negative, pairing each
    /// corrupted row with the positive it was tiled from.
    pub fn negative_pairs(&self) -> Vec<(usize, usize)> {
        if self.positives == 0 {
            return Vec::new();
        }
        self.labels
            .iter()
            .enumerate()
            .skip(self.positives)
            .filter(|(_, l)| **l == Label::Negative)
            .map(|(row, _)| ((row - self.positives) % self.positives, row))
            .collect()
    }
}

/// Builds labeled batches from a training order, rejecting any corruption
/// that is a known-true triple.
pub struct BatchSampler<'a> {
    index: &'a TripleIndex,
    order: Vec<Triple>,
    batch_size: usize,
    ratio: usize,
    max_redraws: usize,
    rng: StdRng,
}

impl<'a> BatchSampler<'a> {
    /// Create a sampler over `train` in its given order.
    pub fn new(
        index: &'a TripleIndex,
        train: &[Triple],
        config: &SamplerConfig,
    ) -> Result<Self, KgeError> {
        if train.is_empty() {
            return Err(KgeError::EmptyTrainingSet);
        }
        config.validate()?;
        for triple in train {
            index.check_range(triple)?;
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sampler = Self {
            index,
            order: train.to_vec(),
            batch_size: config.batch_size,
            ratio: config.ratio,
            max_redraws: config.max_redraws,
            rng,
        };
        tracing::info!(
            positives = sampler.order.len(),
            batch_size = sampler.batch_size,
            ratio = sampler.ratio,
            iterations = sampler.iterations_per_epoch(),
            "BatchSampler initialized"
        );
        Ok(sampler)
    }

    /// Number of batches per epoch; the last may be short.
    pub fn iterations_per_epoch(&self) -> usize {
        self.order.len().div_ceil(self.batch_size)
    }

    /// Current training order.
    pub fn order(&self) -> &[Triple] {
        &self.order
    }

    pub fn ratio(&self) -> usize {
        self.ratio
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Replace the training order with a fresh permutation.
    pub fn reshuffle(&mut self) {
        self.order.shuffle(&mut self.rng);
    }

    /// Build the batch for `iteration` of the current epoch.
    pub fn next_batch(&mut self, iteration: usize) -> Result<Batch, KgeError> {
        let iterations = self.iterations_per_epoch();
        if iteration >= iterations {
            return Err(KgeError::IterationOutOfRange {
                iteration,
                iterations,
            });
        }
        let start = iteration * self.batch_size;
        let end = (start + self.batch_size).min(self.order.len());
        let p = end - start;
        let half = self.ratio / 2;

        let mut triples = Vec::with_capacity(p * (self.ratio + 1));
        triples.extend_from_slice(&self.order[start..end]);
        for _ in 0..self.ratio {
            triples.extend_from_within(..p);
        }
        let mut labels = vec![Label::Positive; triples.len()];

        for i in 0..p {
            for j in 0..half {
                let row = p + i * half + j;
                triples[row] = self.corrupt(triples[row], Side::Head)?;
                labels[row] = Label::Negative;
            }
            for j in 0..half {
                let row = p + p * half + i * half + j;
                triples[row] = self.corrupt(triples[row], Side::Tail)?;
                labels[row] = Label::Negative;
            }
        }

        tracing::debug!(
            iteration,
            positives = p,
            rows = triples.len(),
            "Built batch"
        );
        Ok(Batch {
            triples,
            labels,
            positives: p,
        })
    }

    /// Replace the entity on `side` with a uniform draw that is not known-true.
    fn corrupt(&mut self, base: Triple, side: Side) -> Result<Triple, KgeError> {
        let entity_count = self.index.entity_count() as u32;
        for _ in 0..self.max_redraws {
            let candidate = base.corrupt(side, self.rng.gen_range(0..entity_count));
            if !self.index.contains(&candidate) {
                return Ok(candidate);
            }
        }
        Err(KgeError::SamplingExhausted {
            triple: base,
            side,
            attempts: self.max_redraws,
        })
    }
}
