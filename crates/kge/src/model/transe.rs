use burn::module::Param;
use burn::prelude::*;
use burn::tensor::Distribution;
use corpus::Triple;

use crate::error::KgeError;
use crate::model::bridge::{rows_to_tensor, tensor_to_vec, triples_to_tensors};
use crate::scorer::{ScoredBatch, TripleScorer};

/// Configuration for the TransE translation model.
///
/// ```text
/// score(h, r, t) = || e_h + w_r - e_t ||_p      (lower = more plausible)
/// ```
#[derive(Config, Debug)]
pub struct TransEConfig {
    /// Size of the entity id space.
    pub num_entities: usize,
    /// Size of the relation id space.
    pub num_relations: usize,
    /// Embedding width shared by entities and relations.
    #[config(default = 100)]
    pub embedding_dim: usize,
    /// Order `p` of the distance: 1 or 2.
    #[config(default = 1)]
    pub norm: usize,
}

impl TransEConfig {
    pub fn validate(&self) -> Result<(), KgeError> {
        if self.num_entities == 0 || self.num_relations == 0 {
            return Err(KgeError::Config("entity and relation counts must be positive".into()));
        }
        if self.embedding_dim == 0 {
            return Err(KgeError::Config("embedding_dim must be positive".into()));
        }
        if !matches!(self.norm, 1 | 2) {
            return Err(KgeError::Config(format!("norm must be 1 or 2, got {}", self.norm)));
        }
        Ok(())
    }

    /// Initialize with uniform weights in `±6/sqrt(dim)`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransE<B> {
        let bound = 6.0 / (self.embedding_dim as f64).sqrt();
        TransE {
            entity_embeddings: Param::from_tensor(Tensor::random(
                [self.num_entities, self.embedding_dim],
                Distribution::Uniform(-bound, bound),
                device,
            )),
            relation_embeddings: Param::from_tensor(Tensor::random(
                [self.num_relations, self.embedding_dim],
                Distribution::Uniform(-bound, bound),
                device,
            )),
            norm: self.norm,
        }
    }
}

/// Translation-distance scoring model over learned entity and relation vectors.
#[derive(Module, Debug)]
pub struct TransE<B: Backend> {
    /// `(num_entities, dim)` entity vectors.
    entity_embeddings: Param<Tensor<B, 2>>,
    /// `(num_relations, dim)` relation translations.
    relation_embeddings: Param<Tensor<B, 2>>,
    norm: usize,
}

impl<B: Backend> TransE<B> {
    /// Forward pass over id tensors of shape `(batch,)`.
    ///
    /// Output shape: `(batch,)`
    pub fn forward(
        &self,
        heads: Tensor<B, 1, Int>,
        relations: Tensor<B, 1, Int>,
        tails: Tensor<B, 1, Int>,
    ) -> Tensor<B, 1> {
        let h = self.entity_embeddings.val().select(0, heads);
        let r = self.relation_embeddings.val().select(0, relations);
        let t = self.entity_embeddings.val().select(0, tails);
        let diff = h + r - t;
        let dist = if self.norm == 1 {
            diff.abs().sum_dim(1)
        } else {
            diff.powf_scalar(2.0).sum_dim(1).add_scalar(1e-12).sqrt()
        };
        dist.squeeze::<1>(1)
    }

    /// Score a slice of triples on `device`.
    pub fn score_triples(&self, triples: &[Triple], device: &B::Device) -> Tensor<B, 1> {
        let (h, r, t) = triples_to_tensors::<B>(triples, device);
        self.forward(h, r, t)
    }

    /// Replace both embedding tables with pretrained rows.
    ///
    /// Row counts and widths must match the current tables.
    pub fn with_pretrained(
        mut self,
        entities: &[Vec<f32>],
        relations: &[Vec<f32>],
    ) -> anyhow::Result<Self> {
        let device = self.entity_embeddings.val().device();
        let entity_tensor = rows_to_tensor::<B>(entities, &device)?;
        let relation_tensor = rows_to_tensor::<B>(relations, &device)?;
        if entity_tensor.dims() != self.entity_embeddings.val().dims() {
            anyhow::bail!(
                "pretrained entity table {:?} does not match model {:?}",
                entity_tensor.dims(),
                self.entity_embeddings.val().dims()
            );
        }
        if relation_tensor.dims() != self.relation_embeddings.val().dims() {
            anyhow::bail!(
                "pretrained relation table {:?} does not match model {:?}",
                relation_tensor.dims(),
                self.relation_embeddings.val().dims()
            );
        }
        self.entity_embeddings = Param::from_tensor(entity_tensor);
        self.relation_embeddings = Param::from_tensor(relation_tensor);
        tracing::info!(
            entities = entities.len(),
            relations = relations.len(),
            "Initialized embeddings from pretrained vectors"
        );
        Ok(self)
    }

    pub fn num_entities(&self) -> usize {
        self.entity_embeddings.val().dims()[0]
    }

    pub fn embedding_dim(&self) -> usize {
        self.entity_embeddings.val().dims()[1]
    }
}

/// [`TripleScorer`] over a TransE model on a fixed device.
pub struct TransEScorer<B: Backend> {
    model: TransE<B>,
    device: B::Device,
}

impl<B: Backend> TransEScorer<B> {
    pub fn new(model: TransE<B>, device: B::Device) -> Self {
        Self { model, device }
    }
}

impl<B: Backend> TripleScorer for TransEScorer<B> {
    fn score(&self, triples: &[Triple]) -> anyhow::Result<ScoredBatch> {
        if triples.is_empty() {
            return Ok(ScoredBatch::default());
        }
        let scores = tensor_to_vec(self.model.score_triples(triples, &self.device))?;
        Ok(ScoredBatch::from_scores(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;
    use burn::backend::Autodiff;

    type TestBackend = NdArray<f32>;
    type TestAutodiffBackend = Autodiff<NdArray<f32>>;

    fn toy_model(norm: usize) -> TransE<TestBackend> {
        let device = Default::default();
        TransEConfig::new(3, 1)
            .with_embedding_dim(2)
            .with_norm(norm)
            .init::<TestBackend>(&device)
            .with_pretrained(
                &[vec![0.0, 0.0], vec![1.0, 0.0], vec![1.0, 1.0]],
                &[vec![1.0, 0.0]],
            )
            .unwrap()
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let model = TransEConfig::new(10, 3)
            .with_embedding_dim(8)
            .init::<TestBackend>(&device);
        let triples: Vec<Triple> = (0..5).map(|i| Triple::new(i, i % 3, i + 1)).collect();
        let out = model.score_triples(&triples, &device);
        assert_eq!(out.dims(), [5]);
        assert_eq!(model.num_entities(), 10);
        assert_eq!(model.embedding_dim(), 8);
    }

    #[test]
    fn test_l1_distances() {
        let scorer = TransEScorer::new(toy_model(1), Default::default());
        let out = scorer
            .score(&[Triple::new(0, 0, 1), Triple::new(0, 0, 2), Triple::new(2, 0, 0)])
            .unwrap();
        let expected = [0.0, 1.0, 3.0];
        for (got, want) in out.scores.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_l2_distances() {
        let scorer = TransEScorer::new(toy_model(2), Default::default());
        let out = scorer.score(&[Triple::new(0, 0, 2), Triple::new(2, 0, 0)]).unwrap();
        assert!((out.scores[0] - 1.0).abs() < 1e-4);
        assert!((out.scores[1] - 5.0f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_empty_batch() {
        let scorer = TransEScorer::new(toy_model(1), Default::default());
        assert!(scorer.score(&[]).unwrap().scores.is_empty());
    }

    #[test]
    fn test_pretrained_shape_mismatch() {
        let device = Default::default();
        let model = TransEConfig::new(3, 1)
            .with_embedding_dim(2)
            .init::<TestBackend>(&device);
        assert!(model
            .with_pretrained(&[vec![0.0, 0.0]], &[vec![1.0, 0.0]])
            .is_err());
    }

    #[test]
    fn test_validate() {
        assert!(TransEConfig::new(3, 1).validate().is_ok());
        assert!(TransEConfig::new(3, 1).with_norm(3).validate().is_err());
        assert!(TransEConfig::new(0, 1).validate().is_err());
        assert!(TransEConfig::new(3, 1).with_embedding_dim(0).validate().is_err());
    }

    #[test]
    fn test_gradient_reaches_embeddings() {
        use burn::optim::GradientsParams;

        let device = Default::default();
        let model = TransEConfig::new(4, 2)
            .with_embedding_dim(3)
            .init::<TestAutodiffBackend>(&device);
        let loss = model
            .score_triples(&[Triple::new(0, 1, 2), Triple::new(3, 0, 1)], &device)
            .sum();
        let grads = GradientsParams::from_grads(loss.backward(), &model);

        let entity_grad = grads
            .get::<NdArray<f32>, 2>(model.entity_embeddings.id)
            .expect("entity embeddings should have gradient");
        let sum: f32 = entity_grad.abs().sum().into_scalar().elem();
        assert!(sum > 0.0, "entity gradient is zero");

        let relation_grad = grads
            .get::<NdArray<f32>, 2>(model.relation_embeddings.id)
            .expect("relation embeddings should have gradient");
        let sum: f32 = relation_grad.abs().sum().into_scalar().elem();
        assert!(sum > 0.0, "relation gradient is zero");
    }
}
