//! Integration tests for the kge crate.
//!
//! These run full pipelines over an in-memory corpus: sampling → training →
//! filtered evaluation → link prediction. Mock scorers cover the evaluator
//! contract; the burn NdArray backend covers the real model.

use burn::backend::ndarray::NdArray;
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use corpus::{Corpus, Label, LinkQuery, Side, Triple, Vocab};
use kge::eval::ranking::filtered_pool;
use kge::mocks::{FnScorer, RecordingScorer};
use kge::{
    train, BatchSampler, EvalConfig, LinkPredictor, RankEvaluator, SamplerConfig, ScoreOrder,
    TrainingConfig, TransEConfig, TransEScorer,
};

type TestBackend = NdArray<f32>;
type TestAutodiffBackend = Autodiff<NdArray<f32>>;

/// Ring of 12 entities with "next" (relation 0) and "prev" (relation 1).
fn ring_corpus() -> Corpus {
    let n = 12u32;
    let entities = Vocab::from_names((0..n).map(|i| format!("node{i}"))).unwrap();
    let relations = Vocab::from_names(["next", "prev"]).unwrap();
    let mut all = Vec::new();
    for i in 0..n {
        all.push(Triple::new(i, 0, (i + 1) % n));
        all.push(Triple::new((i + 1) % n, 1, i));
    }
    let test = all.split_off(20);
    let valid = all.split_off(18);
    Corpus::new(
        entities,
        relations,
        all,
        valid,
        test,
        vec![
            LinkQuery::Tail { head: 3, relation: 0 },
            LinkQuery::Head { relation: 1, tail: 7 },
        ],
    )
    .unwrap()
}

#[test]
fn test_sampler_over_corpus_respects_index() {
    let corpus = ring_corpus();
    let config = SamplerConfig {
        batch_size: 5,
        ratio: 6,
        ..Default::default()
    };
    let mut sampler = BatchSampler::new(corpus.index(), corpus.train(), &config).unwrap();
    assert_eq!(sampler.iterations_per_epoch(), 4);

    let mut rows = 0;
    for epoch in 0..3 {
        sampler.reshuffle();
        for it in 0..sampler.iterations_per_epoch() {
            let batch = sampler.next_batch(it).unwrap();
            assert_eq!(batch.len(), batch.positives * 7, "epoch {epoch} it {it}");
            assert_eq!(batch.negatives(), batch.positives * 6);
            for (t, l) in batch.triples.iter().zip(&batch.labels) {
                if *l == Label::Negative {
                    assert!(!corpus.index().contains(t));
                }
            }
            rows += batch.positives;
        }
    }
    assert_eq!(rows, corpus.train().len() * 3);
}

#[test]
fn test_oracle_scorer_ranks_first() {
    let corpus = ring_corpus();
    // Distance 0 for true "next"/"prev" facts, 1 otherwise.
    let n = corpus.entities().len() as u32;
    let oracle = FnScorer::new(move |t: &Triple| {
        let ok = match t.relation {
            0 => (t.head + 1) % n == t.tail,
            _ => (t.tail + 1) % n == t.head,
        };
        if ok {
            0.0
        } else {
            1.0
        }
    });
    let evaluator = RankEvaluator::new(corpus.index(), EvalConfig::default()).unwrap();
    let report = evaluator.evaluate(corpus.test(), &oracle).unwrap();
    assert_eq!(report.head.hits_at_1, 1.0);
    assert_eq!(report.tail.hits_at_1, 1.0);
    assert_eq!(report.combined.mean_rank, 1.0);
    assert_eq!(report.combined.mean_reciprocal_rank, 1.0);

    // The same oracle read as a similarity ranks every query last among ties.
    let reversed = RankEvaluator::new(
        corpus.index(),
        EvalConfig {
            order: ScoreOrder::HigherIsBetter,
            ..Default::default()
        },
    )
    .unwrap();
    let report = reversed.evaluate(corpus.test(), &oracle).unwrap();
    assert!(report.combined.mean_rank > 1.0);
}

#[test]
fn test_chunked_evaluation_matches_unchunked() {
    let corpus = ring_corpus();
    let scorer = RecordingScorer::new(FnScorer::new(|t: &Triple| {
        ((t.head * 31 + t.relation * 17 + t.tail * 7) % 11) as f32
    }));
    let whole = RankEvaluator::new(corpus.index(), EvalConfig::default())
        .unwrap()
        .evaluate(corpus.test(), &scorer)
        .unwrap();
    let chunked = RankEvaluator::new(
        corpus.index(),
        EvalConfig {
            chunk_size: Some(5),
            ..Default::default()
        },
    )
    .unwrap()
    .evaluate(corpus.test(), &scorer)
    .unwrap();
    assert_eq!(whole, chunked);
    assert!(scorer.batch_sizes().iter().any(|&s| s == 5));

    // Every scored pool starts with its query and holds no other known triple.
    for query in corpus.test() {
        for side in Side::BOTH {
            let pool = filtered_pool(corpus.index(), *query, side);
            assert_eq!(pool[0], *query);
            assert!(pool[1..].iter().all(|t| !corpus.index().contains(t)));
        }
    }
}

#[test]
fn test_train_then_evaluate_transe() {
    let corpus = ring_corpus();
    let tmp = tempfile::tempdir().unwrap();
    let device = Default::default();

    let mut sampler = BatchSampler::new(
        corpus.index(),
        corpus.train(),
        &SamplerConfig {
            batch_size: 6,
            ratio: 4,
            ..Default::default()
        },
    )
    .unwrap();
    let model_config = TransEConfig::new(corpus.entities().len(), corpus.relations().len())
        .with_embedding_dim(8);
    let model = model_config.init::<TestAutodiffBackend>(&device);
    let config = TrainingConfig::new()
        .with_epochs(5)
        .with_lr(1e-2)
        .with_margin(1.0)
        .with_checkpoint_dir(tmp.path().to_string_lossy().into_owned());

    let outcome = train(&config, &model_config, model, &mut sampler, &device).unwrap();
    assert_eq!(outcome.epoch_losses.len(), 5);

    let scorer = TransEScorer::<TestBackend>::new(outcome.model.valid(), device);
    let evaluator = RankEvaluator::new(corpus.index(), EvalConfig::default()).unwrap();
    let report = evaluator.evaluate(corpus.test(), &scorer).unwrap();
    assert_eq!(report.head.num_queries, corpus.test().len());
    assert!(report.combined.mean_rank >= 1.0);
    assert!(report.combined.mean_rank <= corpus.entities().len() as f64);
    assert!(report.combined.hits_at_1 <= report.combined.hits_at_3);
    assert!(report.combined.hits_at_10 <= report.combined.hits_at_100);

    let predictor = LinkPredictor::new(corpus.index(), EvalConfig::default()).unwrap();
    let predictions = predictor.predict_all(corpus.link_queries(), &scorer).unwrap();
    assert_eq!(predictions.len(), 2);
    for p in &predictions {
        assert_eq!(p.entities.len(), 10);
        for pair in p.scores.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }
}
