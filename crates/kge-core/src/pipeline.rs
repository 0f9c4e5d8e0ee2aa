//! Subcommand implementations for the kge-rank CLI.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use burn::backend::ndarray::{NdArray, NdArrayDevice};
use burn::backend::Autodiff;
use burn::module::AutodiffModule;
use burn::prelude::Backend;
use indicatif::{ProgressBar, ProgressStyle};

use corpus::{tile_vectors, Corpus, CorpusLayout, CorpusReader, Split};
use kge::{
    load_checkpoint, train, BatchSampler, EvalReport, LinkPredictor, RankEvaluator, TransE,
    TransEScorer,
};

use crate::config::{
    build_model_config, build_training_config, load_kge_toml, CliOverrides, KgeToml,
};
use crate::results::{
    format_text_summary, now_ms, write_text_summary, EvalRecord, LinkPredictionOutput,
};

type InferBackend = NdArray<f32>;
type TrainBackend = Autodiff<InferBackend>;

/// Arguments for the `train` subcommand.
#[derive(Debug)]
pub struct TrainArgs {
    pub config: PathBuf,
    pub data: PathBuf,
    pub output: PathBuf,
    pub epochs: Option<usize>,
    pub batch_size: Option<usize>,
    pub ratio: Option<usize>,
    pub seed: Option<u64>,
    pub lr: Option<f64>,
    pub entity_vectors: Option<PathBuf>,
    pub relation_vectors: Option<PathBuf>,
    /// Stop after training; write no result files.
    pub no_eval: bool,
}

/// Arguments for the `eval` subcommand.
#[derive(Debug)]
pub struct EvalArgs {
    pub config: PathBuf,
    pub data: PathBuf,
    pub checkpoint: PathBuf,
    pub split: Split,
    pub output: PathBuf,
}

/// Arguments for the `predict` subcommand.
#[derive(Debug)]
pub struct PredictArgs {
    pub config: PathBuf,
    pub data: PathBuf,
    pub checkpoint: PathBuf,
    pub output: PathBuf,
    pub top_k: Option<usize>,
}

/// Arguments for the `summary` subcommand.
#[derive(Debug)]
pub struct SummaryArgs {
    pub data: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// Train TransE on the train split, then evaluate on test and answer link queries.
pub fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    // 1. Load config and apply CLI overrides
    let cli = CliOverrides {
        epochs: args.epochs,
        lr: args.lr,
        batch_size: args.batch_size,
        ratio: args.ratio,
        seed: args.seed,
    };
    let mut toml = load_config_or_default(&args.config)?;
    toml.apply_cli(&cli);
    toml.validate()?;

    // 2. Load corpus
    let corpus = CorpusReader::load_dir(&args.data, &toml.data)?;

    // 3. Build model
    let device = NdArrayDevice::Cpu;
    if let Some(seed) = toml.sampler.seed {
        TrainBackend::seed(seed);
    }
    let model_config = build_model_config(&toml.model, corpus.entities().len(), corpus.relations().len());
    model_config.validate()?;
    let mut model: TransE<TrainBackend> = model_config.init(&device);
    if let (Some(ent_path), Some(rel_path)) = (&args.entity_vectors, &args.relation_vectors) {
        let dim = model_config.embedding_dim;
        let entities = tile_vectors(&CorpusReader::read_vectors(ent_path)?, dim)
            .with_context(|| format!("bad entity vectors {}", ent_path.display()))?;
        let relations = tile_vectors(&CorpusReader::read_vectors(rel_path)?, dim)
            .with_context(|| format!("bad relation vectors {}", rel_path.display()))?;
        model = model.with_pretrained(&entities, &relations)?;
    }

    // 4. Train
    let checkpoint_dir = args.output.join("checkpoints");
    let training_config = build_training_config(&toml.training, &cli, &checkpoint_dir);
    let mut sampler = BatchSampler::new(corpus.index(), corpus.train(), &toml.sampler)?;
    let outcome = train(&training_config, &model_config, model, &mut sampler, &device)?;

    println!("\n--- Training Summary ---");
    println!("Epochs: {}", outcome.epoch_losses.len());
    if let Some(loss) = outcome.epoch_losses.last() {
        println!("Final loss: {loss:.4}");
    }
    if let Some(epoch) = outcome.best_epoch {
        println!("Best epoch: {epoch}");
    }
    println!("Checkpoints: {}", checkpoint_dir.display());

    if args.no_eval {
        println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());
        return Ok(());
    }

    // 5. Evaluate the final weights and answer link queries
    let scorer = TransEScorer::new(outcome.model.valid(), device);
    let eval_start = Instant::now();
    let report = evaluate_split(&corpus, Split::Test, &toml, &scorer)?;
    let record = EvalRecord {
        timestamp_ms: now_ms(),
        dataset: args.data.display().to_string(),
        checkpoint: Some(checkpoint_dir.join("final").display().to_string()),
        split: Split::Test,
        order: toml.eval.order,
        report,
        elapsed_secs: eval_start.elapsed().as_secs_f64(),
    };
    write_eval_outputs(&args.output, &record)?;

    if !corpus.link_queries().is_empty() {
        write_link_predictions(&corpus, &toml, &scorer, &args.output.join("link_prediction.json"))?;
    }

    print_report(&record.report);
    println!("Output: {}", args.output.display());
    println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Filtered ranking evaluation of a saved checkpoint on one split.
pub fn run_eval(args: EvalArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let toml = load_config_or_default(&args.config)?;
    toml.validate()?;
    let corpus = CorpusReader::load_dir(&args.data, &toml.data)?;
    let scorer = load_scorer(&args.checkpoint, &corpus)?;

    let report = evaluate_split(&corpus, args.split, &toml, &scorer)?;
    let record = EvalRecord {
        timestamp_ms: now_ms(),
        dataset: args.data.display().to_string(),
        checkpoint: Some(args.checkpoint.display().to_string()),
        split: args.split,
        order: toml.eval.order,
        report,
        elapsed_secs: start.elapsed().as_secs_f64(),
    };
    write_eval_outputs(&args.output, &record)?;

    print_report(&record.report);
    println!("Output: {}", args.output.display());
    println!("Elapsed: {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Top-k link prediction for every query in the dataset's link-query file.
pub fn run_predict(args: PredictArgs) -> anyhow::Result<()> {
    let mut toml = load_config_or_default(&args.config)?;
    if let Some(k) = args.top_k {
        toml.eval.top_k = k;
    }
    toml.validate()?;
    let corpus = CorpusReader::load_dir(&args.data, &toml.data)?;
    if corpus.link_queries().is_empty() {
        tracing::warn!(
            file = %toml.data.link_queries,
            "No link queries found; writing empty results"
        );
    }
    let scorer = load_scorer(&args.checkpoint, &corpus)?;
    write_link_predictions(&corpus, &toml, &scorer, &args.output)?;

    println!("Queries: {}", corpus.link_queries().len());
    println!("Output: {}", args.output.display());
    Ok(())
}

/// Print statistics for a dataset directory.
pub fn run_summary(args: SummaryArgs) -> anyhow::Result<()> {
    let layout = match &args.config {
        Some(path) => load_kge_toml(path)?.data,
        None => CorpusLayout::default(),
    };
    let corpus = CorpusReader::load_dir(&args.data, &layout)?;
    let summary = corpus.summary();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("--- Corpus Summary ---");
    println!("Directory: {}", args.data.display());
    println!("Entities: {}", summary.entities);
    println!("Relations: {}", summary.relations);
    println!("Train triples: {}", summary.train);
    println!("Valid triples: {}", summary.valid);
    println!("Test triples: {}", summary.test);
    println!("Known triples (distinct): {}", summary.known);
    println!(
        "Link queries: {} (head: {}, tail: {})",
        summary.link_queries_head + summary.link_queries_tail,
        summary.link_queries_head,
        summary.link_queries_tail
    );
    Ok(())
}

/// Load the TOML at `path`, or fall back to defaults if the file does not exist.
fn load_config_or_default(path: &Path) -> anyhow::Result<KgeToml> {
    if path.exists() {
        load_kge_toml(path)
    } else {
        tracing::warn!(path = %path.display(), "Config not found, using defaults");
        Ok(KgeToml::default())
    }
}

fn load_scorer(checkpoint: &Path, corpus: &Corpus) -> anyhow::Result<TransEScorer<InferBackend>> {
    let device = NdArrayDevice::Cpu;
    let (model, model_config, meta) = load_checkpoint::<InferBackend>(checkpoint, &device)?;
    if model_config.num_entities != corpus.entities().len()
        || model_config.num_relations != corpus.relations().len()
    {
        anyhow::bail!(
            "checkpoint {} was trained on {} entities / {} relations, dataset has {} / {}",
            checkpoint.display(),
            model_config.num_entities,
            model_config.num_relations,
            corpus.entities().len(),
            corpus.relations().len()
        );
    }
    tracing::info!(
        epoch = meta.epoch,
        avg_loss = format!("{:.4}", meta.avg_loss),
        dim = model_config.embedding_dim,
        "Using checkpoint"
    );
    Ok(TransEScorer::new(model, device))
}

fn evaluate_split(
    corpus: &Corpus,
    split: Split,
    toml: &KgeToml,
    scorer: &TransEScorer<InferBackend>,
) -> anyhow::Result<EvalReport> {
    let queries = corpus.split(split);
    tracing::info!(%split, queries = queries.len(), "Starting filtered evaluation");

    let pb = ProgressBar::new(queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("=> "),
    );
    pb.set_message(split.to_string());

    let evaluator = RankEvaluator::new(corpus.index(), toml.eval.clone())?;
    let report = evaluator.evaluate_with_progress(queries, scorer, |done| pb.set_position(done as u64))?;
    pb.finish_with_message("done");
    Ok(report)
}

fn write_eval_outputs(dir: &Path, record: &EvalRecord) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    record.write_json(&dir.join("results.json"))?;
    write_text_summary(&dir.join("results.txt"), &record.report)
}

fn write_link_predictions(
    corpus: &Corpus,
    toml: &KgeToml,
    scorer: &TransEScorer<InferBackend>,
    path: &Path,
) -> anyhow::Result<()> {
    let predictor = LinkPredictor::new(corpus.index(), toml.eval.clone())?;
    let predictions = predictor.predict_all(corpus.link_queries(), scorer)?;
    let output = LinkPredictionOutput::from_predictions(&predictions, corpus.entities())?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    output.write_json(path)
}

fn print_report(report: &EvalReport) {
    println!("\n--- Evaluation Summary ---");
    print!("{}", format_text_summary(report));
}
