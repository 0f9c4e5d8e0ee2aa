mod config;
mod pipeline;
pub mod results;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use corpus::Split;
use tracing_subscriber::EnvFilter;

use pipeline::{EvalArgs, PredictArgs, SummaryArgs, TrainArgs};

/// kge-rank: train and evaluate translational knowledge-graph embeddings.
#[derive(Parser)]
#[command(name = "kge-rank", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands for training, filtered evaluation and link prediction.
#[derive(Subcommand)]
enum Command {
    /// Train a TransE model, then evaluate it on the test split.
    Train {
        /// Path to the kge config TOML file. Defaults apply if it is missing.
        #[arg(long, default_value = "configs/kge.toml")]
        config: PathBuf,
        /// Dataset directory holding the dictionaries and triple files.
        #[arg(long)]
        data: PathBuf,
        /// Output directory for checkpoints and result files.
        #[arg(long, default_value = "output/kge")]
        output: PathBuf,
        /// Override the number of training epochs.
        #[arg(long)]
        epochs: Option<usize>,
        /// Override the number of positives per batch.
        #[arg(long)]
        batch_size: Option<usize>,
        /// Override the number of negatives per positive.
        #[arg(long)]
        ratio: Option<usize>,
        /// Override the sampler and weight-init seed.
        #[arg(long)]
        seed: Option<u64>,
        /// Override the base learning rate.
        #[arg(long)]
        lr: Option<f64>,
        /// Pretrained entity vectors, one row per entity id. Requires --relation-vectors.
        #[arg(long, requires = "relation_vectors")]
        entity_vectors: Option<PathBuf>,
        /// Pretrained relation vectors, one row per relation id. Requires --entity-vectors.
        #[arg(long, requires = "entity_vectors")]
        relation_vectors: Option<PathBuf>,
        /// Skip the evaluation and link prediction passes after training.
        #[arg(long)]
        no_eval: bool,
    },
    /// Run filtered ranking evaluation for a saved checkpoint.
    Eval {
        /// Path to the kge config TOML file. Defaults apply if it is missing.
        #[arg(long, default_value = "configs/kge.toml")]
        config: PathBuf,
        /// Dataset directory holding the dictionaries and triple files.
        #[arg(long)]
        data: PathBuf,
        /// Checkpoint directory (e.g. output/kge/checkpoints/best).
        #[arg(long)]
        checkpoint: PathBuf,
        /// Split whose triples are the queries: train, valid or test.
        #[arg(long, default_value = "test")]
        split: Split,
        /// Directory for results.json and results.txt.
        #[arg(long)]
        output: PathBuf,
    },
    /// Answer the dataset's link queries with a saved checkpoint.
    Predict {
        /// Path to the kge config TOML file. Defaults apply if it is missing.
        #[arg(long, default_value = "configs/kge.toml")]
        config: PathBuf,
        /// Dataset directory holding the dictionaries and link-query file.
        #[arg(long)]
        data: PathBuf,
        /// Checkpoint directory (e.g. output/kge/checkpoints/best).
        #[arg(long)]
        checkpoint: PathBuf,
        /// Path for the output JSON file.
        #[arg(long)]
        output: PathBuf,
        /// Override the number of candidates returned per query.
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Print statistics for a dataset directory.
    Summary {
        /// Dataset directory holding the dictionaries and triple files.
        #[arg(long)]
        data: PathBuf,
        /// Optional config TOML whose [data] section names the files.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output as JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            config,
            data,
            output,
            epochs,
            batch_size,
            ratio,
            seed,
            lr,
            entity_vectors,
            relation_vectors,
            no_eval,
        } => pipeline::run_train(TrainArgs {
            config,
            data,
            output,
            epochs,
            batch_size,
            ratio,
            seed,
            lr,
            entity_vectors,
            relation_vectors,
            no_eval,
        }),
        Command::Eval {
            config,
            data,
            checkpoint,
            split,
            output,
        } => pipeline::run_eval(EvalArgs {
            config,
            data,
            checkpoint,
            split,
            output,
        }),
        Command::Predict {
            config,
            data,
            checkpoint,
            output,
            top_k,
        } => pipeline::run_predict(PredictArgs {
            config,
            data,
            checkpoint,
            output,
            top_k,
        }),
        Command::Summary { data, config, json } => {
            pipeline::run_summary(SummaryArgs { data, config, json })
        }
    }
}
