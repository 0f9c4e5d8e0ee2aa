use corpus::{Side, Triple};

/// Errors from batch construction, scoring and evaluation.
#[derive(Debug, thiserror::Error)]
pub enum KgeError {
    /// No positives to sample batches from.
    #[error("training split is empty")]
    EmptyTrainingSet,

    #[error("batch size must be positive")]
    ZeroBatchSize,

    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("iteration {iteration} out of range: epoch has {iterations} iterations")]
    IterationOutOfRange { iteration: usize, iterations: usize },

    /// Rejection sampling hit its redraw cap without finding a false triple.
    #[error("no negative found for {triple} ({side} corruption) after {attempts} draws")]
    SamplingExhausted {
        triple: Triple,
        side: Side,
        attempts: usize,
    },

    /// Error from the scoring collaborator, passed through as-is.
    #[error("Scorer error: {0}")]
    Scorer(#[source] anyhow::Error),

    #[error("scorer returned {got} scores for {expected} triples")]
    ScoreShape { expected: usize, got: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Corpus(#[from] corpus::CorpusError),
}
