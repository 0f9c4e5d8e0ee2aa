//! Result records written after evaluation and link prediction.

use std::path::Path;

use anyhow::Context;
use corpus::{Split, Vocab};
use kge::{EvalReport, LinkPrediction, ScoreOrder, SideMetrics};
use serde::{Deserialize, Serialize};

/// One filtered-ranking evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRecord {
    /// Unix timestamp in milliseconds when the evaluation finished.
    pub timestamp_ms: u64,
    /// Dataset directory.
    pub dataset: String,
    /// Checkpoint directory, if a saved model was evaluated.
    pub checkpoint: Option<String>,
    /// Split the queries came from.
    pub split: Split,
    /// Score direction used for ranking.
    pub order: ScoreOrder,
    /// Head, tail and combined metrics.
    pub report: EvalReport,
    /// Wall-clock time of the pass in seconds.
    pub elapsed_secs: f64,
}

impl EvalRecord {
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote evaluation record");
        Ok(())
    }

    pub fn read_json(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// Human-readable metrics, one block per side.
pub fn format_text_summary(report: &EvalReport) -> String {
    let mut out = String::new();
    for (name, m) in [
        ("head", &report.head),
        ("tail", &report.tail),
        ("combined", &report.combined),
    ] {
        out.push_str(&format_side(name, m));
    }
    out
}

fn format_side(name: &str, m: &SideMetrics) -> String {
    format!(
        "-- {name} ({} queries) --\n\
         Hits @1: {:.4}\n\
         Hits @3: {:.4}\n\
         Hits @10: {:.4}\n\
         Hits @100: {:.4}\n\
         Mean rank: {:.4}\n\
         Mean reciprocal rank: {:.4}\n",
        m.num_queries,
        m.hits_at_1,
        m.hits_at_3,
        m.hits_at_10,
        m.hits_at_100,
        m.mean_rank,
        m.mean_reciprocal_rank,
    )
}

pub fn write_text_summary(path: &Path, report: &EvalReport) -> anyhow::Result<()> {
    std::fs::write(path, format_text_summary(report))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Link predictions mapped back to entity names: `{"results": [[name, ...], ...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPredictionOutput {
    pub results: Vec<Vec<String>>,
}

impl LinkPredictionOutput {
    pub fn from_predictions(predictions: &[LinkPrediction], entities: &Vocab) -> anyhow::Result<Self> {
        let results = predictions
            .iter()
            .map(|p| {
                p.entities
                    .iter()
                    .map(|&id| {
                        entities
                            .name(id)
                            .map(str::to_string)
                            .ok_or_else(|| anyhow::anyhow!("entity id {id} has no name"))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { results })
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), queries = self.results.len(), "Wrote link predictions");
        Ok(())
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
