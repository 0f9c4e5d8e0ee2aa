//! A loaded dataset: vocabularies, splits, link queries and the known-true index.

use crate::error::CorpusError;
use crate::index::TripleIndex;
use crate::types::{LinkQuery, Side, Triple};
use crate::vocab::Vocab;
use serde::{Deserialize, Serialize};

/// File names inside a dataset directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusLayout {
    #[serde(default = "default_entities")]
    pub entities: String,
    #[serde(default = "default_relations")]
    pub relations: String,
    #[serde(default = "default_train")]
    pub train: String,
    #[serde(default = "default_valid")]
    pub valid: String,
    #[serde(default = "default_test")]
    pub test: String,
    /// Optional: a missing file yields no link queries.
    #[serde(default = "default_link_queries")]
    pub link_queries: String,
}

fn default_entities() -> String {
    "entity2id.txt".to_string()
}
fn default_relations() -> String {
    "relation2id.txt".to_string()
}
fn default_train() -> String {
    "train.txt".to_string()
}
fn default_valid() -> String {
    "valid.txt".to_string()
}
fn default_test() -> String {
    "test.txt".to_string()
}
fn default_link_queries() -> String {
    "link_prediction.txt".to_string()
}

impl Default for CorpusLayout {
    fn default() -> Self {
        Self {
            entities: default_entities(),
            relations: default_relations(),
            train: default_train(),
            valid: default_valid(),
            test: default_test(),
            link_queries: default_link_queries(),
        }
    }
}

/// Everything the sampler and evaluator consume, built once at startup.
#[derive(Debug, Clone)]
///
/// Read-only after [`Corpus::new`]: the splits and the index always agree.
pub struct Corpus {
    entities: Vocab,
    relations: Vocab,
    train: Vec<Triple>,
    valid: Vec<Triple>,
    test: Vec<Triple>,
    link_queries: Vec<LinkQuery>,
    index: TripleIndex,
}

impl Corpus {
    /// Assemble a corpus and build its [`TripleIndex`] from train, valid and test.
    pub fn new(
        entities: Vocab,
        relations: Vocab,
        train: Vec<Triple>,
        valid: Vec<Triple>,
        test: Vec<Triple>,
        link_queries: Vec<LinkQuery>,
    ) -> Result<Self, CorpusError> {
        let index = TripleIndex::build(
            entities.len(),
            relations.len(),
            [train.as_slice(), valid.as_slice(), test.as_slice()],
        )?;
        for query in &link_queries {
            // Any entity fills the unknown slot for the range check.
            index.check_range(&query.complete(0)).map_err(|_| {
                CorpusError::InvalidLinkQuery(format!("{query} references an unknown id"))
            })?;
        }

        let corpus = Self {
            entities,
            relations,
            train,
            valid,
            test,
            link_queries,
            index,
        };
        let summary = corpus.summary();
        tracing::info!(
            entities = summary.entities,
            relations = summary.relations,
            train = summary.train,
            valid = summary.valid,
            test = summary.test,
            known = summary.known,
            "Loaded corpus"
        );
        Ok(corpus)
    }

    pub fn index(&self) -> &TripleIndex {
        &self.index
    }

    pub fn entities(&self) -> &Vocab {
        &self.entities
    }

    pub fn relations(&self) -> &Vocab {
        &self.relations
    }

    pub fn train(&self) -> &[Triple] {
        &self.train
    }

    pub fn valid(&self) -> &[Triple] {
        &self.valid
    }

    pub fn test(&self) -> &[Triple] {
        &self.test
    }

    pub fn link_queries(&self) -> &[LinkQuery] {
        &self.link_queries
    }

    /// Triples of a named split.
    pub fn split(&self, split: Split) -> &[Triple] {
        match split {
            Split::Train => &self.train,
            Split::Valid => &self.valid,
            Split::Test => &self.test,
        }
    }

    pub fn summary(&self) -> CorpusSummary {
        let unknown_heads = self
            .link_queries
            .iter()
            .filter(|q| q.side() == Side::Head)
            .count();
        CorpusSummary {
            entities: self.entities.len(),
            relations: self.relations.len(),
            train: self.train.len(),
            valid: self.valid.len(),
            test: self.test.len(),
            known: self.index.len(),
            link_queries_head: unknown_heads,
            link_queries_tail: self.link_queries.len() - unknown_heads,
        }
    }
}

/// Named dataset split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
    Test,
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Train => write!(f, "train"),
            Self::Valid => write!(f, "valid"),
            Self::Test => write!(f, "test"),
        }
    }
}

impl std::str::FromStr for Split {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "valid" => Ok(Self::Valid),
            "test" => Ok(Self::Test),
            other => Err(format!("unknown split '{other}' (expected train, valid or test)")),
        }
    }
}

/// Quick statistics over a loaded corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusSummary {
    /// Size of the entity id space.
    pub entities: usize,
    /// Size of the relation id space.
    pub relations: usize,
    /// Number of training triples (duplicates included).
    pub train: usize,
    /// Number of validation triples.
    pub valid: usize,
    /// Number of test triples.
    pub test: usize,
    /// Distinct triples in the known-true index.
    pub known: usize,
    /// Link queries with an unknown head.
    pub link_queries_head: usize,
    /// Link queries with an unknown tail.
    pub link_queries_tail: usize,
}
