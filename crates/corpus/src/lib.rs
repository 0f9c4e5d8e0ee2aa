//! Knowledge-graph corpus: triples, vocabularies and the known-true index.
//!
//! Loads a whitespace-separated dataset directory into integer-encoded
//! splits and builds the membership set that negative sampling and
//! filtered ranking consult.

pub mod corpus;
pub mod error;
pub mod index;
pub mod reader;
pub mod types;
pub mod vocab;

pub use corpus::{Corpus, CorpusLayout, CorpusSummary, Split};
pub use error::CorpusError;
pub use index::TripleIndex;
pub use reader::{tile_vectors, CorpusReader};
pub use types::{EntityId, Label, LinkQuery, RelationId, Side, Triple, UNKNOWN_ID};
pub use vocab::Vocab;
