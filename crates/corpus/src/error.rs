//! Data-integrity errors raised while building vocabularies, indexes and queries.

use crate::types::Triple;

/// Errors from corpus construction. All of them are fatal at load time.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("triple {triple} references entity id outside 0..{entity_count}")]
    EntityOutOfRange { triple: Triple, entity_count: usize },

    #[error("triple {triple} references relation id outside 0..{relation_count}")]
    RelationOutOfRange { triple: Triple, relation_count: usize },

    #[error("duplicate name '{0}' in vocabulary")]
    DuplicateName(String),

    #[error("id {id} assigned to both '{first}' and '{second}'")]
    DuplicateId { id: u32, first: String, second: String },

    #[error("vocabulary ids are not dense: '{name}' has id {id}, expected 0..{len}")]
    SparseIds { name: String, id: u32, len: usize },

    #[error("unknown {kind} '{name}' at {location}")]
    UnknownName {
        kind: &'static str,
        name: String,
        location: String,
    },

    #[error("invalid link query: {0}")]
    InvalidLinkQuery(String),

    #[error("parse error at {location}: {message}")]
    Parse { location: String, message: String },
}
