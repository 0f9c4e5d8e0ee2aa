//! Core value types: triples, labels, corruption sides and link queries.

use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense zero-based entity identifier.
pub type EntityId = u32;
/// Dense zero-based relation identifier.
pub type RelationId = u32;

/// Sentinel marking the unknown position of a raw link query.
pub const UNKNOWN_ID: i64 = -1;

/// An immutable (head, relation, tail) fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub head: EntityId,
    pub relation: RelationId,
    pub tail: EntityId,
}

impl Triple {
    pub const fn new(head: EntityId, relation: RelationId, tail: EntityId) -> Self {
        Self {
            head,
            relation,
            tail,
        }
    }

    /// Copy of this triple with the head replaced.
    pub fn with_head(self, head: EntityId) -> Self {
        Self { head, ..self }
    }

    /// Copy of this triple with the tail replaced.
    pub fn with_tail(self, tail: EntityId) -> Self {
        Self { tail, ..self }
    }

    /// Copy of this triple with the entity on `side` replaced.
    pub fn corrupt(self, side: Side, entity: EntityId) -> Self {
        match side {
            Side::Head => self.with_head(entity),
            Side::Tail => self.with_tail(entity),
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.relation, self.tail)
    }
}

/// Training label: an observed fact or a synthesized corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Negative,
}

impl Label {
    /// Numeric form used by losses: +1 or -1.
    pub fn value(self) -> f32 {
        match self {
            Self::Positive => 1.0,
            Self::Negative => -1.0,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

/// Which entity position of a triple is corrupted or predicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Head,
    Tail,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Head, Side::Tail];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "head"),
            Self::Tail => write!(f, "tail"),
        }
    }
}

/// A query with exactly one unknown entity position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "unknown", rename_all = "lowercase")]
pub enum LinkQuery {
    /// `(?, relation, tail)`
    Head { relation: RelationId, tail: EntityId },
    /// `(head, relation, ?)`
    Tail { head: EntityId, relation: RelationId },
}

impl LinkQuery {
    /// Build from raw integer ids where [`UNKNOWN_ID`] marks the unknown slot.
    ///
    /// Exactly one of `head` and `tail` must be the sentinel; every other id
    /// must be non-negative.
    pub fn from_raw(head: i64, relation: i64, tail: i64) -> Result<Self, CorpusError> {
        let relation = to_id(relation, "relation")?;
        match (head == UNKNOWN_ID, tail == UNKNOWN_ID) {
            (true, false) => Ok(Self::Head {
                relation,
                tail: to_id(tail, "tail")?,
            }),
            (false, true) => Ok(Self::Tail {
                head: to_id(head, "head")?,
                relation,
            }),
            (true, true) => Err(CorpusError::InvalidLinkQuery(
                "both head and tail are unknown".to_string(),
            )),
            (false, false) => Err(CorpusError::InvalidLinkQuery(format!(
                "({head}, {relation}, {tail}) has no unknown position"
            ))),
        }
    }

    /// The position being predicted.
    pub fn side(&self) -> Side {
        match self {
            Self::Head { .. } => Side::Head,
            Self::Tail { .. } => Side::Tail,
        }
    }

    pub fn relation(&self) -> RelationId {
        match *self {
            Self::Head { relation, .. } | Self::Tail { relation, .. } => relation,
        }
    }

    /// The known entity of the query.
    pub fn anchor(&self) -> EntityId {
        match *self {
            Self::Head { tail, .. } => tail,
            Self::Tail { head, .. } => head,
        }
    }

    /// Fill the unknown position with `entity`.
    pub fn complete(&self, entity: EntityId) -> Triple {
        match *self {
            Self::Head { relation, tail } => Triple::new(entity, relation, tail),
            Self::Tail { head, relation } => Triple::new(head, relation, entity),
        }
    }
}

impl fmt::Display for LinkQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head { relation, tail } => write!(f, "(?, {relation}, {tail})"),
            Self::Tail { head, relation } => write!(f, "({head}, {relation}, ?)"),
        }
    }
}

fn to_id(raw: i64, position: &str) -> Result<u32, CorpusError> {
    u32::try_from(raw).map_err(|_| {
        CorpusError::InvalidLinkQuery(format!("{position} id {raw} is not a valid identifier"))
    })
}
