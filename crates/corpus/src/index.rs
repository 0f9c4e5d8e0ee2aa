//! Known-true triple set shared by negative sampling and filtered ranking.

use crate::error::CorpusError;
use crate::types::Triple;
use std::collections::HashSet;

/// Membership set over the union of all splits.
///
/// Immutable after [`TripleIndex::build`]; share it by reference across any
/// number of readers.
#[derive(Debug, Clone)]
pub struct TripleIndex {
    known: HashSet<Triple>,
    entity_count: usize,
    relation_count: usize,
}

impl TripleIndex {
    /// Merge every split into one set. Repeated triples collapse.
    ///
    /// Any id outside the entity or relation space is a fatal error.
    pub fn build<'a, I>(
        entity_count: usize,
        relation_count: usize,
        splits: I,
    ) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = &'a [Triple]>,
    {
        let mut index = Self {
            known: HashSet::new(),
            entity_count,
            relation_count,
        };
        let mut seen = 0usize;
        for split in splits {
            index.known.reserve(split.len());
            for triple in split {
                index.check_range(triple)?;
                index.known.insert(*triple);
            }
            seen += split.len();
        }
        tracing::debug!(
            triples = seen,
            unique = index.known.len(),
            entity_count,
            relation_count,
            "Built triple index"
        );
        Ok(index)
    }

    /// Whether `triple` is known to be true.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.known.contains(triple)
    }

    /// Verify that every id of `triple` lies inside this index's id spaces.
    pub fn check_range(&self, triple: &Triple) -> Result<(), CorpusError> {
        if triple.head as usize >= self.entity_count || triple.tail as usize >= self.entity_count {
            return Err(CorpusError::EntityOutOfRange {
                triple: *triple,
                entity_count: self.entity_count,
            });
        }
        if triple.relation as usize >= self.relation_count {
            return Err(CorpusError::RelationOutOfRange {
                triple: *triple,
                relation_count: self.relation_count,
            });
        }
        Ok(())
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn relation_count(&self) -> usize {
        self.relation_count
    }

    /// Number of distinct known triples.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_merges_splits() {
        let train = [Triple::new(0, 0, 1), Triple::new(2, 0, 3)];
        let valid = [Triple::new(0, 0, 1)];
        let test = [Triple::new(1, 1, 2)];
        let index = TripleIndex::build(4, 2, [&train[..], &valid[..], &test[..]]).unwrap();

        assert_eq!(index.len(), 3);
        assert!(index.contains(&Triple::new(0, 0, 1)));
        assert!(index.contains(&Triple::new(1, 1, 2)));
        assert!(!index.contains(&Triple::new(1, 0, 0)));
        assert_eq!(index.entity_count(), 4);
        assert_eq!(index.relation_count(), 2);
    }

    #[test]
    fn test_build_rejects_out_of_range_entity() {
        let train = [Triple::new(0, 0, 4)];
        let err = TripleIndex::build(4, 1, [&train[..]]).unwrap_err();
        assert!(matches!(err, CorpusError::EntityOutOfRange { entity_count: 4, .. }));
    }

    #[test]
    fn test_build_rejects_out_of_range_relation() {
        let train = [Triple::new(0, 1, 2)];
        let err = TripleIndex::build(4, 1, [&train[..]]).unwrap_err();
        assert!(matches!(err, CorpusError::RelationOutOfRange { relation_count: 1, .. }));
    }

    #[test]
    fn test_empty_index() {
        let index = TripleIndex::build(3, 1, std::iter::empty::<&[Triple]>()).unwrap();
        assert!(index.is_empty());
        assert!(!index.contains(&Triple::new(0, 0, 0)));
    }

    #[test]
    fn test_shared_across_threads() {
        let train = [Triple::new(0, 0, 1)];
        let index = TripleIndex::build(2, 1, [&train[..]]).unwrap();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| assert!(index.contains(&Triple::new(0, 0, 1))));
            }
        });
    }
}
