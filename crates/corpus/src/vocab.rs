//! Bijective name <-> id mapping for entities and relations.

use crate::error::CorpusError;
use std::collections::HashMap;

/// Dense vocabulary: ids `0..len` each map to exactly one name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocab {
    names: Vec<String>,
    ids: HashMap<String, u32>,
}

impl Vocab {
    /// Build from names in id order (position = id).
    pub fn from_names<I, S>(names: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocab = Self::default();
        for name in names {
            let name = name.into();
            let id = vocab.names.len() as u32;
            if vocab.ids.insert(name.clone(), id).is_some() {
                return Err(CorpusError::DuplicateName(name));
            }
            vocab.names.push(name);
        }
        Ok(vocab)
    }

    /// Build from explicit `(name, id)` pairs in any order.
    ///
    /// Fails unless the pairs form a bijection onto `0..n`, where `n` is the
    /// number of pairs. Ids are checked against `n` before anything is sized
    /// from them.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, CorpusError>
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        let pairs: Vec<(String, u32)> = pairs.into_iter().collect();
        let len = pairs.len();
        let mut slots: Vec<Option<String>> = vec![None; len];
        let mut ids = HashMap::with_capacity(len);
        for (name, id) in pairs {
            let idx = id as usize;
            if idx >= len {
                return Err(CorpusError::SparseIds { name, id, len });
            }
            if ids.insert(name.clone(), id).is_some() {
                return Err(CorpusError::DuplicateName(name));
            }
            if let Some(first) = &slots[idx] {
                return Err(CorpusError::DuplicateId {
                    id,
                    first: first.clone(),
                    second: name,
                });
            }
            slots[idx] = Some(name);
        }

        // n distinct ids below n fill every slot.
        let names = slots.into_iter().flatten().collect();
        Ok(Self { names, ids })
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(id, name)| (id as u32, name.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(n, i)| (n.to_string(), *i)).collect()
    }

    #[test]
    fn test_round_trip_every_id() {
        let vocab =
            Vocab::from_pairs(pairs(&[("paris", 2), ("france", 0), ("capital_of", 1)])).unwrap();
        assert_eq!(vocab.len(), 3);
        for id in 0..vocab.len() as u32 {
            let name = vocab.name(id).unwrap();
            assert_eq!(vocab.id(name), Some(id));
        }
        for (id, name) in vocab.iter() {
            assert_eq!(vocab.name(vocab.id(name).unwrap()), Some(name));
            assert_eq!(vocab.id(name), Some(id));
        }
        assert_eq!(vocab.name(0), Some("france"));
    }

    #[test]
    fn test_rejects_duplicate_name() {
        let err = Vocab::from_pairs(pairs(&[("a", 0), ("a", 1)])).unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateName(ref n) if n == "a"));
        assert!(Vocab::from_names(["x", "y", "x"]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let err = Vocab::from_pairs(pairs(&[("a", 0), ("b", 0)])).unwrap_err();
        assert!(matches!(err, CorpusError::DuplicateId { id: 0, .. }));
    }

    #[test]
    fn test_rejects_gap() {
        let err = Vocab::from_pairs(pairs(&[("a", 0), ("b", 2)])).unwrap_err();
        assert!(matches!(err, CorpusError::SparseIds { id: 2, len: 2, ref name } if name == "b"));
    }

    #[test]
    fn test_rejects_huge_id_without_allocating() {
        let err = Vocab::from_pairs(pairs(&[("a", 0), ("b", 3_000_000_000)])).unwrap_err();
        assert!(matches!(
            err,
            CorpusError::SparseIds { id: 3_000_000_000, len: 2, .. }
        ));
        assert!(err.to_string().contains("not dense"));

        let err = Vocab::from_pairs(pairs(&[("a", u32::MAX)])).unwrap_err();
        assert!(matches!(err, CorpusError::SparseIds { len: 1, .. }));
    }

    #[test]
    fn test_unknown_lookups() {
        let vocab = Vocab::from_names(["a", "b"]).unwrap();
        assert_eq!(vocab.id("c"), None);
        assert_eq!(vocab.name(2), None);
        assert!(Vocab::default().is_empty());
    }
}
