//! Reads dictionaries, triple files, link queries and pretrained vectors
//! from a whitespace-separated dataset directory.

use crate::corpus::{Corpus, CorpusLayout};
use crate::error::CorpusError;
use crate::types::{LinkQuery, Triple, UNKNOWN_ID};
use crate::vocab::Vocab;
use anyhow::Context;
use std::path::Path;

/// Placeholder for the unknown position in a link-query file.
pub const UNKNOWN_TOKEN: &str = "?";

/// Static methods for reading corpus files.
pub struct CorpusReader;

impl CorpusReader {
    /// Load a full dataset directory.
    ///
    /// The link-query file is optional; the other five are required.
    pub fn load_dir(dir: &Path, layout: &CorpusLayout) -> anyhow::Result<Corpus> {
        let entities = Self::read_vocab(&dir.join(&layout.entities))?;
        let relations = Self::read_vocab(&dir.join(&layout.relations))?;
        let train = Self::read_triples(&dir.join(&layout.train), &entities, &relations)?;
        let valid = Self::read_triples(&dir.join(&layout.valid), &entities, &relations)?;
        let test = Self::read_triples(&dir.join(&layout.test), &entities, &relations)?;

        let link_path = dir.join(&layout.link_queries);
        let link_queries = if link_path.exists() {
            Self::read_link_queries(&link_path, &entities, &relations)?
        } else {
            tracing::debug!(path = %link_path.display(), "No link-query file");
            Vec::new()
        };

        let corpus = Corpus::new(entities, relations, train, valid, test, link_queries)
            .with_context(|| format!("invalid corpus in {}", dir.display()))?;
        Ok(corpus)
    }

    /// Read a `name id` dictionary. Lines with fewer than two tokens are skipped.
    pub fn read_vocab(path: &Path) -> anyhow::Result<Vocab> {
        let contents = read(path)?;
        let mut pairs = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 2 {
                continue;
            }
            let id: u32 = tokens[1].parse().map_err(|_| CorpusError::Parse {
                location: location(path, lineno),
                message: format!("'{}' is not an id", tokens[1]),
            })?;
            pairs.push((tokens[0].to_string(), id));
        }
        let vocab = Vocab::from_pairs(pairs)
            .with_context(|| format!("bad dictionary {}", path.display()))?;
        tracing::debug!(count = vocab.len(), path = %path.display(), "Read vocabulary");
        Ok(vocab)
    }

    /// Read `head relation tail` name triples. Unknown names are fatal.
    pub fn read_triples(
        path: &Path,
        entities: &Vocab,
        relations: &Vocab,
    ) -> anyhow::Result<Vec<Triple>> {
        let contents = read(path)?;
        let mut triples = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let Some([h, r, t]) = split_triple(path, lineno, line)? else {
                continue;
            };
            let loc = || location(path, lineno);
            triples.push(Triple::new(
                lookup(entities, "entity", h, loc)?,
                lookup(relations, "relation", r, loc)?,
                lookup(entities, "entity", t, loc)?,
            ));
        }
        tracing::debug!(count = triples.len(), path = %path.display(), "Read triples");
        Ok(triples)
    }

    /// Read link queries where `?` marks the unknown head or tail.
    pub fn read_link_queries(
        path: &Path,
        entities: &Vocab,
        relations: &Vocab,
    ) -> anyhow::Result<Vec<LinkQuery>> {
        let contents = read(path)?;
        let mut queries = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let Some([h, r, t]) = split_triple(path, lineno, line)? else {
                continue;
            };
            let loc = || location(path, lineno);
            let entity = |name: &str| -> Result<i64, CorpusError> {
                if name == UNKNOWN_TOKEN {
                    Ok(UNKNOWN_ID)
                } else {
                    lookup(entities, "entity", name, loc).map(i64::from)
                }
            };
            let head = entity(h)?;
            let tail = entity(t)?;
            let relation = lookup(relations, "relation", r, loc)?;
            let query = LinkQuery::from_raw(head, i64::from(relation), tail)
                .with_context(|| loc())?;
            queries.push(query);
        }
        tracing::debug!(count = queries.len(), path = %path.display(), "Read link queries");
        Ok(queries)
    }

    /// Read one float vector per non-empty line.
    pub fn read_vectors(path: &Path) -> anyhow::Result<Vec<Vec<f32>>> {
        let contents = read(path)?;
        let mut rows = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let row = line
                .split_whitespace()
                .map(|tok| tok.parse::<f32>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CorpusError::Parse {
                    location: location(path, lineno),
                    message: e.to_string(),
                })?;
            rows.push(row);
        }
        tracing::debug!(count = rows.len(), path = %path.display(), "Read pretrained vectors");
        Ok(rows)
    }
}

/// Widen each row to `target_dim` by repeating it whole.
///
/// Every row must share one length that divides `target_dim`.
pub fn tile_vectors(rows: &[Vec<f32>], target_dim: usize) -> anyhow::Result<Vec<Vec<f32>>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let width = first.len();
    if width == 0 || target_dim % width != 0 {
        anyhow::bail!("vector width {width} does not divide embedding dim {target_dim}");
    }
    let repeats = target_dim / width;
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != width {
                anyhow::bail!("row {i} has width {}, expected {width}", row.len());
            }
            Ok(row.repeat(repeats))
        })
        .collect()
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn location(path: &Path, lineno: usize) -> String {
    format!("{}:{}", path.display(), lineno + 1)
}

fn split_triple<'l>(
    path: &Path,
    lineno: usize,
    line: &'l str,
) -> Result<Option<[&'l str; 3]>, CorpusError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Ok(None),
        [h, r, t, ..] => Ok(Some([*h, *r, *t])),
        _ => Err(CorpusError::Parse {
            location: location(path, lineno),
            message: format!("expected 3 fields, found {}", tokens.len()),
        }),
    }
}

fn lookup(
    vocab: &Vocab,
    kind: &'static str,
    name: &str,
    loc: impl Fn() -> String,
) -> Result<u32, CorpusError> {
    vocab.id(name).ok_or_else(|| CorpusError::UnknownName {
        kind,
        name: name.to_string(),
        location: loc(),
    })
}
