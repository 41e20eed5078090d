//! Score sets and the rankings derived from them.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};
use crate::model::{Corpus, DocId};

/// One document's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDoc {
    pub id: DocId,
    pub score: f64,
}

/// Per-document scores, stored in corpus order.
///
/// A scorer produces exactly one entry per corpus document. The entry order is
/// the tie-break used by [`ScoreSet::ranking`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSet {
    entries: Vec<ScoredDoc>,
}

impl ScoreSet {
    /// Build a score set from `(id, score)` pairs in tie-break order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] if an id repeats.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (DocId, f64)>,
    {
        let entries: Vec<ScoredDoc> = entries
            .into_iter()
            .map(|(id, score)| ScoredDoc { id, score })
            .collect();
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(&entry.id) {
                return Err(ScoreError::invalid(format!(
                    "score set contains '{}' twice",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Pair each corpus document with the score at the same position.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] if `scores` is not exactly one
    /// value per document.
    pub fn from_corpus(corpus: &Corpus, scores: Vec<f64>) -> Result<Self> {
        if scores.len() != corpus.len() {
            return Err(ScoreError::invalid(format!(
                "expected {} scores for the corpus, got {}",
                corpus.len(),
                scores.len()
            )));
        }
        let entries = corpus
            .ids()
            .cloned()
            .zip(scores)
            .map(|(id, score)| ScoredDoc { id, score })
            .collect();
        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredDoc> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, id: &DocId) -> Option<f64> {
        self.entries.iter().find(|e| &e.id == id).map(|e| e.score)
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocId> + '_ {
        self.entries.iter().map(|e| &e.id)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.score)
    }

    /// `(min, max)` over all scores, `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.values().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Apply `f` to every score, keeping ids and order.
    #[must_use]
    pub fn map_scores(&self, mut f: impl FnMut(f64) -> f64) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| ScoredDoc {
                    id: e.id.clone(),
                    score: f(e.score),
                })
                .collect(),
        }
    }

    /// True when both sets cover exactly the same document ids.
    #[must_use]
    pub fn covers_same_documents(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let mine: HashSet<&DocId> = self.ids().collect();
        other.ids().all(|id| mine.contains(id))
    }

    /// Sort by score descending; ties keep entry order.
    #[must_use]
    pub fn ranking(&self) -> Ranking {
        let mut order: Vec<&ScoredDoc> = self.entries.iter().collect();
        // `sort_by` is stable, which is what makes ties deterministic.
        order.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ranking {
            entries: order
                .into_iter()
                .enumerate()
                .map(|(idx, e)| RankedDoc {
                    rank: idx + 1,
                    id: e.id.clone(),
                    score: e.score,
                })
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ScoreSet {
    type Item = &'a ScoredDoc;
    type IntoIter = std::slice::Iter<'a, ScoredDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A document's place in a ranking. Ranks are 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDoc {
    pub rank: usize,
    pub id: DocId,
    pub score: f64,
}

/// Documents ordered best-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankedDoc>,
}

impl Ranking {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedDoc> {
        self.entries.iter()
    }

    /// The best `k` entries (all of them when `k` exceeds the length).
    #[must_use]
    pub fn top(&self, k: usize) -> &[RankedDoc] {
        &self.entries[..k.min(self.entries.len())]
    }

    /// 1-indexed rank of `id`, if present.
    #[must_use]
    pub fn rank_of(&self, id: &DocId) -> Option<usize> {
        self.entries.iter().find(|e| &e.id == id).map(|e| e.rank)
    }

    /// Ids in rank order.
    pub fn ids(&self) -> impl Iterator<Item = &DocId> + '_ {
        self.entries.iter().map(|e| &e.id)
    }

    /// Keep only the best `k` entries.
    #[must_use]
    pub fn truncated(mut self, k: usize) -> Self {
        self.entries.truncate(k);
        self
    }
}

impl<'a> IntoIterator for &'a Ranking {
    type Item = &'a RankedDoc;
    type IntoIter = std::slice::Iter<'a, RankedDoc>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
