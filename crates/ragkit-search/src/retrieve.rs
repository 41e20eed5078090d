//! In-memory vector store with top-k cosine retrieval.

use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{Corpus, DocId, Document};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::semantic::retrieve_top_k;

/// A retrieved document with its rank and similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retrieved {
    pub rank: usize,
    pub id: DocId,
    pub text: String,
    pub score: f64,
}

/// Documents with embeddings of one fixed dimension.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    corpus: Corpus,
    dim: Option<usize>,
}

impl VectorStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a corpus whose documents all carry vectors.
    ///
    /// # Errors
    ///
    /// See [`VectorStore::add`].
    pub fn from_corpus(corpus: &Corpus) -> Result<Self> {
        let mut store = Self::new();
        for doc in corpus {
            store.add(doc.clone())?;
        }
        Ok(store)
    }

    /// Add a document. The first document fixes the store's dimension.
    ///
    /// # Errors
    ///
    /// - [`ScoreError::InvalidInput`] if the document has no (or an empty)
    ///   vector, or its id is already stored.
    /// - [`ScoreError::DimensionMismatch`] if its vector length differs from
    ///   the store's.
    pub fn add(&mut self, doc: Document) -> Result<()> {
        let len = match doc.vector.as_deref() {
            None => {
                return Err(ScoreError::invalid(format!(
                    "document '{}' has no vector",
                    doc.id
                )));
            }
            Some([]) => {
                return Err(ScoreError::invalid(format!(
                    "document '{}' has an empty vector",
                    doc.id
                )));
            }
            Some(v) => v.len(),
        };
        match self.dim {
            Some(expected) if expected != len => {
                return Err(ScoreError::DimensionMismatch {
                    expected,
                    actual: len,
                });
            }
            _ => {}
        }
        self.corpus.push(doc)?;
        self.dim = Some(len);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    /// Dimension of stored vectors, once anything has been added.
    #[must_use]
    pub const fn dimension(&self) -> Option<usize> {
        self.dim
    }

    #[must_use]
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// The `k` documents most similar to `query_vector`, best first.
    ///
    /// # Errors
    ///
    /// [`ScoreError::InvalidInput`] on an empty store, otherwise the cosine
    /// scoring errors ([`ScoreError::DimensionMismatch`] for a query of the
    /// wrong length, [`ScoreError::DegenerateVector`] for a zero query).
    #[instrument(skip(self, query_vector), fields(docs = self.len()))]
    pub fn search(&self, query_vector: &[f64], k: usize) -> Result<Vec<Retrieved>> {
        let ranking = retrieve_top_k(query_vector, &self.corpus, k)?;
        let hits: Vec<Retrieved> = ranking
            .iter()
            .filter_map(|r| {
                self.corpus.get(&r.id).map(|doc| Retrieved {
                    rank: r.rank,
                    id: r.id.clone(),
                    text: doc.text.clone(),
                    score: r.score,
                })
            })
            .collect();
        debug!("retrieved {} of {} documents", hits.len(), self.len());
        Ok(hits)
    }
}
