//! Documents, corpora and queries.
//!
//! Documents carry an explicit [`DocId`] rather than being keyed by their text,
//! so two documents with identical text remain distinct.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScoreError};

/// Opaque document identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Wrap an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A candidate document: identifier, text and an optional dense vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    /// Precomputed embedding. Required for semantic scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<DocId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            vector: None,
        }
    }

    /// Attach an embedding.
    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f64>) -> Self {
        self.vector = Some(vector);
        self
    }
}

/// Ordered collection of documents, unique by id.
///
/// Corpus order is significant: it is the tie-break for every ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Document>", into = "Vec<Document>")]
pub struct Corpus {
    docs: Vec<Document>,
    positions: HashMap<DocId, usize>,
}

impl Corpus {
    /// Build a corpus from documents in order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] if two documents share an id.
    pub fn new(docs: Vec<Document>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(docs.len());
        for (idx, doc) in docs.iter().enumerate() {
            if positions.insert(doc.id.clone(), idx).is_some() {
                return Err(ScoreError::invalid(format!(
                    "duplicate document id '{}'",
                    doc.id
                )));
            }
        }
        Ok(Self { docs, positions })
    }

    /// Build a corpus from bare texts, assigning ids `d1`, `d2`, ...
    #[must_use]
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let docs: Vec<Document> = texts
            .into_iter()
            .enumerate()
            .map(|(idx, text)| Document::new(format!("d{}", idx + 1), text))
            .collect();
        let positions = docs
            .iter()
            .enumerate()
            .map(|(idx, doc)| (doc.id.clone(), idx))
            .collect();
        Self { docs, positions }
    }

    /// Build a corpus from `(text, vector)` pairs, assigning ids `d1`, `d2`, ...
    #[must_use]
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let (texts, vectors): (Vec<String>, Vec<Vec<f64>>) =
            pairs.into_iter().map(|(t, v)| (t.into(), v)).unzip();
        let mut corpus = Self::from_texts(texts);
        for (doc, vector) in corpus.docs.iter_mut().zip(vectors) {
            doc.vector = Some(vector);
        }
        corpus
    }

    /// Append a document at the end of the corpus order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] if the id is already present.
    pub fn push(&mut self, doc: Document) -> Result<()> {
        if self.positions.contains_key(&doc.id) {
            return Err(ScoreError::invalid(format!(
                "duplicate document id '{}'",
                doc.id
            )));
        }
        self.positions.insert(doc.id.clone(), self.docs.len());
        self.docs.push(doc);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.docs.iter()
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    #[must_use]
    pub fn get(&self, id: &DocId) -> Option<&Document> {
        self.positions.get(id).map(|&idx| &self.docs[idx])
    }

    /// Zero-based corpus position of `id`.
    #[must_use]
    pub fn position(&self, id: &DocId) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn ids(&self) -> impl Iterator<Item = &DocId> + '_ {
        self.docs.iter().map(|d| &d.id)
    }
}

impl TryFrom<Vec<Document>> for Corpus {
    type Error = ScoreError;

    fn try_from(docs: Vec<Document>) -> Result<Self> {
        Self::new(docs)
    }
}

impl From<Corpus> for Vec<Document> {
    fn from(corpus: Corpus) -> Self {
        corpus.docs
    }
}

impl<'a> IntoIterator for &'a Corpus {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.docs.iter()
    }
}

/// Query text plus an optional embedding from the same model as the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
}

impl Query {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            vector: None,
        }
    }

    #[must_use]
    pub fn with_vector(mut self, vector: Vec<f64>) -> Self {
        self.vector = Some(vector);
        self
    }
}
