//! Text → vector seam.
//!
//! Scoring never invents embeddings: text the embedder does not know is an
//! error rather than a random or zero placeholder.

use std::collections::HashMap;

use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{Corpus, Document};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Produces a dense vector for a piece of text.
pub trait Embedder {
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] when the text cannot be embedded.
    fn embed(&self, text: &str) -> Result<Vec<f64>>;

    /// Vector length every call returns.
    fn dimension(&self) -> usize;
}

/// Precomputed embeddings looked up by exact text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, Vec<f64>>", into = "HashMap<String, Vec<f64>>")]
pub struct FixtureEmbedder {
    table: HashMap<String, Vec<f64>>,
    dim: usize,
}

impl FixtureEmbedder {
    /// Build from `(text, vector)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] for an empty vector, and
    /// [`ScoreError::DimensionMismatch`] when vectors differ in length.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = HashMap::new();
        let mut dim = None;
        for (text, vector) in entries {
            let text = text.into();
            if vector.is_empty() {
                return Err(ScoreError::invalid(format!(
                    "embedding for '{text}' is empty"
                )));
            }
            match dim {
                None => dim = Some(vector.len()),
                Some(expected) if expected != vector.len() => {
                    return Err(ScoreError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                Some(_) => {}
            }
            table.insert(text, vector);
        }
        Ok(Self {
            table,
            dim: dim.unwrap_or(0),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.table.contains_key(text)
    }
}

impl Embedder for FixtureEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f64>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| ScoreError::invalid(format!("no embedding known for '{text}'")))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

impl TryFrom<HashMap<String, Vec<f64>>> for FixtureEmbedder {
    type Error = ScoreError;

    fn try_from(table: HashMap<String, Vec<f64>>) -> Result<Self> {
        Self::new(table)
    }
}

impl From<FixtureEmbedder> for HashMap<String, Vec<f64>> {
    fn from(embedder: FixtureEmbedder) -> Self {
        embedder.table
    }
}

/// Attach an embedding to every document that lacks one.
///
/// Documents that already carry a vector keep it.
///
/// # Errors
///
/// Propagates the embedder's error for the first document it cannot embed.
pub fn embed_corpus(embedder: &impl Embedder, corpus: &Corpus) -> Result<Corpus> {
    let mut docs: Vec<Document> = Vec::with_capacity(corpus.len());
    let mut embedded = 0usize;
    for doc in corpus {
        let mut doc = doc.clone();
        if doc.vector.is_none() {
            doc.vector = Some(embedder.embed(&doc.text)?);
            embedded += 1;
        }
        docs.push(doc);
    }
    debug!(embedded, "embedded corpus of {} documents", docs.len());
    Corpus::new(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_core::DocId;

    fn embedder() -> FixtureEmbedder {
        FixtureEmbedder::new([("cat", vec![0.9, 0.1]), ("car", vec![0.1, 0.9])]).unwrap()
    }

    #[test]
    fn known_text_embeds() {
        let e = embedder();
        assert_eq!(e.embed("cat").unwrap(), vec![0.9, 0.1]);
        assert_eq!(e.dimension(), 2);
    }

    #[test]
    fn unknown_text_is_invalid_input() {
        let err = embedder().embed("dog").unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
        assert!(err.to_string().contains("'dog'"));
    }

    #[test]
    fn inconsistent_dimensions_are_rejected() {
        let err = FixtureEmbedder::new([("a", vec![1.0, 0.0]), ("b", vec![1.0])]).unwrap_err();
        assert_eq!(
            err,
            ScoreError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn embed_corpus_fills_missing_vectors_only() {
        let corpus = Corpus::new(vec![
            Document::new("x", "cat"),
            Document::new("y", "car").with_vector(vec![0.5, 0.5]),
        ])
        .unwrap();
        let embedded = embed_corpus(&embedder(), &corpus).unwrap();
        let x = embedded.get(&DocId::new("x")).unwrap();
        let y = embedded.get(&DocId::new("y")).unwrap();
        assert_eq!(x.vector.as_deref(), Some(&[0.9, 0.1][..]));
        assert_eq!(y.vector.as_deref(), Some(&[0.5, 0.5][..]));
    }

    #[test]
    fn deserializes_from_json_object() {
        let e: FixtureEmbedder = serde_json::from_str(r#"{"cat": [1.0, 0.0]}"#).unwrap();
        assert!(e.contains("cat"));
        assert_eq!(e.len(), 1);
    }
}
