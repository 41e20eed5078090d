//! Dense scoring of a corpus against a query vector.
//!
//! Vectors are supplied by the caller. A document without a vector is an
//! error, not a candidate for a made-up placeholder.

use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{Corpus, DocId, Query, Ranking, ScoreSet};
use tracing::{debug, instrument};

use super::vector::{check_dims, check_finite, cosine_with_norms, direction_norm};

/// Cosine similarity of `query_vector` against every document in `corpus`.
///
/// Returns exactly one score per document, in corpus order.
///
/// # Errors
///
/// - [`ScoreError::InvalidInput`] if the corpus is empty, a document has no
///   vector, or any vector component is NaN or infinite.
/// - [`ScoreError::DimensionMismatch`] if a document vector's length differs
///   from the query's (expected = query length).
/// - [`ScoreError::DegenerateVector`] if the query or a document vector has
///   zero norm.
#[instrument(skip_all, fields(docs = corpus.len(), dim = query_vector.len()))]
pub fn cosine_scores(query_vector: &[f64], corpus: &Corpus) -> Result<ScoreSet> {
    if corpus.is_empty() {
        return Err(ScoreError::invalid("cannot score an empty corpus"));
    }

    check_finite(query_vector)?;
    let query_norm = direction_norm(query_vector, || "query vector".into())?;

    let mut scores = Vec::with_capacity(corpus.len());
    for doc in corpus {
        let vector = doc.vector.as_deref().ok_or_else(|| {
            ScoreError::invalid(format!("document '{}' has no vector", doc.id))
        })?;
        check_dims(query_vector, vector)?;
        let doc_norm = direction_norm(vector, || format!("vector of document '{}'", doc.id))?;
        scores.push(cosine_with_norms(query_vector, query_norm, vector, doc_norm));
    }

    debug!("cosine scored {} documents", scores.len());
    ScoreSet::from_corpus(corpus, scores)
}

/// [`cosine_scores`] for a [`Query`] that carries its own vector.
///
/// # Errors
///
/// Returns [`ScoreError::InvalidInput`] if the query has no vector, otherwise
/// see [`cosine_scores`].
pub fn semantic_scores(query: &Query, corpus: &Corpus) -> Result<ScoreSet> {
    let vector = query
        .vector
        .as_deref()
        .ok_or_else(|| ScoreError::invalid("query has no vector"))?;
    cosine_scores(vector, corpus)
}

/// The `k` labelled vectors closest to `target`, skipping `exclude`.
///
/// Used for analogy lookups, where the operands themselves are excluded from
/// the answer.
///
/// # Errors
///
/// Returns [`ScoreError::InvalidInput`] if nothing remains after exclusion,
/// otherwise see [`cosine_scores`].
pub fn nearest_neighbors(
    target: &[f64],
    table: &Corpus,
    exclude: &[DocId],
    k: usize,
) -> Result<Ranking> {
    let remaining: Vec<_> = table
        .iter()
        .filter(|doc| !exclude.contains(&doc.id))
        .cloned()
        .collect();
    if remaining.is_empty() {
        return Err(ScoreError::invalid("no candidates left after exclusion"));
    }
    let candidates = Corpus::new(remaining)?;
    Ok(cosine_scores(target, &candidates)?.ranking().truncated(k))
}

/// Rank `corpus` by cosine similarity and keep the best `k`.
///
/// # Errors
///
/// See [`cosine_scores`].
pub fn retrieve_top_k(query_vector: &[f64], corpus: &Corpus, k: usize) -> Result<Ranking> {
    Ok(cosine_scores(query_vector, corpus)?.ranking().truncated(k))
}
