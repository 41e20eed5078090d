//! Okapi BM25 over an in-memory corpus.
//!
//! # Formula
//!
//! For every query term `t` present in document `d`:
//!
//! ```text
//! idf(t)       = ln((N - df + 0.5) / (df + 0.5) + 1)
//! contribution = idf(t) * tf * (k1 + 1) / (tf + k1 * (1 - b + b * |d| / avgdl))
//! ```
//!
//! Contributions are summed over the query's token sequence as written:
//! a term repeated in the query is counted once per occurrence. Terms that
//! appear in no document contribute nothing, and a document sharing no term
//! with the query scores exactly `0.0`.
//!
//! # Example
//!
//! ```
//! use ragkit_core::{Corpus, DocId};
//! use ragkit_search::lexical::Bm25Scorer;
//!
//! let corpus = Corpus::from_texts([
//!     "the car engine produces unusual sounds when starting",
//!     "automobile is derived from greek and latin",
//! ]);
//! let scores = Bm25Scorer::new()
//!     .score("my automobile is making strange noises", &corpus)
//!     .unwrap();
//! assert!(scores.get(&DocId::new("d2")).unwrap() > scores.get(&DocId::new("d1")).unwrap());
//! ```

use std::collections::{HashMap, HashSet};

use ragkit_core::config::LexicalConfig;
use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{Corpus, ScoreSet, Tokenizer, WhitespaceTokenizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// BM25 constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term-frequency saturation (default 1.5).
    pub k1: f64,
    /// Length normalization strength in `[0, 1]` (default 0.75).
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl From<&LexicalConfig> for Bm25Params {
    fn from(config: &LexicalConfig) -> Self {
        Self {
            k1: config.k1,
            b: config.b,
        }
    }
}

impl Bm25Params {
    fn validate(self) -> Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(ScoreError::invalid(format!(
                "k1 must be a non-negative number, got {}",
                self.k1
            )));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(ScoreError::invalid(format!(
                "b must be within [0, 1], got {}",
                self.b
            )));
        }
        Ok(())
    }
}

/// Scores a query against every document of a corpus with BM25.
#[derive(Debug, Clone, Default)]
pub struct Bm25Scorer<T = WhitespaceTokenizer> {
    params: Bm25Params,
    tokenizer: T,
}

impl Bm25Scorer<WhitespaceTokenizer> {
    /// Default constants with the whitespace tokenizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            params: Bm25Params::default(),
            tokenizer: WhitespaceTokenizer,
        }
    }
}

impl<T: Tokenizer> Bm25Scorer<T> {
    #[must_use]
    pub fn with_params(mut self, params: Bm25Params) -> Self {
        self.params = params;
        self
    }

    /// Swap in a different tokenizer, keeping the constants.
    #[must_use]
    pub fn with_tokenizer<U: Tokenizer>(self, tokenizer: U) -> Bm25Scorer<U> {
        Bm25Scorer {
            params: self.params,
            tokenizer,
        }
    }

    #[must_use]
    pub const fn params(&self) -> Bm25Params {
        self.params
    }

    /// Score `query` against every document in `corpus`.
    ///
    /// The result has exactly one entry per document, in corpus order.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] when the corpus is empty, the
    /// query has no tokens, every document is empty (average length zero), or
    /// the constants are out of range.
    #[instrument(skip(self, corpus), fields(docs = corpus.len()))]
    pub fn score(&self, query: &str, corpus: &Corpus) -> Result<ScoreSet> {
        self.params.validate()?;
        if corpus.is_empty() {
            return Err(ScoreError::invalid(
                "cannot score an empty corpus: average document length is undefined",
            ));
        }

        let query_terms = self.tokenizer.tokenize(query);
        if query_terms.is_empty() {
            return Err(ScoreError::invalid("query has no tokens"));
        }

        let doc_tokens: Vec<Vec<String>> = corpus
            .iter()
            .map(|doc| self.tokenizer.tokenize(&doc.text))
            .collect();

        let n = doc_tokens.len() as f64;
        let total_len: usize = doc_tokens.iter().map(Vec::len).sum();
        let avgdl = total_len as f64 / n;
        if total_len == 0 {
            return Err(ScoreError::invalid(
                "every document is empty: average document length is zero",
            ));
        }

        let mut df: HashMap<&str, usize> = HashMap::new();
        for tokens in &doc_tokens {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let Bm25Params { k1, b } = self.params;
        let scores: Vec<f64> = doc_tokens
            .iter()
            .map(|tokens| {
                let mut tf: HashMap<&str, usize> = HashMap::new();
                for term in tokens {
                    *tf.entry(term.as_str()).or_insert(0) += 1;
                }
                let doc_len = tokens.len() as f64;

                let mut score = 0.0;
                for term in &query_terms {
                    let Some(&freq) = tf.get(term.as_str()) else {
                        continue;
                    };
                    // A term present in this document has df >= 1.
                    let doc_freq = df.get(term.as_str()).copied().unwrap_or(1) as f64;
                    let idf = ((n - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();
                    let freq = freq as f64;
                    score += idf * (freq * (k1 + 1.0))
                        / (freq + k1 * (1.0 - b + b * doc_len / avgdl));
                }
                score
            })
            .collect();

        debug!(
            query_terms = query_terms.len(),
            avgdl, "bm25 scored {} documents", scores.len()
        );
        ScoreSet::from_corpus(corpus, scores)
    }
}

/// BM25 with default constants and the whitespace tokenizer.
///
/// # Errors
///
/// See [`Bm25Scorer::score`].
pub fn bm25_scores(query: &str, corpus: &Corpus) -> Result<ScoreSet> {
    Bm25Scorer::new().score(query, corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_core::DocId;

    fn id(s: &str) -> DocId {
        DocId::new(s)
    }

    fn car_corpus() -> Corpus {
        Corpus::from_texts([
            "the car engine produces unusual sounds when starting",
            "vehicle maintenance tips for beginners",
            "how to fix car noises and rattles",
            "automobile is derived from greek and latin",
            "the history of the word car in english",
        ])
    }

    #[test]
    fn one_score_per_document() {
        let corpus = car_corpus();
        let scores = bm25_scores("car", &corpus).unwrap();
        assert_eq!(scores.len(), corpus.len());
        let ids: Vec<&DocId> = scores.ids().collect();
        let expected: Vec<&DocId> = corpus.ids().collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn no_shared_terms_scores_exactly_zero() {
        let scores = bm25_scores("automobile", &car_corpus()).unwrap();
        assert_eq!(scores.get(&id("d1")), Some(0.0));
        assert!(scores.get(&id("d4")).unwrap() > 0.0);
    }

    #[test]
    fn scores_are_non_negative() {
        let scores = bm25_scores("the car and the word", &car_corpus()).unwrap();
        assert!(scores.values().all(|s| s >= 0.0));
    }

    #[test]
    fn matches_hand_computed_value() {
        // Two documents, one term shared by one of them.
        // N = 2, df = 1, idf = ln((2 - 1 + 0.5) / (1 + 0.5) + 1) = ln 2
        // |d1| = 2, |d2| = 2, avgdl = 2, tf = 1
        // contribution = ln 2 * 1 * 2.5 / (1 + 1.5) = ln 2
        let corpus = Corpus::from_texts(["rust fast", "python easy"]);
        let scores = bm25_scores("rust", &corpus).unwrap();
        let got = scores.get(&id("d1")).unwrap();
        assert!((got - std::f64::consts::LN_2).abs() < 1e-12, "got {got}");
        assert_eq!(scores.get(&id("d2")), Some(0.0));
    }

    #[test]
    fn repeated_query_terms_count_twice() {
        let corpus = Corpus::from_texts(["rust fast", "python easy"]);
        let once = bm25_scores("rust", &corpus).unwrap();
        let twice = bm25_scores("rust rust", &corpus).unwrap();
        let once = once.get(&id("d1")).unwrap();
        let twice = twice.get(&id("d1")).unwrap();
        assert!((twice - 2.0 * once).abs() < 1e-12);
    }

    #[test]
    fn unknown_query_terms_are_not_an_error() {
        let scores = bm25_scores("zyzzyva", &car_corpus()).unwrap();
        assert!(scores.values().all(|s| s == 0.0));
    }

    #[test]
    fn higher_term_frequency_ranks_first() {
        let corpus = Corpus::from_texts(["rust rust rust", "rust programming", "go"]);
        let ranking = bm25_scores("rust", &corpus).unwrap().ranking();
        assert_eq!(ranking.top(1)[0].id, id("d1"));
    }

    #[test]
    fn empty_corpus_is_invalid_input() {
        let err = bm25_scores("car", &Corpus::default()).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn empty_query_is_invalid_input() {
        let err = bm25_scores("   ", &car_corpus()).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn all_empty_documents_is_invalid_input() {
        let corpus = Corpus::from_texts(["", "  "]);
        let err = bm25_scores("car", &corpus).unwrap_err();
        assert!(err.to_string().contains("average document length is zero"));
    }

    #[test]
    fn out_of_range_b_is_rejected() {
        let scorer = Bm25Scorer::new().with_params(Bm25Params { k1: 1.2, b: 1.5 });
        let err = scorer.score("car", &car_corpus()).unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn custom_tokenizer_is_used() {
        let corpus = Corpus::from_texts(["Car-Engine", "boat"]);
        let split_dashes = |text: &str| -> Vec<String> {
            text.to_lowercase()
                .split(['-', ' '])
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect()
        };
        let scores = Bm25Scorer::new()
            .with_tokenizer(split_dashes)
            .score("engine", &corpus)
            .unwrap();
        assert!(scores.get(&id("d1")).unwrap() > 0.0);
    }

    #[test]
    fn technical_query_prefers_exact_terms() {
        let corpus = Corpus::from_texts([
            "the asyncio event loop runs coroutines in python",
            "python async programming with concurrent futures",
            "javascript promises and event-driven programming",
            "how to handle asynchronous operations efficiently",
            "event loop implementation details in asyncio module",
        ]);
        let ranking = bm25_scores("python asyncio event loop", &corpus)
            .unwrap()
            .ranking();
        assert_eq!(ranking.top(1)[0].id, id("d1"));
        assert_eq!(ranking.rank_of(&id("d4")), Some(5));
    }
}
