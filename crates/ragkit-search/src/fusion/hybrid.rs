//! Hybrid scoring: BM25 and cosine over the same corpus, then fusion.
//!
//! Unlike a best-effort search path, both signals are required: a missing or
//! degenerate vector fails the whole call instead of silently dropping to
//! lexical-only results.

use std::collections::HashMap;

use ragkit_core::config::RagkitConfig;
use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{Corpus, DocId, Query, Ranking, ScoreSet, Tokenizer, WhitespaceTokenizer};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::fusion::scoring::{FusionMethod, fuse};
use crate::lexical::{Bm25Params, Bm25Scorer};
use crate::semantic::semantic_scores;

/// One fused document with per-signal explanation fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridHit {
    pub id: DocId,
    /// 1-based position in the fused ranking.
    pub rank: usize,
    pub score: f64,
    pub lexical_score: f64,
    pub lexical_rank: usize,
    pub semantic_score: f64,
    pub semantic_rank: usize,
}

/// Output of [`HybridScorer::score`]: the raw signals plus the fused ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridResult {
    pub method: FusionMethod,
    pub lexical: ScoreSet,
    pub semantic: ScoreSet,
    pub fused: ScoreSet,
    /// Fused ranking, best first.
    pub hits: Vec<HybridHit>,
}

impl HybridResult {
    /// The best `k` hits.
    #[must_use]
    pub fn top(&self, k: usize) -> &[HybridHit] {
        &self.hits[..k.min(self.hits.len())]
    }
}

/// Runs both scorers and fuses them.
#[derive(Debug, Clone)]
pub struct HybridScorer<T = WhitespaceTokenizer> {
    bm25: Bm25Scorer<T>,
    method: FusionMethod,
}

impl HybridScorer<WhitespaceTokenizer> {
    /// Default BM25 constants, RRF with k = 60.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bm25: Bm25Scorer::new(),
            method: FusionMethod::default(),
        }
    }

    /// Constants and fusion method from a loaded configuration.
    #[must_use]
    pub fn from_config(config: &RagkitConfig) -> Self {
        Self {
            bm25: Bm25Scorer::new().with_params(Bm25Params::from(&config.lexical)),
            method: FusionMethod::from(&config.fusion),
        }
    }
}

impl Default for HybridScorer<WhitespaceTokenizer> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tokenizer> HybridScorer<T> {
    #[must_use]
    pub fn with_method(mut self, method: FusionMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_bm25<U: Tokenizer>(self, bm25: Bm25Scorer<U>) -> HybridScorer<U> {
        HybridScorer {
            bm25,
            method: self.method,
        }
    }

    #[must_use]
    pub const fn method(&self) -> FusionMethod {
        self.method
    }

    /// Score `query` lexically and semantically, then fuse.
    ///
    /// # Errors
    ///
    /// Any error from BM25 scoring, cosine scoring (the query and every
    /// document need a vector) or fusion.
    #[instrument(
        skip(self, query, corpus),
        fields(docs = corpus.len(), method = self.method.name())
    )]
    pub fn score(&self, query: &Query, corpus: &Corpus) -> Result<HybridResult> {
        let lexical = self.bm25.score(&query.text, corpus)?;
        let semantic = semantic_scores(query, corpus)?;
        let fused = fuse(&lexical, &semantic, self.method)?;

        let lex_rank = rank_table(&lexical.ranking());
        let sem_rank = rank_table(&semantic.ranking());

        let mut hits = Vec::with_capacity(fused.scores.len());
        for ranked in &fused.ranking() {
            let lookup = |table: &HashMap<DocId, usize>| {
                table.get(&ranked.id).copied().ok_or_else(|| {
                    ScoreError::CorpusMismatch(format!("'{}' missing from a signal", ranked.id))
                })
            };
            hits.push(HybridHit {
                id: ranked.id.clone(),
                rank: ranked.rank,
                score: ranked.score,
                lexical_score: lexical.get(&ranked.id).unwrap_or_default(),
                lexical_rank: lookup(&lex_rank)?,
                semantic_score: semantic.get(&ranked.id).unwrap_or_default(),
                semantic_rank: lookup(&sem_rank)?,
            });
        }

        debug!(
            top = hits.first().map(|h| h.id.as_str()),
            "hybrid scored {} documents",
            hits.len()
        );
        Ok(HybridResult {
            method: self.method,
            lexical,
            semantic,
            fused: fused.scores,
            hits,
        })
    }
}

fn rank_table(ranking: &Ranking) -> HashMap<DocId, usize> {
    ranking.iter().map(|r| (r.id.clone(), r.rank)).collect()
}
