#![forbid(unsafe_code)]
//! ragkit-search library.
//!
//! Scoring of an in-memory corpus against a query, three ways:
//!
//! - [`lexical`]: Okapi BM25 over whitespace tokens.
//! - [`semantic`]: cosine similarity over caller-supplied vectors.
//! - [`fusion`]: min-max weighted fusion and reciprocal rank fusion of the two,
//!   plus the [`fusion::HybridScorer`] that runs everything end to end.
//!
//! [`retrieve`] adds a small vector store for top-k retrieval.
//!
//! # Conventions
//!
//! - **Errors**: Return `ragkit_core::error::Result`; every failure is one of
//!   the [`ragkit_core::ScoreError`] kinds and no partial result is returned.
//! - **Logging**: Use `tracing` macros (`debug!` for per-call details).

pub mod fusion;
pub mod lexical;
pub mod retrieve;
pub mod semantic;

pub use fusion::{FusionMethod, FusionResult, HybridHit, HybridResult, HybridScorer};
pub use lexical::{Bm25Params, Bm25Scorer, bm25_scores};
pub use retrieve::{Retrieved, VectorStore};
pub use semantic::{Embedder, FixtureEmbedder, cosine_scores, cosine_similarity};
