//! Lexical (exact-term) relevance scoring.

pub mod bm25;

pub use bm25::{Bm25Params, Bm25Scorer, bm25_scores};
