#![forbid(unsafe_code)]
//! ragkit-core library.
//!
//! Shared vocabulary for the scoring crates: documents and corpora, score sets
//! and rankings, the tokenizer seam, error kinds and configuration.
//!
//! # Conventions
//!
//! - **Errors**: Scoring APIs return [`error::Result`] with a [`ScoreError`];
//!   configuration loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod model;
pub mod score;
pub mod tokenize;

pub use error::{ErrorCode, ScoreError};
pub use model::{Corpus, DocId, Document, Query};
pub use score::{RankedDoc, Ranking, ScoreSet, ScoredDoc};
pub use tokenize::{Tokenizer, WhitespaceTokenizer};
