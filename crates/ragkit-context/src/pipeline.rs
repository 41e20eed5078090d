//! Retrieve-then-generate.
//!
//! ```text
//! question -> embed -> retrieve top k -> build prompt -> generate
//! ```
//!
//! Every intermediate artifact is kept in a [`PipelineTrace`] so callers can
//! show or test each step.

use std::collections::HashSet;

use ragkit_core::ScoreError;
use ragkit_search::{Embedder, Retrieved, VectorStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::Result;
use crate::prompt::{NO_ANSWER, Prompt, build_prompt};

/// Turns a prompt into an answer.
pub trait Generator {
    /// # Errors
    ///
    /// Returns [`crate::ContextError::Generation`] when no answer can be
    /// produced.
    fn generate(&self, prompt: &Prompt) -> Result<String>;

    /// Name shown in traces.
    fn name(&self) -> &'static str;
}

/// Offline generator that answers with the context passage sharing the most
/// words with the question.
///
/// Ties go to the earlier (better ranked) passage. With no overlap at all it
/// answers [`NO_ANSWER`], as the grounded template instructs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveGenerator;

fn words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl Generator for ExtractiveGenerator {
    fn generate(&self, prompt: &Prompt) -> Result<String> {
        let question = words(&prompt.question);
        let mut best: Option<(usize, &str)> = None;
        for passage in &prompt.passages {
            let overlap = words(passage).intersection(&question).count();
            if overlap > 0 && best.is_none_or(|(top, _)| overlap > top) {
                best = Some((overlap, passage.as_str()));
            }
        }
        Ok(best.map_or_else(|| NO_ANSWER.to_owned(), |(_, p)| p.to_owned()))
    }

    fn name(&self) -> &'static str {
        "extractive"
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTrace {
    pub question: String,
    pub query_vector: Vec<f64>,
    pub retrieved: Vec<Retrieved>,
    pub prompt: Prompt,
    pub generator: String,
    pub answer: String,
}

/// Embedder, document store and generator wired together.
#[derive(Debug)]
pub struct RagPipeline<E, G = ExtractiveGenerator> {
    embedder: E,
    store: VectorStore,
    generator: G,
    top_k: usize,
}

impl<E: Embedder, G: Generator> RagPipeline<E, G> {
    /// A pipeline retrieving three documents per question.
    #[must_use]
    pub fn new(embedder: E, store: VectorStore, generator: G) -> Self {
        Self {
            embedder,
            store,
            generator,
            top_k: 3,
        }
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub const fn top_k(&self) -> usize {
        self.top_k
    }

    #[must_use]
    pub const fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Run the full pipeline for one question.
    ///
    /// # Errors
    ///
    /// - [`crate::ContextError::Score`] if `top_k` is zero, the question cannot
    ///   be embedded, or retrieval fails.
    /// - [`crate::ContextError::Generation`] from the generator.
    #[instrument(skip(self), fields(top_k = self.top_k, generator = self.generator.name()))]
    pub fn answer(&self, question: &str) -> Result<PipelineTrace> {
        if self.top_k == 0 {
            return Err(ScoreError::invalid("top_k must be at least 1").into());
        }

        let query_vector = self.embedder.embed(question)?;
        let retrieved = self.store.search(&query_vector, self.top_k)?;
        debug!(
            top = retrieved.first().map(|r| r.id.as_str()),
            "retrieved {} documents",
            retrieved.len()
        );

        let passages: Vec<&str> = retrieved.iter().map(|r| r.text.as_str()).collect();
        let prompt = build_prompt(question, &passages);
        let answer = self.generator.generate(&prompt)?;

        Ok(PipelineTrace {
            question: question.to_owned(),
            query_vector,
            retrieved,
            prompt,
            generator: self.generator.name().to_owned(),
            answer,
        })
    }
}
