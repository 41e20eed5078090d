use ragkit_core::ScoreError;

/// Errors from the retrieve-then-generate pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContextError {
    /// Embedding, retrieval or parameter validation failed.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// The generator could not produce an answer.
    #[error("generation failed: {0}")]
    Generation(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
