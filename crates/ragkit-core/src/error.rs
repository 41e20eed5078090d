use std::fmt;

/// Machine-readable error codes for scoring failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidInput,
    DegenerateVector,
    DimensionMismatch,
    CorpusMismatch,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidInput => "E1001",
            Self::DegenerateVector => "E2001",
            Self::DimensionMismatch => "E2002",
            Self::CorpusMismatch => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid scoring input",
            Self::DegenerateVector => "Zero-norm vector",
            Self::DimensionMismatch => "Vector dimension mismatch",
            Self::CorpusMismatch => "Score sets cover different documents",
        }
    }

    /// Optional remediation hint for the caller.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidInput => {
                Some("Supply a non-empty corpus, a non-empty query and a vector for every document.")
            }
            Self::DegenerateVector => Some("Check the embedder; an all-zero vector has no direction."),
            Self::DimensionMismatch => {
                Some("Embed the query and the documents with the same model.")
            }
            Self::CorpusMismatch => Some("Score both signals over the same corpus before fusing."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by the scoring core.
///
/// Every failure is local and synchronous: a call either returns a complete
/// result for the whole corpus or one of these, never a partial result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    /// Empty corpus, empty query, missing vectors or out-of-range parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A vector with zero Euclidean norm was passed to cosine similarity.
    #[error("degenerate vector: {0} has zero norm")]
    DegenerateVector(String),

    /// Two vectors of different length were compared.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Fusion was asked to combine score sets over different documents.
    #[error("corpus mismatch: {0}")]
    CorpusMismatch(String),
}

impl ScoreError {
    /// Shorthand for [`ScoreError::InvalidInput`].
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// The machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::DegenerateVector(_) => ErrorCode::DegenerateVector,
            Self::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            Self::CorpusMismatch(_) => ErrorCode::CorpusMismatch,
        }
    }
}

/// Result alias used throughout the scoring crates.
pub type Result<T> = std::result::Result<T, ScoreError>;

#[cfg(test)]
mod tests {
    use super::{ErrorCode, ScoreError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::InvalidInput,
            ErrorCode::DegenerateVector,
            ErrorCode::DimensionMismatch,
            ErrorCode::CorpusMismatch,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::DimensionMismatch.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn dimension_mismatch_names_both_sizes() {
        let err = ScoreError::DimensionMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 4, got 3");
        assert_eq!(err.code(), ErrorCode::DimensionMismatch);
    }
}
