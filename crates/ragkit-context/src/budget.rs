//! Fitting ranked documents into a fixed context window.
//!
//! Token counts are approximate: four characters per token, rounded down.
//! Documents are taken strictly in the order given (best first) and the
//! first document that does not fit ends the context, even if a shorter one
//! further down would.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Characters per approximate token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Rough token count of `text`: characters divided by four.
///
/// ```
/// use ragkit_context::approx_token_count;
///
/// assert_eq!(approx_token_count("abcdefgh"), 2);
/// assert_eq!(approx_token_count("abc"), 0);
/// ```
#[must_use]
pub fn approx_token_count(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// One document's place in the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetedDoc {
    /// Zero-based position in the input.
    pub index: usize,
    pub tokens: usize,
}

/// Outcome of [`truncate_to_fit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationReport {
    pub max_tokens: usize,
    /// Tokens reserved for the prompt template and the query.
    pub overhead_tokens: usize,
    /// `max_tokens - overhead_tokens`, or 0 if the overhead alone overflows.
    pub available_tokens: usize,
    /// Tokens taken by the included documents.
    pub used_tokens: usize,
    pub included: Vec<BudgetedDoc>,
    pub excluded: Vec<BudgetedDoc>,
}

impl TruncationReport {
    #[must_use]
    pub fn included_count(&self) -> usize {
        self.included.len()
    }

    #[must_use]
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        !self.excluded.is_empty()
    }

    /// Whether the document at input position `index` made it in.
    #[must_use]
    pub fn includes(&self, index: usize) -> bool {
        self.included.iter().any(|d| d.index == index)
    }

    /// Tokens needed to include everything.
    #[must_use]
    pub fn total_tokens(&self) -> usize {
        self.overhead_tokens
            + self
                .included
                .iter()
                .chain(&self.excluded)
                .map(|d| d.tokens)
                .sum::<usize>()
    }
}

/// Take documents in order until the next one would overflow the budget.
///
/// `template` and `query` are counted as fixed overhead before any document.
#[instrument(skip_all, fields(docs = documents.len(), max_tokens = max_tokens))]
pub fn truncate_to_fit<S: AsRef<str>>(
    documents: &[S],
    max_tokens: usize,
    query: &str,
    template: &str,
) -> TruncationReport {
    let overhead_tokens = approx_token_count(template) + approx_token_count(query);
    let available_tokens = max_tokens.saturating_sub(overhead_tokens);

    let mut used_tokens = 0;
    let mut included = Vec::new();
    let mut excluded = Vec::new();

    for (index, doc) in documents.iter().enumerate() {
        let tokens = approx_token_count(doc.as_ref());
        if excluded.is_empty() && used_tokens + tokens <= available_tokens {
            used_tokens += tokens;
            included.push(BudgetedDoc { index, tokens });
        } else {
            excluded.push(BudgetedDoc { index, tokens });
        }
    }

    debug!(
        included = included.len(),
        excluded = excluded.len(),
        used_tokens,
        available_tokens,
        "truncated context"
    );
    TruncationReport {
        max_tokens,
        overhead_tokens,
        available_tokens,
        used_tokens,
        included,
        excluded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "Context:\n{context}\n\nQuestion: {question}\n\nAnswer:";

    #[test]
    fn counts_characters_not_bytes() {
        // Eight two-byte characters.
        assert_eq!(approx_token_count("éééééééé"), 2);
    }

    #[test]
    fn everything_fits_in_a_large_window() {
        let docs = ["a".repeat(400), "b".repeat(400)];
        let report = truncate_to_fit(&docs, 8000, "query", TEMPLATE);
        assert_eq!(report.included_count(), 2);
        assert!(!report.is_truncated());
        assert_eq!(report.used_tokens, 200);
    }

    #[test]
    fn overhead_is_reserved_first() {
        let report = truncate_to_fit::<&str>(&[], 100, &"q".repeat(40), TEMPLATE);
        assert_eq!(report.overhead_tokens, approx_token_count(TEMPLATE) + 10);
        assert_eq!(report.available_tokens, 100 - report.overhead_tokens);
    }

    #[test]
    fn stops_at_first_document_that_does_not_fit() {
        // 50, 100, 10 tokens with 60 available: the third would fit but is
        // still excluded.
        let docs = ["x".repeat(200), "y".repeat(400), "z".repeat(40)];
        let report = truncate_to_fit(&docs, 60, "", "");
        assert_eq!(report.included_count(), 1);
        assert_eq!(report.excluded_count(), 2);
        assert!(report.includes(0));
        assert!(!report.includes(2));
    }

    #[test]
    fn exact_fit_is_included() {
        let docs = ["x".repeat(40)];
        let report = truncate_to_fit(&docs, 10, "", "");
        assert_eq!(report.included_count(), 1);
        assert_eq!(report.used_tokens, 10);
    }

    #[test]
    fn overhead_larger_than_window_saturates() {
        let docs = ["x".repeat(4)];
        let report = truncate_to_fit(&docs, 2, &"q".repeat(40), TEMPLATE);
        assert_eq!(report.available_tokens, 0);
        assert_eq!(report.included_count(), 0);
        assert_eq!(report.excluded_count(), 1);
    }

    #[test]
    fn total_tokens_counts_everything() {
        let docs = ["x".repeat(40), "y".repeat(400)];
        let report = truncate_to_fit(&docs, 20, "", "");
        assert_eq!(report.total_tokens(), 110);
    }
}
