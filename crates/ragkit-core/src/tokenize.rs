//! Tokenization seam shared by every lexical scorer.
//!
//! The default [`WhitespaceTokenizer`] is intentionally naive: lowercase, then
//! split on Unicode whitespace. No stemming, no stop words, no punctuation
//! stripping, so `"noises."` and `"noises"` are different terms. Callers who
//! want something smarter implement [`Tokenizer`] and hand it to the scorer.

/// Turns raw text into the sequence of terms a lexical scorer counts.
///
/// Implementations must be deterministic: the same text always yields the
/// same token sequence, in order, with duplicates preserved.
pub trait Tokenizer {
    /// Tokenize `text` into owned terms.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Lowercase + whitespace split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(str::to_owned)
            .collect()
    }
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}
