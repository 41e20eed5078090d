//! Prompt construction.

use serde::{Deserialize, Serialize};

/// Reply the model is told to give when the context lacks the answer.
pub const NO_ANSWER: &str = "I don't have enough information to answer this question.";

/// Template instructing the model to answer only from the supplied context.
///
/// `{context}` and `{question}` are substituted by [`render`].
pub const GROUNDED_TEMPLATE: &str = "Answer the question based ONLY on the following context. \
If the answer is not in the context, say \"I don't have enough information to answer this question.\"\n\
\n\
Context:\n\
{context}\n\
\n\
Question: {question}\n\
\n\
Answer:";

/// A rendered prompt plus the pieces it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub question: String,
    /// Context passages in the order they appear in `text`.
    pub passages: Vec<String>,
    pub text: String,
}

/// Number the passages `Document 1: ...` and separate them with blank lines.
#[must_use]
pub fn format_context<S: AsRef<str>>(passages: &[S]) -> String {
    passages
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Document {}: {}", i + 1, p.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Substitute `{context}` and `{question}` into `template`.
///
/// Placeholders are read from the template only. Braces inside the question
/// or the passages are copied through untouched.
#[must_use]
pub fn render<S: AsRef<str>>(template: &str, question: &str, passages: &[S]) -> String {
    let context = format_context(passages);
    let mut out = String::with_capacity(template.len() + context.len() + question.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{context}") {
            out.push_str(&context);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{question}") {
            out.push_str(question);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// The grounded-answer prompt for `question` over `passages`.
///
/// ```
/// use ragkit_context::build_prompt;
///
/// let prompt = build_prompt("Who?", &["Alice did it."]);
/// assert!(prompt.text.contains("Document 1: Alice did it."));
/// assert!(prompt.text.ends_with("Question: Who?\n\nAnswer:"));
/// ```
#[must_use]
pub fn build_prompt<S: AsRef<str>>(question: &str, passages: &[S]) -> Prompt {
    Prompt {
        question: question.to_owned(),
        passages: passages.iter().map(|p| p.as_ref().to_owned()).collect(),
        text: render(GROUNDED_TEMPLATE, question, passages),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passages_are_numbered_and_separated() {
        let ctx = format_context(&["first", "second"]);
        assert_eq!(ctx, "Document 1: first\n\nDocument 2: second");
    }

    #[test]
    fn template_carries_refusal_instruction() {
        let prompt = build_prompt("Where?", &["Austin."]);
        assert!(prompt.text.starts_with("Answer the question based ONLY"));
        assert!(prompt.text.contains(NO_ANSWER));
        assert!(prompt.text.contains("Context:\nDocument 1: Austin.\n\nQuestion: Where?"));
        assert_eq!(prompt.passages, vec!["Austin."]);
    }

    #[test]
    fn custom_template_renders() {
        let text = render("Q={question} C={context}", "why", &["a"]);
        assert_eq!(text, "Q=why C=Document 1: a");
    }

    #[test]
    fn empty_context_renders_blank() {
        let prompt = build_prompt::<&str>("Who?", &[]);
        assert!(prompt.text.contains("Context:\n\n\nQuestion: Who?"));
    }

    #[test]
    fn placeholders_inside_passages_are_left_alone() {
        let text = render(
            "C={context} Q={question}",
            "what is {context}?",
            &["use {question} here", "{unknown}"],
        );
        assert_eq!(
            text,
            "C=Document 1: use {question} here\n\nDocument 2: {unknown} Q=what is {context}?"
        );
    }

    #[test]
    fn unknown_braces_in_template_survive() {
        assert_eq!(render("{x} {question}", "q", &["a"]), "{x} q");
    }
}
