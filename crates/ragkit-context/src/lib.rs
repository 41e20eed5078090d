#![forbid(unsafe_code)]
//! ragkit-context library.
//!
//! What happens to retrieved documents after scoring:
//!
//! - [`budget`]: fit documents into a token budget, in rank order.
//! - [`ordering`]: a U-shaped positional attention model and reorderings that
//!   keep the best documents away from the middle of the context.
//! - [`prompt`]: the grounded-answer prompt.
//! - [`pipeline`]: embed, retrieve, build prompt, generate.
//!
//! # Conventions
//!
//! - **Errors**: Budgeting and ordering return `ragkit_core::error::Result`;
//!   the pipeline returns [`ContextError`], which wraps scoring errors.
//! - **Logging**: Use `tracing` macros (`debug!` for per-call details).

pub mod budget;
pub mod error;
pub mod ordering;
pub mod pipeline;
pub mod prompt;

pub use budget::{TruncationReport, approx_token_count, truncate_to_fit};
pub use error::ContextError;
pub use ordering::{AttentionLevel, OrderingStrategy, attention_weight, reorder};
pub use pipeline::{ExtractiveGenerator, Generator, PipelineTrace, RagPipeline};
pub use prompt::{Prompt, build_prompt};
