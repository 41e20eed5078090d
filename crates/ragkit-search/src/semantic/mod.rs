//! Dense-vector similarity: cosine scoring, vector arithmetic and the
//! embedder seam.

pub mod embed;
pub mod search;
pub mod vector;

pub use embed::{Embedder, FixtureEmbedder, embed_corpus};
pub use search::{cosine_scores, nearest_neighbors, retrieve_top_k, semantic_scores};
pub use vector::{add, analogy, cosine_similarity, dot, l2_norm, sub};
