//! Score fusion: min-max normalization, weighted linear fusion, reciprocal
//! rank fusion, and the hybrid orchestrator that runs both scorers.

pub mod hybrid;
pub mod normalize;
pub mod scoring;

pub use hybrid::{HybridHit, HybridResult, HybridScorer};
pub use normalize::min_max_normalize;
pub use scoring::{
    DEFAULT_RRF_K, FusionMethod, FusionResult, fuse, reciprocal_rank_fusion, rrf_fuse,
    weighted_fusion,
};
