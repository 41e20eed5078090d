//! Combining a lexical and a semantic [`ScoreSet`] into one.
//!
//! # Methods
//!
//! **Weighted linear fusion** min-max normalizes both signals and
//! interpolates:
//!
//! ```text
//! fused = (1 - alpha) * norm_lexical + alpha * norm_semantic
//! ```
//!
//! `alpha = 0` is pure lexical, `alpha = 1` pure semantic.
//!
//! **Reciprocal Rank Fusion (RRF)** ignores score magnitudes and uses only
//! positions:
//!
//! ```text
//! fused = sum over signals of: 1 / (k + rank_in_signal)
//! ```
//!
//! Ranks are 1-based and ties within a signal are broken by corpus order, so
//! the result is deterministic. `k` defaults to 60.
//!
//! Both inputs must score exactly the same documents. The fused set keeps the
//! lexical set's entry order, which is therefore the tie-break of the fused
//! ranking.
//!
//! # Example
//!
//! ```
//! use ragkit_core::{DocId, ScoreSet};
//! use ragkit_search::fusion::{FusionMethod, fuse};
//!
//! let lexical = ScoreSet::new([(DocId::new("a"), 3.2), (DocId::new("b"), 0.0)]).unwrap();
//! let semantic = ScoreSet::new([(DocId::new("a"), 0.1), (DocId::new("b"), 0.9)]).unwrap();
//!
//! let fused = fuse(&lexical, &semantic, FusionMethod::Weighted { alpha: 0.7 }).unwrap();
//! assert_eq!(fused.ranking().top(1)[0].id, DocId::new("b"));
//! ```

use std::collections::HashMap;

use ragkit_core::config::{FusionConfig, FusionStrategy};
use ragkit_core::error::{Result, ScoreError};
use ragkit_core::{DocId, Ranking, ScoreSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::normalize::min_max_normalize;

/// Default RRF constant.
pub const DEFAULT_RRF_K: usize = 60;

/// How two signals are combined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum FusionMethod {
    /// Min-max normalize, then `(1 - alpha) * lexical + alpha * semantic`.
    Weighted { alpha: f64 },
    /// Sum of `1 / (k + rank)` over both signals.
    ReciprocalRank { k: usize },
}

impl Default for FusionMethod {
    fn default() -> Self {
        Self::ReciprocalRank { k: DEFAULT_RRF_K }
    }
}

impl From<&FusionConfig> for FusionMethod {
    fn from(config: &FusionConfig) -> Self {
        match config.strategy {
            FusionStrategy::Weighted => Self::Weighted {
                alpha: config.alpha,
            },
            FusionStrategy::ReciprocalRank => Self::ReciprocalRank { k: config.rrf_k },
        }
    }
}

impl FusionMethod {
    /// Short label for display.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Weighted { .. } => "weighted",
            Self::ReciprocalRank { .. } => "reciprocal_rank",
        }
    }
}

/// Fused scores tagged with the method that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionResult {
    pub method: FusionMethod,
    pub scores: ScoreSet,
}

impl FusionResult {
    /// Fused ranking, best first.
    #[must_use]
    pub fn ranking(&self) -> Ranking {
        self.scores.ranking()
    }
}

// ---------------------------------------------------------------------------
// Fusion entry points
// ---------------------------------------------------------------------------

fn check_pair(lexical: &ScoreSet, semantic: &ScoreSet) -> Result<()> {
    if lexical.is_empty() || semantic.is_empty() {
        return Err(ScoreError::invalid("cannot fuse an empty score set"));
    }
    if !lexical.covers_same_documents(semantic) {
        return Err(ScoreError::CorpusMismatch(format!(
            "lexical scores cover {} documents, semantic scores cover {} with different ids",
            lexical.len(),
            semantic.len()
        )));
    }
    Ok(())
}

/// Weighted linear fusion of min-max normalized scores.
///
/// # Errors
///
/// - [`ScoreError::InvalidInput`] if `alpha` is outside `[0, 1]` or either set
///   is empty.
/// - [`ScoreError::CorpusMismatch`] if the sets cover different documents.
#[instrument(skip(lexical, semantic), fields(docs = lexical.len()))]
pub fn weighted_fusion(lexical: &ScoreSet, semantic: &ScoreSet, alpha: f64) -> Result<ScoreSet> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(ScoreError::invalid(format!(
            "alpha must be within [0, 1], got {alpha}"
        )));
    }
    check_pair(lexical, semantic)?;

    let norm_lex = min_max_normalize(lexical);
    let norm_sem = min_max_normalize(semantic);

    let fused = ScoreSet::new(norm_lex.iter().map(|entry| {
        // Presence is guaranteed by `check_pair`.
        let sem = norm_sem.get(&entry.id).unwrap_or(0.0);
        (entry.id.clone(), (1.0 - alpha) * entry.score + alpha * sem)
    }))?;
    debug!("weighted fusion over {} documents", fused.len());
    Ok(fused)
}

/// Reciprocal Rank Fusion of two full rankings.
///
/// # Errors
///
/// - [`ScoreError::InvalidInput`] if either set is empty.
/// - [`ScoreError::CorpusMismatch`] if the sets cover different documents.
#[instrument(skip(lexical, semantic), fields(docs = lexical.len()))]
pub fn reciprocal_rank_fusion(
    lexical: &ScoreSet,
    semantic: &ScoreSet,
    k: usize,
) -> Result<ScoreSet> {
    check_pair(lexical, semantic)?;

    // Rank the semantic signal in lexical entry order so both signals break
    // ties the same way.
    let aligned = ScoreSet::new(
        lexical
            .ids()
            .map(|id| (id.clone(), semantic.get(id).unwrap_or(0.0))),
    )?;
    let lex_ranks = rank_table(&lexical.ranking());
    let sem_ranks = rank_table(&aligned.ranking());

    let fused = ScoreSet::new(lexical.ids().map(|id| {
        let score =
            rrf_term(k, lex_ranks.get(id).copied()) + rrf_term(k, sem_ranks.get(id).copied());
        (id.clone(), score)
    }))?;
    debug!("rrf fusion over {} documents", fused.len());
    Ok(fused)
}

/// Fuse with either method.
///
/// # Errors
///
/// See [`weighted_fusion`] and [`reciprocal_rank_fusion`].
pub fn fuse(
    lexical: &ScoreSet,
    semantic: &ScoreSet,
    method: FusionMethod,
) -> Result<FusionResult> {
    let scores = match method {
        FusionMethod::Weighted { alpha } => weighted_fusion(lexical, semantic, alpha)?,
        FusionMethod::ReciprocalRank { k } => reciprocal_rank_fusion(lexical, semantic, k)?,
    };
    Ok(FusionResult { method, scores })
}

/// Reciprocal Rank Fusion over any number of ranked id lists, best first.
///
/// Lists may be partial: an id absent from a list contributes 0 for it.
/// Output is sorted by fused score descending, ties by first appearance.
///
/// ```
/// use ragkit_core::DocId;
/// use ragkit_search::fusion::rrf_fuse;
///
/// let a = [DocId::new("x"), DocId::new("y")];
/// let b = [DocId::new("y")];
/// let fused = rrf_fuse(&[&a[..], &b[..]], 60);
/// assert_eq!(fused[0].0, DocId::new("y"));
/// ```
#[must_use]
pub fn rrf_fuse(lists: &[&[DocId]], k: usize) -> Vec<(DocId, f64)> {
    let mut order: Vec<DocId> = Vec::new();
    let mut scores: HashMap<DocId, f64> = HashMap::new();

    for list in lists {
        for (idx, id) in list.iter().enumerate() {
            let contribution = rrf_term(k, Some(idx + 1));
            scores
                .entry(id.clone())
                .and_modify(|s| *s += contribution)
                .or_insert_with(|| {
                    order.push(id.clone());
                    contribution
                });
        }
    }

    let mut result: Vec<(DocId, f64)> = order
        .into_iter()
        .map(|id| {
            let score = scores.get(&id).copied().unwrap_or(0.0);
            (id, score)
        })
        .collect();
    result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    result
}

fn rank_table(ranking: &Ranking) -> HashMap<DocId, usize> {
    ranking.iter().map(|r| (r.id.clone(), r.rank)).collect()
}

fn rrf_term(k: usize, rank: Option<usize>) -> f64 {
    rank.map_or(0.0, |rank| 1.0 / (k as f64 + rank as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocId {
        DocId::new(s)
    }

    fn set(pairs: &[(&str, f64)]) -> ScoreSet {
        ScoreSet::new(pairs.iter().map(|&(i, s)| (id(i), s))).unwrap()
    }

    // Three documents; lexical and semantic disagree completely.
    fn disagreeing() -> (ScoreSet, ScoreSet) {
        (
            set(&[("a", 9.0), ("b", 4.0), ("c", 0.0)]),
            set(&[("a", 0.1), ("b", 0.5), ("c", 0.9)]),
        )
    }

    #[test]
    fn alpha_zero_is_lexical_order() {
        let (lex, sem) = disagreeing();
        let fused = weighted_fusion(&lex, &sem, 0.0).unwrap();
        assert_eq!(
            fused.ranking().ids().collect::<Vec<_>>(),
            lex.ranking().ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn alpha_one_is_semantic_order() {
        let (lex, sem) = disagreeing();
        let fused = weighted_fusion(&lex, &sem, 1.0).unwrap();
        assert_eq!(
            fused.ranking().ids().collect::<Vec<_>>(),
            sem.ranking().ids().collect::<Vec<_>>()
        );
    }

    #[test]
    fn weighted_midpoint_value() {
        let (lex, sem) = disagreeing();
        let fused = weighted_fusion(&lex, &sem, 0.5).unwrap();
        // a: lex 1.0, sem 0.0 -> 0.5
        assert!((fused.get(&id("a")).unwrap() - 0.5).abs() < 1e-12);
        // b: lex 4/9, sem 0.5
        let expected_b = 0.5 * (4.0 / 9.0) + 0.5 * 0.5;
        assert!((fused.get(&id("b")).unwrap() - expected_b).abs() < 1e-12);
    }

    #[test]
    fn alpha_out_of_range_is_invalid_input() {
        let (lex, sem) = disagreeing();
        for alpha in [-0.1, 1.1, f64::NAN] {
            let err = weighted_fusion(&lex, &sem, alpha).unwrap_err();
            assert!(matches!(err, ScoreError::InvalidInput(_)), "alpha {alpha}");
        }
    }

    #[test]
    fn rrf_matches_formula() {
        let (lex, sem) = disagreeing();
        let fused = reciprocal_rank_fusion(&lex, &sem, 60).unwrap();
        // a: rank 1 lexical, rank 3 semantic.
        let expected = 1.0 / 61.0 + 1.0 / 63.0;
        assert!((fused.get(&id("a")).unwrap() - expected).abs() < 1e-12);
        // b is rank 2 in both.
        assert!((fused.get(&id("b")).unwrap() - 2.0 / 62.0).abs() < 1e-12);
    }

    #[test]
    fn rrf_ties_break_by_corpus_order() {
        let (lex, sem) = disagreeing();
        let fused = reciprocal_rank_fusion(&lex, &sem, 60).unwrap();
        // a and c both get 1/61 + 1/63, just above b's 2/62.
        let ranking = fused.ranking();
        assert_eq!(ranking.rank_of(&id("a")), Some(1));
        assert_eq!(ranking.rank_of(&id("c")), Some(2));
        assert_eq!(ranking.rank_of(&id("b")), Some(3));
    }

    #[test]
    fn rrf_semantic_ties_ignore_semantic_entry_order() {
        let lex = set(&[("a", 0.0), ("b", 0.0), ("c", 5.0)]);
        let sem_ab = set(&[("a", 0.5), ("b", 0.5), ("c", 0.1)]);
        let sem_ba = set(&[("b", 0.5), ("a", 0.5), ("c", 0.1)]);

        let first = reciprocal_rank_fusion(&lex, &sem_ab, 60).unwrap();
        let second = reciprocal_rank_fusion(&lex, &sem_ba, 60).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            second.ranking().ids().collect::<Vec<_>>(),
            vec![&id("a"), &id("c"), &id("b")]
        );
    }

    #[test]
    fn rrf_with_zero_k_is_allowed() {
        let (lex, sem) = disagreeing();
        let fused = reciprocal_rank_fusion(&lex, &sem, 0).unwrap();
        assert!((fused.get(&id("b")).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_ids_are_corpus_mismatch() {
        let lex = set(&[("a", 1.0), ("b", 2.0)]);
        let sem = set(&[("a", 0.1), ("z", 0.2)]);
        let err = weighted_fusion(&lex, &sem, 0.5).unwrap_err();
        assert!(matches!(err, ScoreError::CorpusMismatch(_)));
        let err = reciprocal_rank_fusion(&lex, &sem, 60).unwrap_err();
        assert!(matches!(err, ScoreError::CorpusMismatch(_)));
    }

    #[test]
    fn different_sizes_are_corpus_mismatch() {
        let lex = set(&[("a", 1.0), ("b", 2.0)]);
        let sem = set(&[("a", 0.1)]);
        let err = fuse(&lex, &sem, FusionMethod::default()).unwrap_err();
        assert!(matches!(err, ScoreError::CorpusMismatch(_)));
    }

    #[test]
    fn empty_inputs_are_invalid() {
        let err = fuse(&ScoreSet::default(), &ScoreSet::default(), FusionMethod::default())
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn fusion_output_follows_lexical_entry_order() {
        let lex = set(&[("b", 1.0), ("a", 2.0)]);
        let sem = set(&[("a", 0.3), ("b", 0.4)]);
        let fused = fuse(&lex, &sem, FusionMethod::Weighted { alpha: 0.5 }).unwrap();
        assert_eq!(fused.scores.ids().collect::<Vec<_>>(), vec![&id("b"), &id("a")]);
        assert_eq!(fused.method.name(), "weighted");
    }

    #[test]
    fn method_from_config() {
        let mut config = FusionConfig::default();
        assert_eq!(FusionMethod::from(&config), FusionMethod::ReciprocalRank { k: 60 });
        config.strategy = FusionStrategy::Weighted;
        config.alpha = 0.3;
        assert_eq!(FusionMethod::from(&config), FusionMethod::Weighted { alpha: 0.3 });
    }

    #[test]
    fn method_serializes_tagged() {
        let json = serde_json::to_string(&FusionMethod::Weighted { alpha: 0.7 }).unwrap();
        assert_eq!(json, r#"{"method":"weighted","alpha":0.7}"#);
        let back: FusionMethod =
            serde_json::from_str(r#"{"method":"reciprocal_rank","k":10}"#).unwrap();
        assert_eq!(back, FusionMethod::ReciprocalRank { k: 10 });
    }

    #[test]
    fn rrf_fuse_partial_lists() {
        let lexical = [id("bn-001"), id("bn-002")];
        let semantic = [id("bn-002"), id("bn-001"), id("bn-003")];
        let fused = rrf_fuse(&[&lexical[..], &semantic[..]], 60);
        assert_eq!(fused.len(), 3);
        // 001 and 002 tie; 001 appeared first.
        assert_eq!(fused[0].0, id("bn-001"));
        assert_eq!(fused[1].0, id("bn-002"));
        assert_eq!(fused[2].0, id("bn-003"));
        assert!((fused[2].1 - 1.0 / 63.0).abs() < 1e-12);
    }

    #[test]
    fn rrf_fuse_empty() {
        assert!(rrf_fuse(&[], 60).is_empty());
    }
}
