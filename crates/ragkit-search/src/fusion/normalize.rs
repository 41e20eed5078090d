//! Min-max score normalization.

use ragkit_core::ScoreSet;

/// Rescale scores linearly onto `[0, 1]`.
///
/// The minimum maps to 0 and the maximum to 1. When every score is equal the
/// range is zero and all documents map to `0.5`: no document is preferred,
/// and the signal neither dominates nor vanishes in a weighted sum.
///
/// ```
/// use ragkit_core::{DocId, ScoreSet};
/// use ragkit_search::fusion::min_max_normalize;
///
/// let set = ScoreSet::new([(DocId::new("a"), 2.0), (DocId::new("b"), 4.0)]).unwrap();
/// let norm = min_max_normalize(&set);
/// assert_eq!(norm.get(&DocId::new("a")), Some(0.0));
/// assert_eq!(norm.get(&DocId::new("b")), Some(1.0));
/// ```
#[must_use]
pub fn min_max_normalize(scores: &ScoreSet) -> ScoreSet {
    let Some((lo, hi)) = scores.bounds() else {
        return scores.clone();
    };
    let range = hi - lo;
    if range <= 0.0 {
        return scores.map_scores(|_| 0.5);
    }
    scores.map_scores(|s| ((s - lo) / range).clamp(0.0, 1.0))
}
