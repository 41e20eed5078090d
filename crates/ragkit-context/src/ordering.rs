//! Lost-in-the-middle: positional attention and document reordering.
//!
//! Language models attend most to the start and end of a long context and
//! least to the middle. [`attention_weight`] is a simple U-shaped model of
//! that effect:
//!
//! ```text
//! x      = position / (total - 1)          (0.5 when total <= 1)
//! weight = 0.4 + 0.6 * (2 * |x - 0.5|) ^ 1.5
//! ```
//!
//! Edges get 1.0, the exact middle 0.4. The [`OrderingStrategy`] variants
//! move documents out of the low-attention zone.

use ragkit_core::error::{Result, ScoreError};
use serde::{Deserialize, Serialize};

/// Modelled attention at zero-based `position` of `total` slots, in `[0.4, 1]`.
///
/// Positions past the end are treated as the last slot.
#[must_use]
pub fn attention_weight(position: usize, total: usize) -> f64 {
    let x = if total > 1 {
        (position.min(total - 1) as f64) / ((total - 1) as f64)
    } else {
        0.5
    };
    let distance = (x - 0.5).abs();
    0.6f64.mul_add((2.0 * distance).powf(1.5), 0.4)
}

/// Weights for every slot of a `total`-slot context.
#[must_use]
pub fn attention_profile(total: usize) -> Vec<f64> {
    (0..total).map(|p| attention_weight(p, total)).collect()
}

/// Coarse bucket for an attention weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionLevel {
    /// Above 0.7.
    High,
    Medium,
    /// Below 0.5.
    Low,
}

impl AttentionLevel {
    #[must_use]
    pub fn from_weight(weight: f64) -> Self {
        if weight > 0.7 {
            Self::High
        } else if weight < 0.5 {
            Self::Low
        } else {
            Self::Medium
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MED",
            Self::Low => "LOW",
        }
    }
}

/// How to arrange documents that arrive ranked best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum OrderingStrategy {
    /// Keep rank order.
    RelevanceFirst,
    /// Move the document at `index` to the start.
    MoveToFront { index: usize },
    /// Move the document at `index` to the end.
    MoveToBack { index: usize },
    /// Odd ranks ascending, then even ranks descending: rank 1 opens the
    /// context, rank 2 closes it, the weakest land in the middle.
    Interleave,
}

impl OrderingStrategy {
    /// Input positions in output order, for `len` documents.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidInput`] if a move index is out of range.
    pub fn permutation(self, len: usize) -> Result<Vec<usize>> {
        let check = |index: usize| {
            if index < len {
                Ok(index)
            } else {
                Err(ScoreError::invalid(format!(
                    "index {index} out of range for {len} documents"
                )))
            }
        };
        let order = match self {
            Self::RelevanceFirst => (0..len).collect(),
            Self::MoveToFront { index } => {
                let index = check(index)?;
                std::iter::once(index)
                    .chain((0..len).filter(|&i| i != index))
                    .collect()
            }
            Self::MoveToBack { index } => {
                let index = check(index)?;
                (0..len)
                    .filter(|&i| i != index)
                    .chain(std::iter::once(index))
                    .collect()
            }
            Self::Interleave => {
                let evens = (0..len).step_by(2);
                let odds = (1..len).step_by(2).rev();
                evens.chain(odds).collect()
            }
        };
        Ok(order)
    }
}

/// Apply `strategy` to `items`.
///
/// # Errors
///
/// See [`OrderingStrategy::permutation`].
pub fn reorder<T: Clone>(items: &[T], strategy: OrderingStrategy) -> Result<Vec<T>> {
    Ok(strategy
        .permutation(items.len())?
        .into_iter()
        .map(|i| items[i].clone())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn edges_are_full_attention_middle_is_floor() {
        assert!(approx(attention_weight(0, 7), 1.0));
        assert!(approx(attention_weight(6, 7), 1.0));
        assert!(approx(attention_weight(3, 7), 0.4));
    }

    #[test]
    fn single_slot_sits_in_the_middle() {
        assert!(approx(attention_weight(0, 1), 0.4));
    }

    #[test]
    fn seven_slot_levels() {
        let levels: Vec<&str> = attention_profile(7)
            .into_iter()
            .map(|w| AttentionLevel::from_weight(w).label())
            .collect();
        assert_eq!(levels, vec!["HIGH", "HIGH", "MED", "LOW", "MED", "HIGH", "HIGH"]);
    }

    #[test]
    fn interleave_seven() {
        let order = OrderingStrategy::Interleave.permutation(7).unwrap();
        assert_eq!(order, vec![0, 2, 4, 6, 5, 3, 1]);
    }

    #[test]
    fn interleave_six() {
        let order = OrderingStrategy::Interleave.permutation(6).unwrap();
        assert_eq!(order, vec![0, 2, 4, 5, 3, 1]);
    }

    #[test]
    fn move_to_front_and_back() {
        let docs = ["a", "b", "c", "d"];
        assert_eq!(
            reorder(&docs, OrderingStrategy::MoveToFront { index: 2 }).unwrap(),
            vec!["c", "a", "b", "d"]
        );
        assert_eq!(
            reorder(&docs, OrderingStrategy::MoveToBack { index: 0 }).unwrap(),
            vec!["b", "c", "d", "a"]
        );
    }

    #[test]
    fn out_of_range_move_is_invalid() {
        let err = OrderingStrategy::MoveToBack { index: 4 }
            .permutation(4)
            .unwrap_err();
        assert!(matches!(err, ScoreError::InvalidInput(_)));
    }

    #[test]
    fn empty_input_is_fine() {
        assert!(reorder::<&str>(&[], OrderingStrategy::Interleave).unwrap().is_empty());
    }
}
