//! Dense vector arithmetic.
//!
//! Every binary operation checks dimensions and reports
//! [`ScoreError::DimensionMismatch`] with the left operand's length as the
//! expected size. NaN and infinite components are rejected as
//! [`ScoreError::InvalidInput`].

use ragkit_core::error::{Result, ScoreError};

pub(crate) fn check_finite(v: &[f64]) -> Result<()> {
    if v.is_empty() {
        return Err(ScoreError::invalid("vectors must not be empty"));
    }
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(ScoreError::invalid(format!(
            "vector component {pos} is not finite ({})",
            v[pos]
        )));
    }
    Ok(())
}

pub(crate) fn check_dims(left: &[f64], right: &[f64]) -> Result<()> {
    if left.is_empty() || right.is_empty() {
        return Err(ScoreError::invalid("vectors must not be empty"));
    }
    if left.len() != right.len() {
        return Err(ScoreError::DimensionMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }
    check_finite(left)?;
    check_finite(right)
}

/// Dot product.
///
/// # Errors
///
/// Fails on empty or differently sized vectors.
pub fn dot(left: &[f64], right: &[f64]) -> Result<f64> {
    check_dims(left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a * b).sum())
}

/// Euclidean length.
///
/// Components are scaled by the largest magnitude first, so squaring neither
/// overflows huge components nor flushes tiny ones to zero.
#[must_use]
pub fn l2_norm(v: &[f64]) -> f64 {
    let scale = v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }
    scale * v.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt()
}

/// Norm of a vector about to be used as a direction.
pub(crate) fn direction_norm(v: &[f64], label: impl FnOnce() -> String) -> Result<f64> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        Ok(norm)
    } else {
        Err(ScoreError::DegenerateVector(label()))
    }
}

/// Cosine from precomputed norms. Inputs must already be checked.
pub(crate) fn cosine_with_norms(
    left: &[f64],
    left_norm: f64,
    right: &[f64],
    right_norm: f64,
) -> f64 {
    left.iter()
        .zip(right)
        .map(|(a, b)| (a / left_norm) * (b / right_norm))
        .sum::<f64>()
        .clamp(-1.0, 1.0)
}

/// Cosine of the angle between `left` and `right`, in `[-1, 1]`.
///
/// Only direction matters: scaling either vector by a positive factor leaves
/// the result unchanged.
///
/// # Errors
///
/// - [`ScoreError::InvalidInput`] if either vector is empty or has a NaN or
///   infinite component.
/// - [`ScoreError::DimensionMismatch`] if the lengths differ.
/// - [`ScoreError::DegenerateVector`] if either vector has zero norm; the
///   angle is undefined and no score is invented for it.
///
/// # Examples
///
/// ```
/// use ragkit_search::semantic::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 1.0], &[100.0, 100.0]).unwrap();
/// assert!((sim - 1.0).abs() < 1e-12);
/// assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).is_err());
/// ```
pub fn cosine_similarity(left: &[f64], right: &[f64]) -> Result<f64> {
    check_dims(left, right)?;
    let left_norm = direction_norm(left, || "left operand".into())?;
    let right_norm = direction_norm(right, || "right operand".into())?;
    Ok(cosine_with_norms(left, left_norm, right, right_norm))
}

/// Element-wise `left + right`.
///
/// # Errors
///
/// Fails on empty or differently sized vectors.
pub fn add(left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    check_dims(left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a + b).collect())
}

/// Element-wise `left - right`.
///
/// # Errors
///
/// Fails on empty or differently sized vectors.
pub fn sub(left: &[f64], right: &[f64]) -> Result<Vec<f64>> {
    check_dims(left, right)?;
    Ok(left.iter().zip(right).map(|(a, b)| a - b).collect())
}

/// The analogy offset `a - b + c` ("king - man + woman").
///
/// # Errors
///
/// Fails on empty or differently sized vectors.
pub fn analogy(a: &[f64], b: &[f64], c: &[f64]) -> Result<Vec<f64>> {
    add(&sub(a, b)?, c)
}
