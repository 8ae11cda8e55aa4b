//! Cosine similarity over dense and sparse vectors.

use std::collections::BTreeMap;

/// Cosine similarity of two equal-length dense vectors.
///
/// Returns `0.0` when either vector has zero magnitude.
#[expect(
    clippy::float_arithmetic,
    reason = "cosine similarity needs dot products and norms"
)]
pub(crate) fn cosine_dense(left: &[f64], right: &[f64]) -> f64 {
    let dot: f64 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let denominator = norm(left.iter().copied()) * norm(right.iter().copied());
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

/// Cosine similarity of two sparse vectors keyed by column id.
///
/// Missing columns count as zero.
#[expect(
    clippy::float_arithmetic,
    reason = "cosine similarity needs dot products and norms"
)]
pub(crate) fn cosine_sparse(left: &BTreeMap<u64, f64>, right: &BTreeMap<u64, f64>) -> f64 {
    let dot: f64 = left
        .iter()
        .filter_map(|(column, a)| right.get(column).map(|b| a * b))
        .sum();
    let denominator = norm(left.values().copied()) * norm(right.values().copied());
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

#[expect(clippy::float_arithmetic, reason = "Euclidean norm")]
pub(crate) fn norm(values: impl Iterator<Item = f64>) -> f64 {
    values.map(|value| value * value).sum::<f64>().sqrt()
}
