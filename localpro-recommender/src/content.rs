//! Content-based lookup of providers with similar profiles.

use crate::scoreboard::descending;
use crate::{ProviderFeatureMatrix, SimilarityMatrix};

/// The `k` providers most similar to `provider_id`, excluding itself.
///
/// Equal similarities keep row order. An unknown provider yields an empty
/// list.
pub(crate) fn similar(
    features: &ProviderFeatureMatrix,
    similarity: &SimilarityMatrix,
    provider_id: u64,
    k: usize,
) -> Vec<u64> {
    let Some(position) = features.position(provider_id) else {
        return Vec::new();
    };
    let Some(row) = similarity.row(position) else {
        return Vec::new();
    };
    let mut others: Vec<(usize, f64)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|(other, _)| *other != position)
        .collect();
    others.sort_by(|left, right| descending(left.1, right.1));
    others
        .into_iter()
        .filter_map(|(other, _)| features.provider_at(other))
        .take(k)
        .collect()
}
