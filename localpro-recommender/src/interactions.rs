//! Sparse user×provider interaction scores.

use std::collections::{BTreeMap, BTreeSet};

use localpro_core::Interaction;
use serde::{Deserialize, Serialize};

use crate::InteractionWeights;
use crate::scoreboard::descending;

/// Weighted engagement of each user with each provider.
///
/// Rows are keyed by user id and columns by provider id; absent cells are
/// zero. Both axes iterate in ascending id order. When one user–provider
/// pair has records of several kinds, the cell holds the mean of their
/// weighted scores.
///
/// # Examples
/// ```
/// use localpro_core::{Interaction, InteractionKind};
/// use localpro_recommender::{InteractionMatrix, InteractionWeights};
///
/// let interactions = [
///     Interaction::new(1, 10, InteractionKind::Hire, 0),
///     Interaction::new(1, 20, InteractionKind::View, 0).with_count(3),
/// ];
/// let matrix = InteractionMatrix::build(&interactions, &InteractionWeights::default());
/// assert_eq!(matrix.score(1, 10), Some(4.0));
/// assert_eq!(matrix.score(1, 20), Some(3.0));
/// assert_eq!(matrix.score(2, 10), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionMatrix {
    rows: BTreeMap<u64, BTreeMap<u64, f64>>,
}

impl InteractionMatrix {
    /// Aggregate interaction records into a matrix.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "cell scores are weighted counts averaged across kinds"
    )]
    pub fn build(interactions: &[Interaction], weights: &InteractionWeights) -> Self {
        let mut totals: BTreeMap<u64, BTreeMap<u64, (f64, u32)>> = BTreeMap::new();
        for interaction in interactions.iter().filter(|record| record.count > 0) {
            let score = weights.weight(&interaction.kind) * f64::from(interaction.count);
            let cell = totals
                .entry(interaction.user_id)
                .or_default()
                .entry(interaction.provider_id)
                .or_insert((0.0, 0));
            cell.0 += score;
            cell.1 = cell.1.saturating_add(1);
        }
        let rows = totals
            .into_iter()
            .map(|(user, cells)| {
                let averaged = cells
                    .into_iter()
                    .map(|(provider, (sum, records))| (provider, sum / f64::from(records.max(1))))
                    .collect();
                (user, averaged)
            })
            .collect();
        Self { rows }
    }

    /// Score of one user–provider pair, or `None` when they never
    /// interacted.
    #[must_use]
    pub fn score(&self, user_id: u64, provider_id: u64) -> Option<f64> {
        self.rows.get(&user_id)?.get(&provider_id).copied()
    }

    /// Borrow a user's row, keyed by provider id.
    #[must_use]
    pub fn row(&self, user_id: u64) -> Option<&BTreeMap<u64, f64>> {
        self.rows.get(&user_id)
    }

    /// Report whether `user_id` has any recorded interaction.
    #[must_use]
    pub fn contains_user(&self, user_id: u64) -> bool {
        self.rows.contains_key(&user_id)
    }

    /// Iterate over users with their rows in ascending user id order.
    pub fn users(&self) -> impl Iterator<Item = (u64, &BTreeMap<u64, f64>)> + '_ {
        self.rows.iter().map(|(&user, row)| (user, row))
    }

    /// Every provider id that appears in at least one row, ascending.
    #[must_use]
    pub fn providers(&self) -> BTreeSet<u64> {
        self.rows
            .values()
            .flat_map(BTreeMap::keys)
            .copied()
            .collect()
    }

    /// Number of users with a row.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.rows.len()
    }

    /// Report whether no interactions were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A user's `k` highest-scoring providers, ties by ascending id.
    #[must_use]
    pub fn top_providers(&self, user_id: u64, k: usize) -> Vec<u64> {
        let Some(row) = self.rows.get(&user_id) else {
            return Vec::new();
        };
        let mut cells: Vec<(u64, f64)> = row.iter().map(|(&id, &score)| (id, score)).collect();
        cells.sort_by(|left, right| descending(left.1, right.1));
        cells.into_iter().take(k).map(|(id, _)| id).collect()
    }
}
