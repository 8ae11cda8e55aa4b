//! Insertion-ordered score accumulation with stable ranking.

use std::cmp::Ordering;
use std::collections::HashMap;

/// Accumulates scores per provider while remembering first-seen order.
///
/// Ranking sorts by descending score with a stable sort, so equal scores
/// keep the order in which providers were first added.
#[derive(Debug, Default)]
pub(crate) struct ScoreBoard {
    entries: Vec<(u64, f64)>,
    positions: HashMap<u64, usize>,
}

impl ScoreBoard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "scores accumulate across fusion terms"
    )]
    pub(crate) fn add(&mut self, id: u64, amount: f64) {
        if let Some(entry) = self
            .positions
            .get(&id)
            .and_then(|&position| self.entries.get_mut(position))
        {
            entry.1 += amount;
            return;
        }
        self.positions.insert(id, self.entries.len());
        self.entries.push((id, amount));
    }

    pub(crate) fn ranked(mut self) -> Vec<(u64, f64)> {
        self.entries.sort_by(|left, right| descending(left.1, right.1));
        self.entries
    }
}

/// Descending order with NaN treated as the lowest score.
pub(crate) fn descending(left: f64, right: f64) -> Ordering {
    rank_key(right).total_cmp(&rank_key(left))
}

const fn rank_key(value: f64) -> f64 {
    if value.is_nan() {
        f64::NEG_INFINITY
    } else {
        value
    }
}

/// Points awarded to position `index` in a list of `len` entries.
#[expect(
    clippy::cast_precision_loss,
    reason = "list positions stay far below 2^52"
)]
pub(crate) const fn rank_points(len: usize, index: usize) -> f64 {
    len.saturating_sub(index) as f64
}
