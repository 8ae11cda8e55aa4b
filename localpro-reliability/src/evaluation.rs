//! Held-out evaluation and the report produced by training.

use localpro_core::ReliabilityLabel;
use serde::{Deserialize, Serialize};

use crate::{FEATURE_COUNT, FEATURE_NAMES, ProbabilisticClassifier, Split};

const CLASS_COUNT: usize = ReliabilityLabel::COUNT;

/// Accuracy and confusion counts on a held-out split.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of correctly labelled rows; zero for an empty split.
    pub accuracy: f64,
    /// `confusion[actual][predicted]` row counts in class-index order.
    pub confusion: [[usize; CLASS_COUNT]; CLASS_COUNT],
}

impl Evaluation {
    /// Score `model` on `split`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "accuracy is a ratio of counts"
    )]
    pub fn of<M: ProbabilisticClassifier + ?Sized>(model: &M, split: &Split) -> Self {
        let mut confusion = [[0_usize; CLASS_COUNT]; CLASS_COUNT];
        for (input, label) in split.inputs.iter().zip(&split.labels) {
            let predicted = model.predict(input);
            if let Some(cell) = confusion
                .get_mut(label.index())
                .and_then(|row| row.get_mut(predicted.index()))
            {
                *cell = cell.saturating_add(1);
            }
        }
        let correct: usize = ReliabilityLabel::ALL
            .iter()
            .filter_map(|label| {
                confusion
                    .get(label.index())
                    .and_then(|row| row.get(label.index()))
            })
            .sum();
        let accuracy = if split.is_empty() {
            0.0
        } else {
            correct as f64 / split.len() as f64
        };
        Self {
            accuracy,
            confusion,
        }
    }

    /// Number of rows scored.
    #[must_use]
    pub fn total(&self) -> usize {
        self.confusion.iter().flatten().sum()
    }
}

/// Importance of one named feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    /// Feature name.
    pub name: String,
    /// Share of the forest's impurity decrease.
    pub importance: f64,
}

impl FeatureImportance {
    /// Pair importances with feature names, most important first.
    #[must_use]
    pub fn ranked(importances: &[f64; FEATURE_COUNT]) -> Vec<Self> {
        let mut ranked: Vec<Self> = FEATURE_NAMES
            .iter()
            .zip(importances)
            .map(|(name, importance)| Self {
                name: (*name).to_owned(),
                importance: *importance,
            })
            .collect();
        ranked.sort_by(|left, right| right.importance.total_cmp(&left.importance));
        ranked
    }
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Random forest on the test split.
    pub tree: Evaluation,
    /// Logistic regression on the test split.
    pub linear: Evaluation,
    /// Forest importances, most important first.
    pub feature_importances: Vec<FeatureImportance>,
    /// Rows used for fitting.
    pub train_size: usize,
    /// Rows held out.
    pub test_size: usize,
    /// Whether the split preserved class proportions.
    pub stratified: bool,
}
