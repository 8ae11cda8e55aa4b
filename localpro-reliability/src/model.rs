//! Capabilities shared by every reliability model.

use localpro_core::ReliabilityLabel;
use serde::{Deserialize, Serialize};

use crate::{FEATURE_COUNT, TrainingError};

/// Probability assigned to each reliability class.
///
/// Serialises with the marketplace display names as keys.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassProbabilities {
    /// Probability of [`ReliabilityLabel::Low`].
    #[serde(rename = "Low Reliability")]
    pub low: f64,
    /// Probability of [`ReliabilityLabel::Moderate`].
    #[serde(rename = "Moderately Reliable")]
    pub moderate: f64,
    /// Probability of [`ReliabilityLabel::High`].
    #[serde(rename = "Highly Reliable")]
    pub high: f64,
}

impl ClassProbabilities {
    /// Build from values in class-index order.
    #[must_use]
    pub const fn from_array([low, moderate, high]: [f64; ReliabilityLabel::COUNT]) -> Self {
        Self {
            low,
            moderate,
            high,
        }
    }

    /// Values in class-index order.
    #[must_use]
    pub const fn to_array(self) -> [f64; ReliabilityLabel::COUNT] {
        [self.low, self.moderate, self.high]
    }

    /// Probability of `label`.
    #[must_use]
    pub const fn get(&self, label: ReliabilityLabel) -> f64 {
        match label {
            ReliabilityLabel::Low => self.low,
            ReliabilityLabel::Moderate => self.moderate,
            ReliabilityLabel::High => self.high,
        }
    }

    /// Most probable label; ties go to the lower class index.
    #[must_use]
    pub fn most_likely(&self) -> (ReliabilityLabel, f64) {
        ReliabilityLabel::ALL
            .into_iter()
            .map(|label| (label, self.get(label)))
            .fold((ReliabilityLabel::Low, f64::NEG_INFINITY), |best, candidate| {
                if candidate.1 > best.1 { candidate } else { best }
            })
    }
}

/// Training entry point shared by the tree and linear models.
pub trait Fit: Sized {
    /// Hyperparameters for one fit.
    type Config;

    /// Fit a model on standardised `inputs` with per-sample `weights`.
    ///
    /// # Errors
    /// Returns [`TrainingError`] when the inputs are unusable or the
    /// configuration is invalid.
    fn fit(
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        config: &Self::Config,
    ) -> Result<Self, TrainingError>;
}

/// A fitted model that scores standardised inputs.
pub trait ProbabilisticClassifier {
    /// Class probabilities for one standardised input.
    fn predict_proba(&self, input: &[f64; FEATURE_COUNT]) -> ClassProbabilities;

    /// Most probable label for one standardised input.
    fn predict(&self, input: &[f64; FEATURE_COUNT]) -> ReliabilityLabel {
        self.predict_proba(input).most_likely().0
    }
}

pub(crate) fn check_lengths(
    inputs: &[[f64; FEATURE_COUNT]],
    labels: &[ReliabilityLabel],
    weights: &[f64],
) -> Result<(), TrainingError> {
    if inputs.len() == labels.len() && labels.len() == weights.len() {
        Ok(())
    } else {
        Err(TrainingError::LengthMismatch {
            inputs: inputs.len(),
            labels: labels.len(),
            weights: weights.len(),
        })
    }
}
