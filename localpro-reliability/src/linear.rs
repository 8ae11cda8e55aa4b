//! Multinomial logistic regression fitted by full-batch gradient descent.

use localpro_core::ReliabilityLabel;
use serde::{Deserialize, Serialize};

use crate::model::check_lengths;
use crate::{ClassProbabilities, FEATURE_COUNT, Fit, ProbabilisticClassifier, TrainingError};

const CLASS_COUNT: usize = ReliabilityLabel::COUNT;

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Inverse L2 regularisation strength.
    pub c: f64,
    /// Upper bound on gradient steps.
    pub max_iterations: usize,
    /// Stop once every gradient component falls below this magnitude.
    pub tolerance: f64,
    /// Gradient descent step size.
    pub learning_rate: f64,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iterations: 1000,
            tolerance: 1e-4,
            learning_rate: 0.5,
        }
    }
}

impl LinearConfig {
    /// Validate the settings and return a copy.
    ///
    /// # Errors
    /// Returns [`TrainingError::InvalidConfig`] when a setting is out of
    /// range.
    pub fn validate(self) -> Result<Self, TrainingError> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.c) {
            return Err(invalid("c", "must be positive and finite"));
        }
        if self.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be at least 1"));
        }
        if !positive(self.tolerance) {
            return Err(invalid("tolerance", "must be positive and finite"));
        }
        if !positive(self.learning_rate) {
            return Err(invalid("learning_rate", "must be positive and finite"));
        }
        Ok(self)
    }
}

const fn invalid(name: &'static str, reason: &'static str) -> TrainingError {
    TrainingError::InvalidConfig { name, reason }
}

/// Softmax-linear model over the standardised features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    coefficients: [[f64; FEATURE_COUNT]; CLASS_COUNT],
    intercepts: [f64; CLASS_COUNT],
    iterations: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Per-class coefficient rows.
    #[must_use]
    pub const fn coefficients(&self) -> &[[f64; FEATURE_COUNT]; CLASS_COUNT] {
        &self.coefficients
    }

    /// Per-class intercepts.
    #[must_use]
    pub const fn intercepts(&self) -> &[f64; CLASS_COUNT] {
        &self.intercepts
    }

    /// Gradient steps taken during fitting.
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the gradient fell below the tolerance.
    #[must_use]
    pub const fn converged(&self) -> bool {
        self.converged
    }

    #[expect(clippy::float_arithmetic, reason = "linear scores")]
    fn scores(&self, input: &[f64; FEATURE_COUNT]) -> [f64; CLASS_COUNT] {
        let mut scores = self.intercepts;
        for (score, row) in scores.iter_mut().zip(&self.coefficients) {
            *score += row.iter().zip(input).map(|(weight, value)| weight * value).sum::<f64>();
        }
        scores
    }

    /// Gradient of the regularised weighted cross-entropy at the current
    /// parameters.
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "loss gradient"
    )]
    fn gradient(
        &self,
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        c: f64,
    ) -> ([[f64; FEATURE_COUNT]; CLASS_COUNT], [f64; CLASS_COUNT]) {
        let rows = inputs.len() as f64;
        let mut coefficients = [[0.0; FEATURE_COUNT]; CLASS_COUNT];
        let mut intercepts = [0.0; CLASS_COUNT];
        for ((input, label), weight) in inputs.iter().zip(labels).zip(weights) {
            let probabilities = softmax(self.scores(input));
            for (class, (probability, (row, intercept))) in probabilities
                .iter()
                .zip(coefficients.iter_mut().zip(intercepts.iter_mut()))
                .enumerate()
            {
                let target = if class == label.index() { 1.0 } else { 0.0 };
                let residual = weight * (probability - target);
                *intercept += residual;
                for (total, value) in row.iter_mut().zip(input) {
                    *total += residual * value;
                }
            }
        }
        for (row, current) in coefficients.iter_mut().zip(&self.coefficients) {
            for (total, weight) in row.iter_mut().zip(current) {
                *total = *total / rows + weight / (c * rows);
            }
        }
        for total in &mut intercepts {
            *total /= rows;
        }
        (coefficients, intercepts)
    }

    #[expect(clippy::float_arithmetic, reason = "gradient step")]
    fn step(
        &mut self,
        gradient: &([[f64; FEATURE_COUNT]; CLASS_COUNT], [f64; CLASS_COUNT]),
        learning_rate: f64,
    ) {
        let (coefficients, intercepts) = gradient;
        for (row, delta) in self.coefficients.iter_mut().zip(coefficients) {
            for (weight, change) in row.iter_mut().zip(delta) {
                *weight -= learning_rate * change;
            }
        }
        for (intercept, change) in self.intercepts.iter_mut().zip(intercepts) {
            *intercept -= learning_rate * change;
        }
    }
}

impl Fit for LogisticRegression {
    type Config = LinearConfig;

    fn fit(
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        config: &Self::Config,
    ) -> Result<Self, TrainingError> {
        check_lengths(inputs, labels, weights)?;
        let settings = config.validate()?;
        if inputs.is_empty() {
            return Err(TrainingError::InsufficientExamples {
                required: 1,
                found: 0,
            });
        }
        let mut model = Self {
            coefficients: [[0.0; FEATURE_COUNT]; CLASS_COUNT],
            intercepts: [0.0; CLASS_COUNT],
            iterations: 0,
            converged: false,
        };
        while model.iterations < settings.max_iterations {
            let gradient = model.gradient(inputs, labels, weights, settings.c);
            if largest_component(&gradient) < settings.tolerance {
                model.converged = true;
                break;
            }
            model.step(&gradient, settings.learning_rate);
            model.iterations = model.iterations.saturating_add(1);
        }
        if model.converged {
            log::debug!(
                "logistic regression converged after {} iterations",
                model.iterations
            );
        } else {
            log::warn!(
                "logistic regression stopped after {} iterations without converging",
                model.iterations
            );
        }
        Ok(model)
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, input: &[f64; FEATURE_COUNT]) -> ClassProbabilities {
        ClassProbabilities::from_array(softmax(self.scores(input)))
    }
}

fn largest_component(gradient: &([[f64; FEATURE_COUNT]; CLASS_COUNT], [f64; CLASS_COUNT])) -> f64 {
    let (coefficients, intercepts) = gradient;
    coefficients
        .iter()
        .flatten()
        .chain(intercepts)
        .fold(0.0, |largest: f64, value| largest.max(value.abs()))
}

#[expect(clippy::float_arithmetic, reason = "numerically stable softmax")]
fn softmax(scores: [f64; CLASS_COUNT]) -> [f64; CLASS_COUNT] {
    let peak = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exponentials = scores.map(|score| (score - peak).exp());
    let total: f64 = exponentials.iter().sum();
    exponentials.map(|value| value / total)
}
