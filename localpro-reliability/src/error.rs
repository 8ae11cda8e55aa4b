//! Error types raised while training or serving reliability models.

use thiserror::Error;

/// Errors raised while preparing data or fitting models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    /// Too few labelled examples to hold out a test split.
    #[error("training needs at least {required} labelled examples, found {found}")]
    InsufficientExamples {
        /// Minimum number of examples.
        required: usize,
        /// Number supplied.
        found: usize,
    },
    /// A configuration value was out of range.
    #[error("invalid training setting '{name}': {reason}")]
    InvalidConfig {
        /// Name of the offending setting.
        name: &'static str,
        /// What the setting must satisfy.
        reason: &'static str,
    },
    /// A feature value was NaN or infinite.
    #[error("example {row} has a non-finite '{feature}' value")]
    NonFiniteFeature {
        /// Index of the offending example.
        row: usize,
        /// Name of the offending feature.
        feature: &'static str,
    },
    /// Inputs, labels, and weights disagree in length.
    #[error("{inputs} inputs, {labels} labels, and {weights} weights must match in length")]
    LengthMismatch {
        /// Number of input rows.
        inputs: usize,
        /// Number of labels.
        labels: usize,
        /// Number of sample weights.
        weights: usize,
    },
}

/// Errors raised when serving predictions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifierError {
    /// No trained artifact has been installed.
    #[error("no reliability model is loaded; train or load a model first")]
    ModelNotLoaded,
}

/// Error returned when a string does not name a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown model '{0}'; expected 'rf', 'tree', 'lr', or 'linear'")]
pub struct UnknownModelError(pub String);
