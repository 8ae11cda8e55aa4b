//! Error types raised while configuring, assembling, or fusing
//! recommendations.

use thiserror::Error;

/// Errors raised when validating recommender configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A weight was negative, NaN, or infinite.
    #[error("weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight {
        /// Name of the offending field.
        name: &'static str,
        /// Value supplied by the caller.
        value: f64,
    },
    /// The proximity radius must be a positive, finite distance.
    #[error("proximity radius must be finite and positive, got {radius_km} km")]
    InvalidRadius {
        /// Radius supplied by the caller.
        radius_km: f64,
    },
}

/// Errors raised when assembling a snapshot from persisted parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The feature matrix and similarity matrix disagree on provider count.
    #[error("similarity matrix covers {similarity} providers but the feature matrix has {features}")]
    ShapeMismatch {
        /// Rows in the feature matrix.
        features: usize,
        /// Rows in the similarity matrix.
        similarity: usize,
    },
    /// A feature row has the wrong number of columns.
    #[error("feature row {row} has {actual} columns, expected {expected}")]
    RowWidth {
        /// Offending row index.
        row: usize,
        /// Expected column count.
        expected: usize,
        /// Column count found.
        actual: usize,
    },
    /// The provider index disagrees with the stored provider ids.
    #[error("provider index is inconsistent with the stored provider ids")]
    IndexMismatch,
}

/// Reasons the fused ranking could not be produced.
///
/// A failure never reaches callers as an error: the recommender answers with
/// a rating-sorted fallback and attaches the reason.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionFailure {
    /// No snapshot has been installed yet.
    #[error("no recommender snapshot is installed")]
    SnapshotUnavailable,
    /// A candidate accumulated a NaN or infinite score.
    #[error("provider {provider_id} accumulated a non-finite score")]
    NonFiniteScore {
        /// Provider whose score could not be ranked.
        provider_id: u64,
    },
}
