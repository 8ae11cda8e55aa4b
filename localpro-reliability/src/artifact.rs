//! Training entry point and the persisted model bundle.

use serde::{Deserialize, Serialize};

use crate::dataset::sample_weights;
use crate::{
    Evaluation, FeatureImportance, Fit, LogisticRegression, RandomForest, StandardScaler,
    TrainingConfig, TrainingError, TrainingExample, TrainingReport, prepare,
};

/// Version stamped into every [`ClassifierArtifact`].
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Everything needed to serve reliability predictions.
///
/// The scaler, forest, and logistic regression always come from the same
/// training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    /// Format version; see [`ARTIFACT_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Standardisation applied to raw features.
    pub scaler: StandardScaler,
    /// Tree ensemble.
    pub forest: RandomForest,
    /// Linear model.
    pub linear: LogisticRegression,
}

/// Result of [`train`]: the artifact plus its evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModels {
    /// Models ready to install.
    pub artifact: ClassifierArtifact,
    /// Held-out evaluation of both models.
    pub report: TrainingReport,
}

/// Fit both models on `examples` and evaluate them on a held-out split.
///
/// # Errors
/// Propagates [`TrainingError`] from data preparation and model fitting.
///
/// # Examples
/// ```
/// use localpro_core::test_support::synthetic_providers;
/// use localpro_reliability::{ForestConfig, TrainingConfig, TrainingExample, train};
///
/// let examples: Vec<TrainingExample> = synthetic_providers(7, 60)
///     .iter()
///     .map(|(provider, label)| TrainingExample::from_provider(provider, *label))
///     .collect();
/// let config = TrainingConfig {
///     forest: ForestConfig { trees: 10, ..ForestConfig::default() },
///     ..TrainingConfig::default()
/// };
/// let trained = train(&examples, &config).expect("train");
/// assert_eq!(trained.report.test_size, 12);
/// ```
pub fn train(
    examples: &[TrainingExample],
    config: &TrainingConfig,
) -> Result<TrainedModels, TrainingError> {
    let prepared = prepare(examples, config)?;
    let weights = sample_weights(&prepared.train.labels);

    let forest = RandomForest::fit(
        &prepared.train.inputs,
        &prepared.train.labels,
        &weights,
        &config.forest,
    )?;
    let linear = LogisticRegression::fit(
        &prepared.train.inputs,
        &prepared.train.labels,
        &weights,
        &config.linear,
    )?;

    let report = TrainingReport {
        tree: Evaluation::of(&forest, &prepared.test),
        linear: Evaluation::of(&linear, &prepared.test),
        feature_importances: FeatureImportance::ranked(forest.feature_importances()),
        train_size: prepared.train.len(),
        test_size: prepared.test.len(),
        stratified: prepared.stratified,
    };
    log::info!(
        "trained reliability models: forest accuracy {:.3}, linear accuracy {:.3}",
        report.tree.accuracy,
        report.linear.accuracy
    );
    Ok(TrainedModels {
        artifact: ClassifierArtifact {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            scaler: prepared.scaler,
            forest,
            linear,
        },
        report,
    })
}
