//! Labelled examples, standardisation, and the train/test split.

use localpro_core::{Provider, ReliabilityLabel};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, ForestConfig, LinearConfig};
use crate::{StandardScaler, TrainingError};

const MIN_EXAMPLES: usize = 2;

/// One provider's features with its known label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Raw features.
    pub features: FeatureVector,
    /// Known reliability class.
    pub label: ReliabilityLabel,
}

impl TrainingExample {
    /// Pair a provider's features with `label`.
    #[must_use]
    pub fn from_provider(provider: &Provider, label: ReliabilityLabel) -> Self {
        Self {
            features: FeatureVector::from_provider(provider),
            label,
        }
    }
}

/// Settings for a full training run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of examples held out for evaluation.
    pub test_fraction: f64,
    /// Seed for the split shuffle.
    pub seed: u64,
    /// Random forest hyperparameters.
    pub forest: ForestConfig,
    /// Logistic regression hyperparameters.
    pub linear: LinearConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
            linear: LinearConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Validate every setting and return a copy.
    ///
    /// # Errors
    /// Returns [`TrainingError::InvalidConfig`] naming the first invalid
    /// setting.
    pub fn validate(self) -> Result<Self, TrainingError> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrainingError::InvalidConfig {
                name: "test_fraction",
                reason: "must lie strictly between 0 and 1",
            });
        }
        self.forest.validate()?;
        self.linear.validate()?;
        Ok(self)
    }
}

/// Standardised inputs with their labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    /// Standardised feature rows.
    pub inputs: Vec<[f64; FEATURE_COUNT]>,
    /// Label of each row.
    pub labels: Vec<ReliabilityLabel>,
}

impl Split {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Report whether the split holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    fn push(&mut self, input: [f64; FEATURE_COUNT], label: ReliabilityLabel) {
        self.inputs.push(input);
        self.labels.push(label);
    }
}

/// Output of [`prepare`]: a fitted scaler and the two splits.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    /// Scaler fitted on the whole batch.
    pub scaler: StandardScaler,
    /// Rows used for fitting.
    pub train: Split,
    /// Held-out rows used for evaluation.
    pub test: Split,
    /// Whether the split preserved class proportions.
    pub stratified: bool,
}

/// Standardise `examples` and split them into train and test sets.
///
/// The test set holds `ceil(test_fraction × n)` rows. The split preserves
/// class proportions when every present class has at least two examples;
/// otherwise it falls back to a plain shuffle and logs a warning.
///
/// # Errors
/// Returns [`TrainingError::InsufficientExamples`] for fewer than two
/// examples, [`TrainingError::NonFiniteFeature`] for NaN or infinite inputs,
/// and [`TrainingError::InvalidConfig`] for an invalid configuration.
pub fn prepare(
    examples: &[TrainingExample],
    config: &TrainingConfig,
) -> Result<PreparedData, TrainingError> {
    let settings = config.validate()?;
    if examples.len() < MIN_EXAMPLES {
        return Err(TrainingError::InsufficientExamples {
            required: MIN_EXAMPLES,
            found: examples.len(),
        });
    }
    check_finite(examples)?;

    let rows: Vec<FeatureVector> = examples.iter().map(|example| example.features).collect();
    let scaler = StandardScaler::fit(&rows);
    let labels: Vec<ReliabilityLabel> = examples.iter().map(|example| example.label).collect();
    let test_size = test_size(examples.len(), settings.test_fraction);
    let counts = class_counts(&labels);
    let stratified = counts.iter().all(|&count| count == 0 || count >= MIN_EXAMPLES);

    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let held_out = if stratified {
        stratified_test_rows(&labels, &counts, test_size, &mut rng)
    } else {
        log::warn!(
            "degenerate training set: a class has fewer than {MIN_EXAMPLES} examples; \
             splitting without stratification"
        );
        shuffled_test_rows(labels.len(), test_size, &mut rng)
    };

    let mut train = Split::default();
    let mut test = Split::default();
    for ((row, example), is_test) in rows.iter().zip(examples).zip(held_out) {
        let scaled = scaler.transform(row);
        if is_test {
            test.push(scaled, example.label);
        } else {
            train.push(scaled, example.label);
        }
    }
    log::info!(
        "prepared {} training and {} test examples (stratified: {stratified})",
        train.len(),
        test.len()
    );
    Ok(PreparedData {
        scaler,
        train,
        test,
        stratified,
    })
}

/// Balanced class weights: `n / (classes_present × n_c)`.
///
/// Absent classes get a weight of zero.
#[must_use]
#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "class weights are ratios of counts"
)]
pub fn class_weights(labels: &[ReliabilityLabel]) -> [f64; ReliabilityLabel::COUNT] {
    let counts = class_counts(labels);
    let present = counts.iter().filter(|&&count| count > 0).count();
    let total = labels.len() as f64;
    counts.map(|count| {
        if count == 0 {
            0.0
        } else {
            total / (present as f64 * count as f64)
        }
    })
}

/// Per-row weights from [`class_weights`].
pub(crate) fn sample_weights(labels: &[ReliabilityLabel]) -> Vec<f64> {
    let weights = class_weights(labels);
    labels
        .iter()
        .map(|label| weights.get(label.index()).copied().unwrap_or(0.0))
        .collect()
}

pub(crate) fn class_counts(labels: &[ReliabilityLabel]) -> [usize; ReliabilityLabel::COUNT] {
    let mut counts = [0; ReliabilityLabel::COUNT];
    for label in labels {
        if let Some(count) = counts.get_mut(label.index()) {
            *count += 1;
        }
    }
    counts
}

fn check_finite(examples: &[TrainingExample]) -> Result<(), TrainingError> {
    for (row, example) in examples.iter().enumerate() {
        if let Some((feature, _)) = example
            .features
            .values()
            .iter()
            .zip(FEATURE_NAMES)
            .find(|(value, _)| !value.is_finite())
            .map(|(value, name)| (name, value))
        {
            return Err(TrainingError::NonFiniteFeature { row, feature });
        }
    }
    Ok(())
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "the test size is a rounded-up fraction of the row count"
)]
fn test_size(rows: usize, fraction: f64) -> usize {
    let size = (rows as f64 * fraction).ceil() as usize;
    size.clamp(1, rows.saturating_sub(1).max(1))
}

/// Mark `test_size` rows as held out after a seeded shuffle.
fn shuffled_test_rows(rows: usize, test_size: usize, rng: &mut ChaCha8Rng) -> Vec<bool> {
    let mut order: Vec<usize> = (0..rows).collect();
    order.shuffle(rng);
    let mut held_out = vec![false; rows];
    for &row in order.iter().take(test_size) {
        if let Some(flag) = held_out.get_mut(row) {
            *flag = true;
        }
    }
    held_out
}

/// Mark held-out rows class by class, keeping class proportions.
///
/// Each class receives `test_size × n_c / n` rows rounded by largest
/// remainder, and always keeps at least one training row.
fn stratified_test_rows(
    labels: &[ReliabilityLabel],
    counts: &[usize; ReliabilityLabel::COUNT],
    test_size: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<bool> {
    let quotas = class_quotas(counts, labels.len(), test_size);
    let mut held_out = vec![false; labels.len()];
    for label in ReliabilityLabel::ALL {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, candidate)| **candidate == label)
            .map(|(row, _)| row)
            .collect();
        members.shuffle(rng);
        let quota = quotas.get(label.index()).copied().unwrap_or(0);
        for &row in members.iter().take(quota) {
            if let Some(flag) = held_out.get_mut(row) {
                *flag = true;
            }
        }
    }
    held_out
}

fn class_quotas(
    counts: &[usize; ReliabilityLabel::COUNT],
    rows: usize,
    test_size: usize,
) -> [usize; ReliabilityLabel::COUNT] {
    let mut quotas = [0; ReliabilityLabel::COUNT];
    let mut remainders = Vec::with_capacity(ReliabilityLabel::COUNT);
    for (class, &count) in counts.iter().enumerate() {
        let share = test_size.saturating_mul(count);
        let whole = share.checked_div(rows).unwrap_or(0);
        let remainder = share.checked_rem(rows).unwrap_or(0);
        if let Some(quota) = quotas.get_mut(class) {
            *quota = whole;
        }
        remainders.push((class, remainder));
    }
    let assigned: usize = quotas.iter().sum();
    remainders.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
    for &(class, _) in remainders.iter().take(test_size.saturating_sub(assigned)) {
        if let Some(quota) = quotas.get_mut(class) {
            *quota += 1;
        }
    }
    for (quota, &count) in quotas.iter_mut().zip(counts) {
        *quota = (*quota).min(count.saturating_sub(1));
    }
    quotas
}
