//! Class-weighted CART trees and a bootstrap random forest.
//!
//! Trees split on Gini impurity. At each node the features are visited in a
//! random order and the search stops once `max_features` features have been
//! examined and a useful split has been found; if none of those features
//! separates the node, the search continues through the remaining ones.
//! Leaves store the weighted class distribution of their samples.

use localpro_core::ReliabilityLabel;
use rand::{Rng, RngCore, SeedableRng};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::model::check_lengths;
use crate::{ClassProbabilities, FEATURE_COUNT, Fit, ProbabilisticClassifier, TrainingError};

const CLASS_COUNT: usize = ReliabilityLabel::COUNT;
const MIN_IMPROVEMENT: f64 = 1e-12;

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees.
    pub trees: usize,
    /// Maximum depth of any tree; the root is depth zero.
    pub max_depth: usize,
    /// Nodes with fewer distinct samples become leaves.
    pub min_samples_split: usize,
    /// Features examined per split; `None` uses `floor(sqrt(features))`.
    pub max_features: Option<usize>,
    /// Fit each tree on a bootstrap resample.
    pub bootstrap: bool,
    /// Seed for resampling and feature order.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 10,
            min_samples_split: 5,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    /// Validate the settings and return a copy.
    ///
    /// # Errors
    /// Returns [`TrainingError::InvalidConfig`] when a setting is out of
    /// range.
    pub const fn validate(self) -> Result<Self, TrainingError> {
        if self.trees == 0 {
            return Err(invalid("trees", "must be at least 1"));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "must be at least 1"));
        }
        if self.min_samples_split < 2 {
            return Err(invalid("min_samples_split", "must be at least 2"));
        }
        if let Some(features) = self.max_features
            && (features == 0 || features > FEATURE_COUNT)
        {
            return Err(invalid("max_features", "must lie between 1 and the feature count"));
        }
        Ok(self)
    }

    fn features_per_split(&self) -> usize {
        self.max_features
            .unwrap_or_else(|| FEATURE_COUNT.isqrt())
            .clamp(1, FEATURE_COUNT)
    }
}

const fn invalid(name: &'static str, reason: &'static str) -> TrainingError {
    TrainingError::InvalidConfig { name, reason }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: [f64; CLASS_COUNT],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single classification tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl DecisionTree {
    fn grow(
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        config: &ForestConfig,
        rng: ChaCha8Rng,
    ) -> Self {
        let samples: Vec<usize> = weights
            .iter()
            .enumerate()
            .filter(|(_, weight)| **weight > 0.0)
            .map(|(row, _)| row)
            .collect();
        let mut grower = Grower {
            inputs,
            labels,
            weights,
            config,
            features_per_split: config.features_per_split(),
            rng,
            nodes: Vec::new(),
            importances: [0.0; FEATURE_COUNT],
        };
        grower.grow(samples, 0);
        Self {
            nodes: grower.nodes,
            importances: normalised(grower.importances),
        }
    }

    /// Number of nodes, leaves included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Length of the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth_from(0)
    }

    fn depth_from(&self, node: usize) -> usize {
        match self.nodes.get(node) {
            Some(Node::Split { left, right, .. }) => {
                1_usize.saturating_add(self.depth_from(*left).max(self.depth_from(*right)))
            }
            Some(Node::Leaf { .. }) | None => 0,
        }
    }

    /// Normalised impurity decrease contributed by each feature.
    #[must_use]
    pub const fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.importances
    }

    fn distribution(&self, input: &[f64; FEATURE_COUNT]) -> [f64; CLASS_COUNT] {
        let mut position = 0;
        loop {
            match self.nodes.get(position) {
                Some(Node::Leaf { distribution }) => return *distribution,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = input.get(*feature).copied().unwrap_or(0.0);
                    position = if value <= *threshold { *left } else { *right };
                }
                None => return uniform(),
            }
        }
    }
}

impl Fit for DecisionTree {
    type Config = ForestConfig;

    fn fit(
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        config: &Self::Config,
    ) -> Result<Self, TrainingError> {
        check_lengths(inputs, labels, weights)?;
        let settings = config.validate()?;
        require_rows(inputs.len())?;
        let rng = ChaCha8Rng::seed_from_u64(settings.seed);
        Ok(Self::grow(inputs, labels, weights, &settings, rng))
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn predict_proba(&self, input: &[f64; FEATURE_COUNT]) -> ClassProbabilities {
        ClassProbabilities::from_array(self.distribution(input))
    }
}

/// Bootstrap ensemble of [`DecisionTree`]s whose probabilities are averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    importances: [f64; FEATURE_COUNT],
}

impl RandomForest {
    /// Fitted trees.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean of the per-tree importances, normalised to sum to one.
    #[must_use]
    pub const fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.importances
    }
}

impl Fit for RandomForest {
    type Config = ForestConfig;

    #[expect(
        clippy::float_arithmetic,
        reason = "bootstrap draws scale sample weights"
    )]
    fn fit(
        inputs: &[[f64; FEATURE_COUNT]],
        labels: &[ReliabilityLabel],
        weights: &[f64],
        config: &Self::Config,
    ) -> Result<Self, TrainingError> {
        check_lengths(inputs, labels, weights)?;
        let settings = config.validate()?;
        require_rows(inputs.len())?;

        let mut seeds = ChaCha8Rng::seed_from_u64(settings.seed);
        let mut trees = Vec::with_capacity(settings.trees);
        let mut importances = [0.0; FEATURE_COUNT];
        for _ in 0..settings.trees {
            let mut rng = ChaCha8Rng::seed_from_u64(seeds.next_u64());
            let tree_weights = if settings.bootstrap {
                let mut draws = vec![0_u32; inputs.len()];
                for _ in 0..inputs.len() {
                    if let Some(draw) = draws.get_mut(rng.gen_range(0..inputs.len())) {
                        *draw = draw.saturating_add(1);
                    }
                }
                weights
                    .iter()
                    .zip(draws)
                    .map(|(weight, draw)| weight * f64::from(draw))
                    .collect()
            } else {
                weights.to_vec()
            };
            let tree = DecisionTree::grow(inputs, labels, &tree_weights, &settings, rng);
            for (total, value) in importances.iter_mut().zip(tree.feature_importances()) {
                *total += value;
            }
            trees.push(tree);
        }
        log::debug!("fitted random forest with {} trees", trees.len());
        Ok(Self {
            trees,
            importances: normalised(importances),
        })
    }
}

impl ProbabilisticClassifier for RandomForest {
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "tree probabilities are averaged"
    )]
    fn predict_proba(&self, input: &[f64; FEATURE_COUNT]) -> ClassProbabilities {
        if self.trees.is_empty() {
            return ClassProbabilities::from_array(uniform());
        }
        let mut totals = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            for (total, value) in totals.iter_mut().zip(tree.distribution(input)) {
                *total += value;
            }
        }
        let count = self.trees.len() as f64;
        ClassProbabilities::from_array(totals.map(|total| total / count))
    }
}

const fn require_rows(rows: usize) -> Result<(), TrainingError> {
    if rows == 0 {
        Err(TrainingError::InsufficientExamples {
            required: 1,
            found: 0,
        })
    } else {
        Ok(())
    }
}

/// Best split found for one node.
struct Candidate {
    feature: usize,
    threshold: f64,
    improvement: f64,
    weighted_child_impurity: f64,
}

/// Recursive tree construction state.
struct Grower<'a> {
    inputs: &'a [[f64; FEATURE_COUNT]],
    labels: &'a [ReliabilityLabel],
    weights: &'a [f64],
    config: &'a ForestConfig,
    features_per_split: usize,
    rng: ChaCha8Rng,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl Grower<'_> {
    #[expect(
        clippy::float_arithmetic,
        reason = "importance accumulates weighted impurity decrease"
    )]
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let totals = self.class_totals(&samples);
        let node_weight: f64 = totals.iter().sum();
        let impurity = gini(&totals);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: distribution(totals),
        });

        let splittable = depth < self.config.max_depth
            && samples.len() >= self.config.min_samples_split
            && impurity > MIN_IMPROVEMENT;
        if !splittable {
            return id;
        }
        let Some(candidate) = self.best_split(&samples, impurity) else {
            return id;
        };
        if let Some(total) = self.importances.get_mut(candidate.feature) {
            *total += node_weight * (impurity - candidate.weighted_child_impurity);
        }

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) =
            samples.into_iter().partition(|&row| {
                self.value(row, candidate.feature) <= candidate.threshold
            });
        let next = depth.saturating_add(1);
        let left = self.grow(left_samples, next);
        let right = self.grow(right_samples, next);
        if let Some(node) = self.nodes.get_mut(id) {
            *node = Node::Split {
                feature: candidate.feature,
                threshold: candidate.threshold,
                left,
                right,
            };
        }
        id
    }

    fn best_split(&mut self, samples: &[usize], impurity: f64) -> Option<Candidate> {
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(&mut self.rng);
        let mut best: Option<Candidate> = None;
        for (visited, feature) in features.into_iter().enumerate() {
            if visited >= self.features_per_split && best.is_some() {
                break;
            }
            let Some(candidate) = self.best_threshold(samples, feature, impurity) else {
                continue;
            };
            if best
                .as_ref()
                .is_none_or(|current| candidate.improvement > current.improvement)
            {
                best = Some(candidate);
            }
        }
        best
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "sweeping thresholds updates weighted class totals"
    )]
    fn best_threshold(&self, samples: &[usize], feature: usize, impurity: f64) -> Option<Candidate> {
        let mut ordered: Vec<(f64, usize, f64)> = samples
            .iter()
            .map(|&row| (self.value(row, feature), self.class_of(row), self.weight(row)))
            .collect();
        ordered.sort_by(|left, right| left.0.total_cmp(&right.0));

        let mut right_totals = [0.0; CLASS_COUNT];
        for &(_, class, weight) in &ordered {
            add_to(&mut right_totals, class, weight);
        }
        let node_weight: f64 = right_totals.iter().sum();
        let mut left_totals = [0.0; CLASS_COUNT];
        let mut best: Option<Candidate> = None;
        for pair in ordered.windows(2) {
            let [(value, class, weight), (next_value, _, _)] = pair else {
                continue;
            };
            add_to(&mut left_totals, *class, *weight);
            add_to(&mut right_totals, *class, -*weight);
            if value >= next_value {
                continue;
            }
            let left_weight: f64 = left_totals.iter().sum();
            let right_weight: f64 = right_totals.iter().sum();
            if left_weight <= 0.0 || right_weight <= 0.0 {
                continue;
            }
            let children = (left_weight * gini(&left_totals) + right_weight * gini(&right_totals))
                / node_weight;
            let improvement = impurity - children;
            if improvement > MIN_IMPROVEMENT
                && best.as_ref().is_none_or(|current| improvement > current.improvement)
            {
                best = Some(Candidate {
                    feature,
                    threshold: midpoint(*value, *next_value),
                    improvement,
                    weighted_child_impurity: children,
                });
            }
        }
        best
    }

    fn class_totals(&self, samples: &[usize]) -> [f64; CLASS_COUNT] {
        let mut totals = [0.0; CLASS_COUNT];
        for &row in samples {
            add_to(&mut totals, self.class_of(row), self.weight(row));
        }
        totals
    }

    fn value(&self, row: usize, feature: usize) -> f64 {
        self.inputs
            .get(row)
            .and_then(|input| input.get(feature))
            .copied()
            .unwrap_or(0.0)
    }

    fn class_of(&self, row: usize) -> usize {
        self.labels.get(row).map_or(0, |label| label.index())
    }

    fn weight(&self, row: usize) -> f64 {
        self.weights.get(row).copied().unwrap_or(0.0)
    }
}

#[expect(clippy::float_arithmetic, reason = "weighted class totals")]
fn add_to(totals: &mut [f64; CLASS_COUNT], class: usize, weight: f64) {
    if let Some(total) = totals.get_mut(class) {
        *total += weight;
    }
}

#[expect(clippy::float_arithmetic, reason = "Gini impurity")]
fn gini(totals: &[f64; CLASS_COUNT]) -> f64 {
    let total: f64 = totals.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - totals
        .iter()
        .map(|count| (count / total).powi(2))
        .sum::<f64>()
}

#[expect(clippy::float_arithmetic, reason = "threshold between neighbours")]
fn midpoint(low: f64, high: f64) -> f64 {
    let middle = low + (high - low) / 2.0;
    if middle >= high { low } else { middle }
}

fn distribution(totals: [f64; CLASS_COUNT]) -> [f64; CLASS_COUNT] {
    let total: f64 = totals.iter().sum();
    if total > 0.0 {
        divide(totals, total)
    } else {
        uniform()
    }
}

fn normalised<const N: usize>(values: [f64; N]) -> [f64; N] {
    let total: f64 = values.iter().sum();
    if total > 0.0 { divide(values, total) } else { values }
}

#[expect(clippy::float_arithmetic, reason = "normalisation")]
fn divide<const N: usize>(values: [f64; N], total: f64) -> [f64; N] {
    values.map(|value| value / total)
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "uniform prior over the classes"
)]
fn uniform() -> [f64; CLASS_COUNT] {
    [1.0 / CLASS_COUNT as f64; CLASS_COUNT]
}
