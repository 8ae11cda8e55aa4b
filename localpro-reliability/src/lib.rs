//! Provider reliability classification.
//!
//! Training turns a labelled batch of providers into a
//! [`ClassifierArtifact`]: a standard scaler fitted on the batch plus a
//! balanced random forest and a balanced multinomial logistic regression,
//! both fitted on the same standardised inputs. Serving installs the
//! artifact into a [`ReliabilityClassifier`] and maps one feature map to a
//! [`ReliabilityPrediction`].
//!
//! Features always follow [`FEATURE_NAMES`]; labels follow
//! [`localpro_core::ReliabilityLabel`] class indices.

#![forbid(unsafe_code)]

mod artifact;
mod classifier;
mod dataset;
mod error;
mod evaluation;
mod features;
mod forest;
mod linear;
mod model;
mod scaler;

pub use artifact::{ARTIFACT_SCHEMA_VERSION, ClassifierArtifact, TrainedModels, train};
pub use classifier::{ModelChoice, ReliabilityClassifier, ReliabilityPrediction};
pub use dataset::{PreparedData, Split, TrainingConfig, TrainingExample, class_weights, prepare};
pub use error::{ClassifierError, TrainingError, UnknownModelError};
pub use evaluation::{Evaluation, FeatureImportance, TrainingReport};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector};
pub use forest::{DecisionTree, ForestConfig, RandomForest};
pub use linear::{LinearConfig, LogisticRegression};
pub use model::{ClassProbabilities, Fit, ProbabilisticClassifier};
pub use scaler::StandardScaler;
