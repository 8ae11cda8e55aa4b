//! Serving-side classifier holding the installed artifact.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use localpro_core::ReliabilityLabel;
use serde::{Deserialize, Serialize};

use crate::{
    ClassProbabilities, ClassifierArtifact, ClassifierError, FeatureVector,
    ProbabilisticClassifier, UnknownModelError,
};

/// Which fitted model answers a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModelChoice {
    /// The random forest.
    #[default]
    #[serde(rename = "rf", alias = "tree")]
    Tree,
    /// The logistic regression.
    #[serde(rename = "lr", alias = "linear")]
    Linear,
}

impl ModelChoice {
    /// Short name used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "rf",
            Self::Linear => "lr",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelChoice {
    type Err = UnknownModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rf" | "tree" | "forest" => Ok(Self::Tree),
            "lr" | "linear" | "logistic" => Ok(Self::Linear),
            _ => Err(UnknownModelError(value.to_owned())),
        }
    }
}

/// One reliability prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityPrediction {
    /// Most probable class.
    #[serde(rename = "reliability")]
    pub label: ReliabilityLabel,
    /// Probability of [`Self::label`].
    pub confidence: f64,
    /// Probability of every class.
    pub probabilities: ClassProbabilities,
    /// Model that produced the prediction.
    pub model: ModelChoice,
}

/// Reliability classifier serving the most recently installed artifact.
///
/// Starts untrained; [`install`](Self::install) swaps in a whole artifact so
/// a prediction never mixes a scaler and models from different runs.
#[derive(Debug, Default)]
pub struct ReliabilityClassifier {
    artifact: RwLock<Option<Arc<ClassifierArtifact>>>,
}

impl ReliabilityClassifier {
    /// Create a classifier with no artifact installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a classifier serving `artifact`.
    #[must_use]
    pub fn with_artifact(artifact: ClassifierArtifact) -> Self {
        Self {
            artifact: RwLock::new(Some(Arc::new(artifact))),
        }
    }

    /// Replace the installed artifact, returning the previous one.
    pub fn install(&self, artifact: ClassifierArtifact) -> Option<Arc<ClassifierArtifact>> {
        let mut guard = self
            .artifact
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        log::debug!(
            "installing reliability artifact with {} trees",
            artifact.forest.trees().len()
        );
        guard.replace(Arc::new(artifact))
    }

    /// The currently installed artifact, if any.
    #[must_use]
    pub fn artifact(&self) -> Option<Arc<ClassifierArtifact>> {
        self.artifact
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Report whether an artifact is installed.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.artifact().is_some()
    }

    /// Classify one provider described by named raw features.
    ///
    /// Missing features count as zero and unknown names are ignored.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelNotLoaded`] when nothing is installed.
    pub fn predict(
        &self,
        features: &BTreeMap<String, f64>,
        model: ModelChoice,
    ) -> Result<ReliabilityPrediction, ClassifierError> {
        self.predict_features(&FeatureVector::from_map(features), model)
    }

    /// Classify one provider from a feature vector.
    ///
    /// # Errors
    /// Returns [`ClassifierError::ModelNotLoaded`] when nothing is installed.
    pub fn predict_features(
        &self,
        features: &FeatureVector,
        model: ModelChoice,
    ) -> Result<ReliabilityPrediction, ClassifierError> {
        let artifact = self.artifact().ok_or(ClassifierError::ModelNotLoaded)?;
        let input = artifact.scaler.transform(features);
        let probabilities = match model {
            ModelChoice::Tree => artifact.forest.predict_proba(&input),
            ModelChoice::Linear => artifact.linear.predict_proba(&input),
        };
        let (label, confidence) = probabilities.most_likely();
        Ok(ReliabilityPrediction {
            label,
            confidence,
            probabilities,
            model,
        })
    }
}
