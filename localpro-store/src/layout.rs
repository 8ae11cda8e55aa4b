//! Names and metadata describing one generation directory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Manifest schema version written by this release.
pub const STORE_SCHEMA_VERSION: u32 = 1;

/// Manifest file name inside each generation directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const GENERATION_PREFIX: &str = "generation-";

/// Sequential identifier of a published training run.
///
/// # Examples
/// ```
/// use localpro_store::Generation;
///
/// let generation: Generation = "generation-000042".parse().unwrap();
/// assert_eq!(generation.number(), 42);
/// assert_eq!(generation.to_string(), "generation-000042");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    /// The first generation a store publishes.
    pub const FIRST: Self = Self(1);

    /// Wrap a generation number.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Generation number.
    #[must_use]
    pub const fn number(self) -> u64 {
        self.0
    }

    /// The generation after this one, if representable.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(number) => Some(Self(number)),
            None => None,
        }
    }

    /// Directory name, e.g. `generation-000001`.
    #[must_use]
    pub fn dir_name(self) -> String {
        self.to_string()
    }

    /// Name of the staging directory used while publishing.
    #[must_use]
    pub fn staging_dir_name(self) -> String {
        format!("{self}.partial")
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GENERATION_PREFIX}{:06}", self.0)
    }
}

impl FromStr for Generation {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .strip_prefix(GENERATION_PREFIX)
            .unwrap_or(value)
            .parse()
            .map(Self)
    }
}

/// Binary blob stored in a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blob {
    /// Random forest.
    TreeModel,
    /// Logistic regression.
    LinearModel,
    /// Standard scaler shared by both classifiers.
    FeatureScaler,
    /// User-provider interaction matrix.
    InteractionMatrix,
    /// Provider feature matrix.
    FeatureMatrix,
    /// Provider similarity matrix.
    SimilarityMatrix,
}

impl Blob {
    /// Every blob in write order.
    pub const ALL: [Self; 6] = [
        Self::TreeModel,
        Self::LinearModel,
        Self::FeatureScaler,
        Self::InteractionMatrix,
        Self::FeatureMatrix,
        Self::SimilarityMatrix,
    ];

    /// Blobs needed to rebuild a reliability classifier.
    pub const CLASSIFIER: [Self; 3] = [Self::TreeModel, Self::LinearModel, Self::FeatureScaler];

    /// Blobs needed to rebuild a recommender snapshot.
    pub const RECOMMENDER: [Self; 3] = [
        Self::InteractionMatrix,
        Self::FeatureMatrix,
        Self::SimilarityMatrix,
    ];

    /// File name inside the generation directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::TreeModel => "tree_model.bin",
            Self::LinearModel => "linear_model.bin",
            Self::FeatureScaler => "feature_scaler.bin",
            Self::InteractionMatrix => "interaction_matrix.bin",
            Self::FeatureMatrix => "feature_matrix.bin",
            Self::SimilarityMatrix => "similarity_matrix.bin",
        }
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Contents of `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Layout version; loads reject anything but [`STORE_SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Generation the manifest describes.
    pub generation: Generation,
    /// Classifier artifact format version.
    pub artifact_schema_version: u32,
    /// Blob file names present in the generation.
    pub blobs: Vec<String>,
    /// Providers covered by the recommender matrices.
    pub providers: usize,
    /// Users covered by the interaction matrix.
    pub users: usize,
}

impl Manifest {
    /// Report whether the manifest lists `blob`.
    #[must_use]
    pub fn lists(&self, blob: Blob) -> bool {
        self.blobs.iter().any(|name| name == blob.file_name())
    }
}
