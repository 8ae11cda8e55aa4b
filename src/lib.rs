//! Facade crate for the LocalPro recommendation engine.
//!
//! This crate re-exports the core marketplace types and exposes the hybrid
//! recommender, the reliability classifier, and the generational model store
//! behind feature flags.

#![forbid(unsafe_code)]

pub use localpro_core::{
    EARTH_RADIUS_KM, Interaction, InteractionKind, InteractionLog, Provider, ReliabilityLabel,
    UnknownLabelError, coord_from_lat_lon, haversine_km,
};

#[cfg(feature = "recommender")]
pub use localpro_recommender::{
    FALLBACK_NOTE, FusionConfig, HybridRecommender, InteractionWeights, Recommendation,
    RecommendationRequest, RecommenderSnapshot,
};

#[cfg(feature = "reliability")]
pub use localpro_reliability::{
    ClassifierArtifact, ModelChoice, ReliabilityClassifier, ReliabilityPrediction, TrainedModels,
    TrainingConfig, TrainingExample, train,
};

#[cfg(feature = "store")]
pub use localpro_store::{Generation, LoadedModels, ModelStore, ModelStoreError};
