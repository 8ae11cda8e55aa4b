//! Hybrid provider recommendations for the LocalPro marketplace.
//!
//! The crate splits into an offline build and a request-time fusion step:
//! - **Snapshot builds** turn provider records and interaction history into a
//!   [`RecommenderSnapshot`]: a sparse user×provider
//!   [`InteractionMatrix`], a normalized [`ProviderFeatureMatrix`], and the
//!   provider×provider cosine [`SimilarityMatrix`]. The three are always
//!   built together and never patched in place.
//! - **Request-time fusion** in [`HybridRecommender`] blends collaborative
//!   filtering, content-based similarity, rating, and proximity into one
//!   ranking. When no snapshot is available the recommender answers with a
//!   rating-sorted list tagged as [`Recommendation::Fallback`].
//!
//! # Examples
//!
//! ```
//! use localpro_core::{Interaction, InteractionKind, Provider};
//! use localpro_recommender::{
//!     HybridRecommender, InteractionWeights, RecommendationRequest, RecommenderSnapshot,
//! };
//!
//! let providers = vec![
//!     Provider::new(1, "Plumber").with_rating(4.6),
//!     Provider::new(2, "Plumber").with_rating(3.9),
//! ];
//! let interactions = vec![Interaction::new(10, 2, InteractionKind::Hire, 0)];
//! let snapshot =
//!     RecommenderSnapshot::build(&providers, &interactions, &InteractionWeights::default());
//!
//! let recommender = HybridRecommender::default();
//! recommender.install(snapshot);
//!
//! let request = RecommendationRequest::new(2).with_user(10);
//! let recommendation = recommender.recommend(&request, &providers);
//! assert!(!recommendation.is_fallback());
//! assert_eq!(recommendation.providers().len(), 2);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod collaborative;
mod content;
mod error;
mod features;
mod fusion;
mod interactions;
mod recommender;
mod scoreboard;
mod similarity;
mod snapshot;
mod weights;

pub use error::{ConfigError, FusionFailure, SnapshotError};
pub use features::{NUMERIC_FEATURE_COUNT, ProviderFeatureMatrix, SimilarityMatrix};
pub use interactions::InteractionMatrix;
pub use recommender::{
    FALLBACK_NOTE, HybridRecommender, Recommendation, RecommendationRequest, fallback_ranking,
};
pub use snapshot::{DEFAULT_LIST_LENGTH, RecommenderSnapshot};
pub use weights::{FusionConfig, InteractionWeights};
