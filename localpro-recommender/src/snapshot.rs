//! Immutable bundle of every matrix a recommendation pass reads.

use localpro_core::{Interaction, Provider};

use crate::{
    InteractionMatrix, InteractionWeights, ProviderFeatureMatrix, SimilarityMatrix, SnapshotError,
    collaborative, content,
};

/// List length callers conventionally request from
/// [`RecommenderSnapshot::collaborate`] and [`RecommenderSnapshot::similar`].
pub const DEFAULT_LIST_LENGTH: usize = 10;

const DEFAULT_NEIGHBOURS: usize = 5;

/// Interaction, feature, and similarity matrices from one build.
///
/// A snapshot is never modified after construction. Rebuilding produces a
/// new value which replaces the old one wholesale, so readers never mix
/// matrices from different builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommenderSnapshot {
    interactions: InteractionMatrix,
    features: ProviderFeatureMatrix,
    similarity: SimilarityMatrix,
}

impl RecommenderSnapshot {
    /// Build every matrix from a full batch of records.
    #[must_use]
    pub fn build(
        providers: &[Provider],
        interactions: &[Interaction],
        weights: &InteractionWeights,
    ) -> Self {
        let interaction_matrix = InteractionMatrix::build(interactions, weights);
        let (features, similarity) = ProviderFeatureMatrix::build(providers);
        log::debug!(
            "built recommender snapshot: {} users, {} providers, {} feature columns",
            interaction_matrix.user_count(),
            features.len(),
            features.dimension()
        );
        Self {
            interactions: interaction_matrix,
            features,
            similarity,
        }
    }

    /// Reassemble a snapshot from previously persisted matrices.
    ///
    /// # Errors
    /// Returns a [`SnapshotError`] when the feature matrix is internally
    /// inconsistent or the similarity matrix does not have one square row
    /// per feature row.
    pub fn from_parts(
        interactions: InteractionMatrix,
        features: ProviderFeatureMatrix,
        similarity: SimilarityMatrix,
    ) -> Result<Self, SnapshotError> {
        features.validate()?;
        similarity.check_shape(&features)?;
        Ok(Self {
            interactions,
            features,
            similarity,
        })
    }

    /// Borrow the interaction matrix.
    #[must_use]
    pub const fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    /// Borrow the provider feature matrix.
    #[must_use]
    pub const fn features(&self) -> &ProviderFeatureMatrix {
        &self.features
    }

    /// Borrow the provider similarity matrix.
    #[must_use]
    pub const fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    /// Providers favoured by the five users most similar to `user_id`.
    ///
    /// Returns at most `k` ids and an empty list for unknown users.
    #[must_use]
    pub fn collaborate(&self, user_id: u64, k: usize) -> Vec<u64> {
        self.collaborate_with_neighbours(user_id, k, DEFAULT_NEIGHBOURS)
    }

    /// As [`Self::collaborate`], consulting `neighbours` similar users.
    #[must_use]
    pub fn collaborate_with_neighbours(
        &self,
        user_id: u64,
        k: usize,
        neighbours: usize,
    ) -> Vec<u64> {
        collaborative::collaborate(&self.interactions, user_id, k, neighbours)
    }

    /// The `k` providers whose profiles most resemble `provider_id`.
    #[must_use]
    pub fn similar(&self, provider_id: u64, k: usize) -> Vec<u64> {
        content::similar(&self.features, &self.similarity, provider_id, k)
    }

    /// Consume the snapshot and return its matrices.
    #[must_use]
    pub fn into_parts(self) -> (InteractionMatrix, ProviderFeatureMatrix, SimilarityMatrix) {
        (self.interactions, self.features, self.similarity)
    }
}
