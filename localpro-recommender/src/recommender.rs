//! Request-time entry point that serves fused or fallback rankings.

use std::sync::{Arc, PoisonError, RwLock};

use geo::Coord;
use localpro_core::Provider;

use crate::scoreboard::descending;
use crate::{ConfigError, FusionConfig, FusionFailure, RecommenderSnapshot, fusion};

/// Note attached to rating-based fallback responses.
pub const FALLBACK_NOTE: &str = "Using fallback recommendation (rating-based)";

/// Parameters of one recommendation request.
///
/// # Examples
/// ```
/// use localpro_core::coord_from_lat_lon;
/// use localpro_recommender::RecommendationRequest;
///
/// let request = RecommendationRequest::new(5)
///     .with_user(42)
///     .with_location(coord_from_lat_lon(13.0418, 80.2341))
///     .with_service_type("Electrician");
/// assert_eq!(request.count, 5);
/// assert_eq!(request.user_id, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    /// Requesting user; `None` skips the collaborative and content terms.
    pub user_id: Option<u64>,
    /// Requesting user's position; `None` skips the proximity term.
    pub user_location: Option<Coord<f64>>,
    /// Restrict results to one service type.
    pub service_type: Option<String>,
    /// Maximum number of providers to return.
    pub count: usize,
}

impl RecommendationRequest {
    /// Anonymous, unfiltered request for `count` providers.
    #[must_use]
    pub const fn new(count: usize) -> Self {
        Self {
            user_id: None,
            user_location: None,
            service_type: None,
            count,
        }
    }

    /// Set the requesting user while returning `self` for chaining.
    #[must_use]
    pub const fn with_user(mut self, user_id: u64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set the user's position while returning `self` for chaining.
    #[must_use]
    pub const fn with_location(mut self, location: Coord<f64>) -> Self {
        self.user_location = Some(location);
        self
    }

    /// Restrict to `service_type` while returning `self` for chaining.
    #[must_use]
    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }
}

/// Ranked providers, tagged by how they were produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    /// Ranking from the full signal fusion.
    Fused(Vec<Provider>),
    /// Rating-sorted ranking served because fusion failed.
    Fallback {
        /// Providers sorted by rating.
        providers: Vec<Provider>,
        /// Why fusion could not run.
        reason: FusionFailure,
    },
}

impl Recommendation {
    /// Borrow the ranked providers.
    #[must_use]
    pub fn providers(&self) -> &[Provider] {
        match self {
            Self::Fused(providers) | Self::Fallback { providers, .. } => providers,
        }
    }

    /// Consume the recommendation and return the ranked providers.
    #[must_use]
    pub fn into_providers(self) -> Vec<Provider> {
        match self {
            Self::Fused(providers) | Self::Fallback { providers, .. } => providers,
        }
    }

    /// Report whether this is a fallback ranking.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }

    /// Note to show alongside a fallback ranking.
    #[must_use]
    pub const fn note(&self) -> Option<&'static str> {
        match self {
            Self::Fused(_) => None,
            Self::Fallback { .. } => Some(FALLBACK_NOTE),
        }
    }
}

/// Hybrid recommender serving requests from the installed snapshot.
///
/// The snapshot sits behind an `Arc` so a retrain can [`install`] a
/// replacement while requests are in flight: each request clones the `Arc`
/// once and scores against that generation throughout.
///
/// [`install`]: Self::install
#[derive(Debug, Default)]
pub struct HybridRecommender {
    snapshot: RwLock<Option<Arc<RecommenderSnapshot>>>,
    config: FusionConfig,
}

impl HybridRecommender {
    /// Create a recommender with no snapshot installed.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(config: FusionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            snapshot: RwLock::new(None),
            config: config.validate()?,
        })
    }

    /// Fusion settings in use.
    #[must_use]
    pub const fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Replace the installed snapshot, returning the previous one.
    pub fn install(&self, snapshot: RecommenderSnapshot) -> Option<Arc<RecommenderSnapshot>> {
        self.install_shared(Arc::new(snapshot))
    }

    /// Replace the installed snapshot with a shared one.
    pub fn install_shared(
        &self,
        snapshot: Arc<RecommenderSnapshot>,
    ) -> Option<Arc<RecommenderSnapshot>> {
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        log::debug!(
            "installing recommender snapshot with {} providers",
            snapshot.features().len()
        );
        guard.replace(snapshot)
    }

    /// The currently installed snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<RecommenderSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rank `providers` for `request`.
    ///
    /// Never fails: when no snapshot is installed or scoring breaks down,
    /// the result is a [`Recommendation::Fallback`] sorted by rating.
    #[must_use]
    pub fn recommend(
        &self,
        request: &RecommendationRequest,
        providers: &[Provider],
    ) -> Recommendation {
        let outcome = self
            .snapshot()
            .ok_or(FusionFailure::SnapshotUnavailable)
            .and_then(|snapshot| fusion::fuse(&snapshot, &self.config, request, providers));
        match outcome {
            Ok(ranked) => Recommendation::Fused(ranked),
            Err(reason) => {
                log::warn!("{reason}; serving rating-based fallback");
                Recommendation::Fallback {
                    providers: fallback_ranking(
                        providers,
                        request.service_type.as_deref(),
                        request.count,
                    ),
                    reason,
                }
            }
        }
    }
}

/// Top `count` providers matching `service_type`, by descending rating.
///
/// Equal ratings keep input order; NaN ratings sort last.
#[must_use]
pub fn fallback_ranking(
    providers: &[Provider],
    service_type: Option<&str>,
    count: usize,
) -> Vec<Provider> {
    let mut matching: Vec<&Provider> = providers
        .iter()
        .filter(|provider| provider.matches_service(service_type))
        .collect();
    matching.sort_by(|left, right| descending(left.rating, right.rating));
    matching.into_iter().take(count).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InteractionWeights;
    use rstest::{fixture, rstest};
    use std::thread;

    #[fixture]
    fn providers() -> Vec<Provider> {
        vec![
            Provider::new(1, "Cleaner").with_rating(3.5),
            Provider::new(2, "Cleaner").with_rating(4.9),
            Provider::new(3, "Driver").with_rating(5.0),
            Provider::new(4, "Cleaner").with_rating(3.5),
        ]
    }

    #[rstest]
    fn uninitialised_recommender_falls_back(providers: Vec<Provider>) {
        let recommender = HybridRecommender::default();
        let request = RecommendationRequest::new(2).with_service_type("Cleaner");
        let recommendation = recommender.recommend(&request, &providers);
        assert!(recommendation.is_fallback());
        assert_eq!(recommendation.note(), Some(FALLBACK_NOTE));
        let ids: Vec<u64> = recommendation.providers().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(matches!(
            recommendation,
            Recommendation::Fallback {
                reason: FusionFailure::SnapshotUnavailable,
                ..
            }
        ));
    }

    #[rstest]
    fn installed_snapshot_fuses(providers: Vec<Provider>) {
        let recommender = HybridRecommender::default();
        let previous = recommender.install(RecommenderSnapshot::build(
            &providers,
            &[],
            &InteractionWeights::default(),
        ));
        assert!(previous.is_none());
        let recommendation = recommender.recommend(&RecommendationRequest::new(10), &providers);
        assert!(!recommendation.is_fallback());
        assert_eq!(recommendation.note(), None);
        assert_eq!(recommendation.into_providers().len(), 4);
    }

    #[rstest]
    fn nan_rating_outside_the_top_still_falls_back(providers: Vec<Provider>) {
        let mut batch = providers;
        batch.push(Provider::new(5, "Cleaner").with_rating(f64::NAN));
        let recommender = HybridRecommender::default();
        recommender.install(RecommenderSnapshot::build(
            &batch,
            &[],
            &InteractionWeights::default(),
        ));
        let recommendation = recommender.recommend(&RecommendationRequest::new(1), &batch);
        assert!(matches!(
            recommendation,
            Recommendation::Fallback {
                reason: FusionFailure::NonFiniteScore { provider_id: 5 },
                ..
            }
        ));
        let ids: Vec<u64> = recommendation.providers().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[rstest]
    fn fallback_keeps_input_order_for_ties(providers: Vec<Provider>) {
        let ranked = fallback_ranking(&providers, Some("Cleaner"), 10);
        let ids: Vec<u64> = ranked.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1, 4]);
        assert!(fallback_ranking(&providers, Some("Tutor"), 3).is_empty());
    }

    #[rstest]
    fn rejects_invalid_config() {
        let config = FusionConfig {
            rating_weight: f64::NAN,
            ..FusionConfig::default()
        };
        assert!(HybridRecommender::new(config).is_err());
    }

    #[rstest]
    fn readers_see_whole_snapshots_during_swaps(providers: Vec<Provider>) {
        let recommender = Arc::new(HybridRecommender::default());
        let small = Arc::new(RecommenderSnapshot::build(
            providers.get(..2).unwrap_or_default(),
            &[],
            &InteractionWeights::default(),
        ));
        let large = Arc::new(RecommenderSnapshot::build(
            &providers,
            &[],
            &InteractionWeights::default(),
        ));
        recommender.install_shared(Arc::clone(&small));

        let writer = {
            let shared = Arc::clone(&recommender);
            let generations = [Arc::clone(&large), Arc::clone(&small)];
            thread::spawn(move || {
                for next in generations.iter().cycle().take(200) {
                    shared.install_shared(Arc::clone(next));
                }
            })
        };
        for _ in 0..200 {
            let current = recommender.snapshot().expect("snapshot installed");
            let size = current.features().len();
            assert!(size == 2 || size == 4);
            assert_eq!(current.similarity().len(), size);
        }
        writer.join().expect("writer thread");
    }
}
