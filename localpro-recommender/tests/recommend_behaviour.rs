//! Behavioural coverage for end-to-end recommendation requests.

use std::cell::RefCell;

use geo::Coord;
use localpro_core::{EARTH_RADIUS_KM, Interaction, InteractionKind, Provider, coord_from_lat_lon};
use localpro_recommender::{
    FALLBACK_NOTE, FusionFailure, HybridRecommender, InteractionWeights, Recommendation,
    RecommendationRequest, RecommenderSnapshot,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

const RETURNING_USER: u64 = 1;
const UNKNOWN_USER: u64 = 99;

/// Position of the requesting user in T Nagar.
fn user_location() -> Coord<f64> {
    coord_from_lat_lon(13.0418, 80.2341)
}

/// Position `km` due north of the requesting user.
#[expect(
    clippy::float_arithmetic,
    reason = "offsets convert kilometres into degrees of latitude"
)]
fn north_of_user(km: f64) -> Coord<f64> {
    let origin = user_location();
    let km_per_degree = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
    coord_from_lat_lon(origin.y + km / km_per_degree, origin.x)
}

/// Providers available to the scenario.
#[fixture]
pub fn providers() -> RefCell<Vec<Provider>> {
    RefCell::new(Vec::new())
}

/// Recommender under test; starts without a snapshot.
#[fixture]
pub fn recommender() -> HybridRecommender {
    HybridRecommender::default()
}

/// Captures the recommendation for assertions.
#[fixture]
pub fn outcome() -> RefCell<Option<Recommendation>> {
    RefCell::new(None)
}

#[given("three plumbers spread around the requesting user")]
fn three_plumbers(providers: &RefCell<Vec<Provider>>) {
    *providers.borrow_mut() = vec![
        Provider::new(1, "Plumber")
            .with_rating(4.5)
            .with_coordinates(north_of_user(2.0)),
        Provider::new(2, "Plumber")
            .with_rating(3.0)
            .with_coordinates(north_of_user(8.0)),
        Provider::new(3, "Plumber").with_rating(5.0),
        Provider::new(4, "Electrician")
            .with_rating(5.0)
            .with_coordinates(user_location()),
    ];
}

#[given("three equally rated cleaners with identical profiles")]
fn three_cleaners(providers: &RefCell<Vec<Provider>>) {
    *providers.borrow_mut() = (10..=12)
        .map(|id| Provider::new(id, "Cleaner").with_rating(4.0))
        .collect();
}

#[given("a recommender built without interaction history")]
fn recommender_without_history(
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
) {
    let snapshot =
        RecommenderSnapshot::build(&providers.borrow(), &[], &InteractionWeights::default());
    recommender.install(snapshot);
}

#[given("a recommender with no snapshot installed")]
fn recommender_without_snapshot(recommender: &HybridRecommender) {
    assert!(recommender.snapshot().is_none());
}

#[given("a recommender built from shared hiring history")]
fn recommender_with_history(
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
) {
    let interactions = [
        Interaction::new(RETURNING_USER, 12, InteractionKind::Hire, 0),
        Interaction::new(2, 12, InteractionKind::Hire, 0),
        Interaction::new(2, 11, InteractionKind::Hire, 0),
    ];
    let snapshot = RecommenderSnapshot::build(
        &providers.borrow(),
        &interactions,
        &InteractionWeights::default(),
    );
    recommender.install(snapshot);
}

fn request_plumbers(
    count: usize,
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
    outcome: &RefCell<Option<Recommendation>>,
) {
    let request = RecommendationRequest::new(count)
        .with_user(UNKNOWN_USER)
        .with_location(user_location())
        .with_service_type("Plumber");
    *outcome.borrow_mut() = Some(recommender.recommend(&request, &providers.borrow()));
}

#[when("an unknown user asks for three plumbers near them")]
fn ask_for_three(
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
    outcome: &RefCell<Option<Recommendation>>,
) {
    request_plumbers(3, providers, recommender, outcome);
}

#[when("an unknown user asks for two plumbers near them")]
fn ask_for_two(
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
    outcome: &RefCell<Option<Recommendation>>,
) {
    request_plumbers(2, providers, recommender, outcome);
}

#[when("the returning user asks for three cleaners")]
fn returning_user_asks(
    providers: &RefCell<Vec<Provider>>,
    recommender: &HybridRecommender,
    outcome: &RefCell<Option<Recommendation>>,
) {
    let request = RecommendationRequest::new(3)
        .with_user(RETURNING_USER)
        .with_service_type("Cleaner");
    *outcome.borrow_mut() = Some(recommender.recommend(&request, &providers.borrow()));
}

fn ranked_ids(outcome: &RefCell<Option<Recommendation>>) -> Vec<u64> {
    outcome
        .borrow()
        .as_ref()
        .unwrap_or_else(|| panic!("recommendation must be recorded"))
        .providers()
        .iter()
        .map(|provider| provider.id)
        .collect()
}

#[then("the plumbers are ranked nearest high rating first")]
fn ranked_by_rating_and_distance(outcome: &RefCell<Option<Recommendation>>) {
    // 4.5 × 4 + 8 beats 5.0 × 4 + 0, which beats 3.0 × 4 + 2.
    assert_eq!(ranked_ids(outcome), vec![1, 3, 2]);
}

#[then("the ranking comes from signal fusion")]
fn ranking_is_fused(outcome: &RefCell<Option<Recommendation>>) {
    let binding = outcome.borrow();
    let recommendation = binding
        .as_ref()
        .unwrap_or_else(|| panic!("recommendation must be recorded"));
    assert!(matches!(recommendation, Recommendation::Fused(_)));
    assert_eq!(recommendation.note(), None);
}

#[then("the two best-rated plumbers are returned")]
fn best_rated_returned(outcome: &RefCell<Option<Recommendation>>) {
    assert_eq!(ranked_ids(outcome), vec![3, 1]);
}

#[then("the ranking is flagged as a rating-based fallback")]
fn ranking_is_fallback(outcome: &RefCell<Option<Recommendation>>) {
    let binding = outcome.borrow();
    let recommendation = binding
        .as_ref()
        .unwrap_or_else(|| panic!("recommendation must be recorded"));
    match recommendation {
        Recommendation::Fallback { reason, .. } => {
            assert_eq!(*reason, FusionFailure::SnapshotUnavailable);
        }
        Recommendation::Fused(_) => panic!("expected a fallback ranking"),
    }
    assert_eq!(recommendation.note(), Some(FALLBACK_NOTE));
}

#[then("the cleaner hired by the similar user ranks first")]
fn similar_user_hire_first(outcome: &RefCell<Option<Recommendation>>) {
    let ids = ranked_ids(outcome);
    assert_eq!(ids.first(), Some(&11), "ranking was {ids:?}");
    assert_eq!(ids.len(), 3);
}

#[scenario(path = "tests/features/recommend.feature", index = 0)]
fn cold_start_ranking(
    providers: RefCell<Vec<Provider>>,
    recommender: HybridRecommender,
    outcome: RefCell<Option<Recommendation>>,
) {
    let _ = (providers, recommender, outcome);
}

#[scenario(path = "tests/features/recommend.feature", index = 1)]
fn fallback_ranking(
    providers: RefCell<Vec<Provider>>,
    recommender: HybridRecommender,
    outcome: RefCell<Option<Recommendation>>,
) {
    let _ = (providers, recommender, outcome);
}

#[scenario(path = "tests/features/recommend.feature", index = 2)]
fn returning_user_ranking(
    providers: RefCell<Vec<Provider>>,
    recommender: HybridRecommender,
    outcome: RefCell<Option<Recommendation>>,
) {
    let _ = (providers, recommender, outcome);
}
