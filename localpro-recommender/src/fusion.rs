//! Weighted fusion of collaborative, content, rating, and proximity signals.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use geo::Coord;
use localpro_core::{Provider, haversine_km};

use crate::scoreboard::{ScoreBoard, rank_points};
use crate::{FusionConfig, FusionFailure, RecommendationRequest, RecommenderSnapshot};

/// Rank `providers` for `request` against `snapshot`.
///
/// Only providers matching the request's service type are candidates, and
/// only candidates accrue score. Providers enter the ranking in first-seen
/// order: collaborative hits, content hits, then every candidate through
/// the rating term.
pub(crate) fn fuse(
    snapshot: &RecommenderSnapshot,
    config: &FusionConfig,
    request: &RecommendationRequest,
    providers: &[Provider],
) -> Result<Vec<Provider>, FusionFailure> {
    let candidates = Candidates::select(providers, request.service_type.as_deref());

    let mut board = ScoreBoard::new();
    if let Some(user_id) = request.user_id {
        add_collaborative(&mut board, snapshot, config, user_id, request.count, &candidates);
        add_content(&mut board, snapshot, config, user_id, request.count, &candidates);
    }
    add_rating(&mut board, config, &candidates);
    if let Some(location) = request.user_location {
        add_proximity(&mut board, config, &candidates, location);
    }

    let scores = board.ranked();
    // Any non-finite total fails the request, even one that would fall outside the top `count`.
    if let Some(&(provider_id, _)) = scores.iter().find(|(_, score)| !score.is_finite()) {
        return Err(FusionFailure::NonFiniteScore { provider_id });
    }
    Ok(scores
        .into_iter()
        .filter_map(|(provider_id, _)| candidates.by_id.get(&provider_id))
        .take(request.count)
        .map(|provider| (*provider).clone())
        .collect())
}

/// Providers eligible for a request, deduplicated by id in input order.
struct Candidates<'a> {
    order: Vec<&'a Provider>,
    by_id: HashMap<u64, &'a Provider>,
}

impl<'a> Candidates<'a> {
    fn select(providers: &'a [Provider], service_type: Option<&str>) -> Self {
        let mut order = Vec::new();
        let mut by_id = HashMap::new();
        for provider in providers
            .iter()
            .filter(|provider| provider.matches_service(service_type))
        {
            if let Entry::Vacant(slot) = by_id.entry(provider.id) {
                slot.insert(provider);
                order.push(provider);
            }
        }
        Self { order, by_id }
    }

    fn contains(&self, provider_id: u64) -> bool {
        self.by_id.contains_key(&provider_id)
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "list positions are weighted into fusion points"
)]
fn add_ranked_list(board: &mut ScoreBoard, ids: &[u64], weight: f64, candidates: &Candidates<'_>) {
    for (index, &id) in ids.iter().enumerate() {
        if candidates.contains(id) {
            board.add(id, weight * rank_points(ids.len(), index));
        }
    }
}

fn add_collaborative(
    board: &mut ScoreBoard,
    snapshot: &RecommenderSnapshot,
    config: &FusionConfig,
    user_id: u64,
    count: usize,
    candidates: &Candidates<'_>,
) {
    let depth = config.collaborative_depth.saturating_mul(count);
    let ids = snapshot.collaborate_with_neighbours(user_id, depth, config.neighbour_count);
    add_ranked_list(board, &ids, config.collaborative_weight, candidates);
}

fn add_content(
    board: &mut ScoreBoard,
    snapshot: &RecommenderSnapshot,
    config: &FusionConfig,
    user_id: u64,
    count: usize,
    candidates: &Candidates<'_>,
) {
    let depth = config.content_depth.saturating_mul(count);
    for seed in snapshot
        .interactions()
        .top_providers(user_id, config.history_depth)
    {
        let ids = snapshot.similar(seed, depth);
        add_ranked_list(board, &ids, config.content_weight, candidates);
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "ratings are scaled into fusion points"
)]
fn add_rating(board: &mut ScoreBoard, config: &FusionConfig, candidates: &Candidates<'_>) {
    for provider in &candidates.order {
        board.add(
            provider.id,
            config.rating_weight * provider.rating * config.rating_scale,
        );
    }
}

#[expect(
    clippy::float_arithmetic,
    reason = "distance decays linearly into fusion points"
)]
fn add_proximity(
    board: &mut ScoreBoard,
    config: &FusionConfig,
    candidates: &Candidates<'_>,
    location: Coord<f64>,
) {
    let radius = config.proximity_radius_km;
    for provider in &candidates.order {
        let Some(coordinates) = provider.coordinates else {
            continue;
        };
        let distance = haversine_km(location, coordinates);
        let closeness = (radius - distance).max(0.0) / radius;
        board.add(
            provider.id,
            config.proximity_weight * closeness * config.proximity_scale,
        );
    }
}
