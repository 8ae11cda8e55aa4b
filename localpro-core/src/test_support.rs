//! Test-only fixtures shared by unit, behaviour, and property tests.
//!
//! The synthetic generator mirrors the marketplace's seeding rules so
//! classifier tests train on realistic, reproducible batches.

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;

use crate::{Interaction, InteractionKind, Provider, ReliabilityLabel, coord_from_lat_lon};

/// Service categories offered by the synthetic marketplace.
pub const SERVICE_TYPES: [&str; 8] = [
    "Electrician",
    "Plumber",
    "Tutor",
    "Driver",
    "Carpenter",
    "Cleaner",
    "Gardener",
    "Painter",
];

/// Chennai neighbourhoods with `(latitude, longitude)` centres.
pub const LOCATIONS: [(&str, f64, f64); 6] = [
    ("T Nagar", 13.0418, 80.2341),
    ("Anna Nagar", 13.0850, 80.2101),
    ("Adyar", 13.0012, 80.2565),
    ("Velachery", 12.9815, 80.2180),
    ("Mylapore", 13.0368, 80.2676),
    ("Tambaram", 12.9249, 80.1000),
];

/// Label a provider with the marketplace's rule of thumb.
#[must_use]
pub fn reliability_rule(rating: f64, completion_rate: f64, response_time: f64) -> ReliabilityLabel {
    if rating >= 4.2 && completion_rate >= 0.85 && response_time <= 8.0 {
        ReliabilityLabel::High
    } else if rating >= 3.0 && completion_rate >= 0.65 {
        ReliabilityLabel::Moderate
    } else {
        ReliabilityLabel::Low
    }
}

/// Generate `count` labelled providers from a fixed seed.
///
/// Metric ranges follow the marketplace seeding script: ratings in
/// `2.5..5.0`, completion in `0.6..1.0`, response time in `0.5..24` hours.
#[must_use]
pub fn synthetic_providers(seed: u64, count: usize) -> Vec<(Provider, ReliabilityLabel)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|offset| {
            let id = u64::try_from(offset).map_or(u64::MAX, |value| value.saturating_add(1));
            let provider = synthetic_provider(&mut rng, id);
            let label = reliability_rule(
                provider.rating,
                provider.completion_rate,
                provider.response_time,
            );
            (provider, label)
        })
        .collect()
}

#[expect(
    clippy::float_arithmetic,
    reason = "fixture generation jitters coordinates and rounds metrics"
)]
fn synthetic_provider(rng: &mut ChaCha8Rng, id: u64) -> Provider {
    let service_type = SERVICE_TYPES.choose(rng).copied().unwrap_or("Electrician");
    let (area, latitude, longitude) = LOCATIONS
        .choose(rng)
        .copied()
        .unwrap_or(("T Nagar", 13.0418, 80.2341));
    let coordinates = coord_from_lat_lon(
        latitude + rng.gen_range(-0.01..0.01),
        longitude + rng.gen_range(-0.01..0.01),
    );
    let experience_years = rng.gen_range(1..=20_u32);
    Provider::new(id, service_type)
        .with_location(area)
        .with_coordinates(coordinates)
        .with_rating(round2(rng.gen_range(2.5..5.0)))
        .with_history(experience_years, rng.gen_range(10..=500))
        .with_performance(round2(rng.gen_range(0.6..1.0)), round2(rng.gen_range(0.5..24.0)))
        .with_verified(rng.gen_range(0..4) != 0)
}

/// Generate `count` random interactions between the given users and
/// providers.
#[must_use]
pub fn synthetic_interactions(
    seed: u64,
    users: &[u64],
    providers: &[u64],
    count: usize,
) -> Vec<Interaction> {
    const KINDS: [InteractionKind; 4] = [
        InteractionKind::View,
        InteractionKind::Contact,
        InteractionKind::Hire,
        InteractionKind::Favorite,
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut interactions = Vec::with_capacity(count);
    for _ in 0..count {
        let (Some(&user), Some(&provider), Some(kind)) = (
            users.choose(&mut rng),
            providers.choose(&mut rng),
            KINDS.choose(&mut rng),
        ) else {
            break;
        };
        let interaction = Interaction::new(user, provider, kind.clone(), rng.gen_range(0..90))
            .with_count(rng.gen_range(1..=10));
        interactions.push(interaction);
    }
    interactions
}

#[expect(
    clippy::float_arithmetic,
    reason = "rounding to two decimal places mirrors stored precision"
)]
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
