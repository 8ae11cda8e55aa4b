//! Criterion benchmarks for snapshot builds and fused recommendations.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package localpro-recommender
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use localpro_core::test_support::{LOCATIONS, synthetic_interactions, synthetic_providers};
use localpro_core::{Interaction, Provider, coord_from_lat_lon};
use localpro_recommender::{
    HybridRecommender, InteractionWeights, RecommendationRequest, RecommenderSnapshot,
};

/// Seed for deterministic fixture generation.
const BENCHMARK_SEED: u64 = 42;

/// Provider counts to benchmark.
const PROVIDER_COUNTS: &[usize] = &[50, 200, 500];

/// Users interacting with the synthetic marketplace.
const USERS: &[u64] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

fn fixtures(size: usize) -> (Vec<Provider>, Vec<Interaction>) {
    let providers: Vec<Provider> = synthetic_providers(BENCHMARK_SEED, size)
        .into_iter()
        .map(|(provider, _)| provider)
        .collect();
    let ids: Vec<u64> = providers.iter().map(|provider| provider.id).collect();
    let interactions = synthetic_interactions(BENCHMARK_SEED, USERS, &ids, size.saturating_mul(4));
    (providers, interactions)
}

fn bench_snapshot_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_build");
    for &size in PROVIDER_COUNTS {
        let (providers, interactions) = fixtures(size);
        group.throughput(Throughput::Elements(u64::try_from(size).unwrap_or(u64::MAX)));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                RecommenderSnapshot::build(
                    black_box(&providers),
                    black_box(&interactions),
                    &InteractionWeights::default(),
                )
            });
        });
    }
    group.finish();
}

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");
    let [(_, latitude, longitude), ..] = LOCATIONS;
    for &size in PROVIDER_COUNTS {
        let (providers, interactions) = fixtures(size);
        let recommender = HybridRecommender::default();
        recommender.install(RecommenderSnapshot::build(
            &providers,
            &interactions,
            &InteractionWeights::default(),
        ));
        let request = RecommendationRequest::new(10)
            .with_user(3)
            .with_location(coord_from_lat_lon(latitude, longitude));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| recommender.recommend(black_box(&request), black_box(&providers)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_snapshot_build, bench_recommend);
criterion_main!(benches);
