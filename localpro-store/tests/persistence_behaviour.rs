//! Behavioural coverage for publishing and reloading model generations.

use std::cell::RefCell;
use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use localpro_core::Provider;
use localpro_core::test_support::{synthetic_interactions, synthetic_providers};
use localpro_recommender::{
    HybridRecommender, InteractionWeights, Recommendation, RecommendationRequest,
    RecommenderSnapshot,
};
use localpro_reliability::{
    ClassifierArtifact, ForestConfig, ModelChoice, ReliabilityClassifier, TrainingConfig,
    TrainingExample, train,
};
use localpro_store::{Blob, Generation, ModelStore, ModelStoreError};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

/// Temporary store plus the providers it was trained on.
pub struct World {
    _tmp: TempDir,
    store: ModelStore,
    providers: Vec<Provider>,
}

/// Lazily created store.
#[fixture]
pub fn world() -> RefCell<Option<World>> {
    RefCell::new(None)
}

/// Services populated from the store.
#[fixture]
pub fn services() -> (HybridRecommender, ReliabilityClassifier) {
    (HybridRecommender::default(), ReliabilityClassifier::new())
}

/// Captures a classifier load failure.
#[fixture]
pub fn failure() -> RefCell<Option<ModelStoreError>> {
    RefCell::new(None)
}

fn trained_models(providers: &[(Provider, localpro_core::ReliabilityLabel)]) -> ClassifierArtifact {
    let examples: Vec<TrainingExample> = providers
        .iter()
        .map(|(provider, label)| TrainingExample::from_provider(provider, *label))
        .collect();
    let config = TrainingConfig {
        forest: ForestConfig {
            trees: 10,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    };
    train(&examples, &config).expect("train").artifact
}

#[given("a store holding one published generation")]
fn published(world: &RefCell<Option<World>>) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().join("models")).expect("utf-8 tempdir");
    let store = ModelStore::open(&root).expect("open store");
    let labelled = synthetic_providers(9, 80);
    let providers: Vec<Provider> = labelled.iter().map(|(provider, _)| provider.clone()).collect();
    let users: Vec<u64> = (1..=15).collect();
    let ids: Vec<u64> = providers.iter().map(|provider| provider.id).collect();
    let interactions = synthetic_interactions(9, &users, &ids, 120);
    let snapshot =
        RecommenderSnapshot::build(&providers, &interactions, &InteractionWeights::default());
    let generation = store
        .publish(&snapshot, &trained_models(&labelled))
        .expect("publish");
    assert_eq!(generation, Generation::FIRST);
    *world.borrow_mut() = Some(World {
        _tmp: tmp,
        store,
        providers,
    });
}

#[given("the feature scaler blob has been deleted")]
fn delete_scaler(world: &RefCell<Option<World>>) {
    let binding = world.borrow();
    let state = binding.as_ref().expect("store");
    let path = state
        .store
        .generation_dir(Generation::FIRST)
        .join(Blob::FeatureScaler.file_name());
    std::fs::remove_file(path.as_std_path()).expect("remove scaler");
}

#[when("the latest generation is installed into fresh services")]
fn install_latest(
    world: &RefCell<Option<World>>,
    services: &(HybridRecommender, ReliabilityClassifier),
) {
    let binding = world.borrow();
    let state = binding.as_ref().expect("store");
    let loaded = state.store.load_latest().expect("load latest");
    let (recommender, classifier) = services;
    recommender.install(loaded.snapshot);
    classifier.install(loaded.artifact);
}

#[when("the classifier half of the generation is loaded")]
fn load_classifier(world: &RefCell<Option<World>>, failure: &RefCell<Option<ModelStoreError>>) {
    let binding = world.borrow();
    let state = binding.as_ref().expect("store");
    let err = state
        .store
        .load_classifier(Generation::FIRST)
        .expect_err("scaler is missing");
    *failure.borrow_mut() = Some(err);
}

#[then("the recommender ranks by signal fusion")]
fn ranks_by_fusion(
    world: &RefCell<Option<World>>,
    services: &(HybridRecommender, ReliabilityClassifier),
) {
    let binding = world.borrow();
    let state = binding.as_ref().expect("store");
    let request = RecommendationRequest::new(5).with_user(3);
    let outcome = services.0.recommend(&request, &state.providers);
    assert!(matches!(outcome, Recommendation::Fused(_)));
    assert_eq!(outcome.providers().len(), 5);
}

#[then("the classifier answers predictions")]
fn classifier_answers(services: &(HybridRecommender, ReliabilityClassifier)) {
    let features = BTreeMap::from([("rating".to_owned(), 4.9), ("completion_rate".to_owned(), 0.97)]);
    let prediction = services
        .1
        .predict(&features, ModelChoice::Linear)
        .expect("classifier is loaded");
    let total: f64 = prediction.probabilities.to_array().iter().sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[then("loading fails naming the feature scaler blob")]
fn names_scaler(failure: &RefCell<Option<ModelStoreError>>) {
    let binding = failure.borrow();
    let err = binding.as_ref().expect("failure recorded");
    assert!(
        matches!(err, ModelStoreError::MissingBlob { file: "feature_scaler.bin", .. }),
        "unexpected error {err}"
    );
}

#[scenario(path = "tests/features/persistence.feature", index = 0)]
fn reload_serves(
    world: RefCell<Option<World>>,
    services: (HybridRecommender, ReliabilityClassifier),
) {
    let _ = (world, services);
}

#[scenario(path = "tests/features/persistence.feature", index = 1)]
fn incomplete_generation(
    world: RefCell<Option<World>>,
    failure: RefCell<Option<ModelStoreError>>,
) {
    let _ = (world, failure);
}
