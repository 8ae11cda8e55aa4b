//! Behavioural coverage for training and serving reliability predictions.

use std::cell::RefCell;
use std::collections::BTreeMap;

use localpro_core::ReliabilityLabel;
use localpro_core::test_support::synthetic_providers;
use localpro_reliability::{
    ClassifierError, ForestConfig, ModelChoice, PreparedData, ReliabilityClassifier,
    ReliabilityPrediction, TrainingConfig, TrainingExample, prepare, train,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

fn feature_map(values: [(&str, f64); 6]) -> BTreeMap<String, f64> {
    values
        .into_iter()
        .map(|(name, value)| (name.to_owned(), value))
        .collect()
}

/// Classifier under test; starts untrained.
#[fixture]
pub fn classifier() -> ReliabilityClassifier {
    ReliabilityClassifier::new()
}

/// Captures the prediction for assertions.
#[fixture]
pub fn prediction() -> RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>> {
    RefCell::new(None)
}

/// Labelled examples for the split scenario.
#[fixture]
pub fn batch() -> RefCell<Vec<TrainingExample>> {
    RefCell::new(Vec::new())
}

/// Captures the prepared split.
#[fixture]
pub fn prepared() -> RefCell<Option<PreparedData>> {
    RefCell::new(None)
}

#[given("a classifier with no trained models")]
fn untrained(classifier: &ReliabilityClassifier) {
    assert!(!classifier.is_trained());
}

#[given("a classifier trained on synthetic marketplace providers")]
fn trained(classifier: &ReliabilityClassifier) {
    let examples: Vec<TrainingExample> = synthetic_providers(42, 300)
        .iter()
        .map(|(provider, label)| TrainingExample::from_provider(provider, *label))
        .collect();
    let config = TrainingConfig {
        forest: ForestConfig {
            trees: 40,
            ..ForestConfig::default()
        },
        ..TrainingConfig::default()
    };
    let trained = train(&examples, &config).expect("train models");
    classifier.install(trained.artifact);
}

#[given("a labelled batch with a single highly reliable provider")]
fn degenerate_batch(batch: &RefCell<Vec<TrainingExample>>) {
    let mut examples: Vec<TrainingExample> = synthetic_providers(3, 200)
        .iter()
        .filter(|(_, label)| *label != ReliabilityLabel::High)
        .take(9)
        .map(|(provider, label)| TrainingExample::from_provider(provider, *label))
        .collect();
    let strong = synthetic_providers(3, 200)
        .into_iter()
        .find(|(_, label)| *label == ReliabilityLabel::High)
        .expect("a highly reliable provider");
    examples.push(TrainingExample::from_provider(&strong.0, strong.1));
    *batch.borrow_mut() = examples;
}

#[when("a strong provider is classified with the tree model")]
fn classify_strong(
    classifier: &ReliabilityClassifier,
    prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    let features = feature_map([
        ("experience_years", 10.0),
        ("rating", 4.8),
        ("total_jobs", 250.0),
        ("completion_rate", 0.95),
        ("response_time", 2.5),
        ("verified", 1.0),
    ]);
    *prediction.borrow_mut() = Some(classifier.predict(&features, ModelChoice::Tree));
}

#[when("a weak provider is classified with the linear model")]
fn classify_weak(
    classifier: &ReliabilityClassifier,
    prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    let features = feature_map([
        ("experience_years", 2.0),
        ("rating", 2.6),
        ("total_jobs", 12.0),
        ("completion_rate", 0.62),
        ("response_time", 20.0),
        ("verified", 0.0),
    ]);
    *prediction.borrow_mut() = Some(classifier.predict(&features, ModelChoice::Linear));
}

#[when("the batch is prepared for training")]
fn prepare_batch(batch: &RefCell<Vec<TrainingExample>>, prepared: &RefCell<Option<PreparedData>>) {
    let data = prepare(&batch.borrow(), &TrainingConfig::default()).expect("prepare batch");
    *prepared.borrow_mut() = Some(data);
}

fn recorded(
    prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) -> Result<ReliabilityPrediction, ClassifierError> {
    prediction
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("prediction must be recorded"))
}

#[then("the classifier reports that no model is loaded")]
fn reports_missing_model(
    prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    assert_eq!(recorded(prediction), Err(ClassifierError::ModelNotLoaded));
}

#[then("the provider is labelled highly reliable")]
fn labelled_high(prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>) {
    let outcome = recorded(prediction).expect("prediction");
    assert_eq!(outcome.label, ReliabilityLabel::High);
}

#[then("the confidence beats a uniform guess")]
fn confident(prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>) {
    let outcome = recorded(prediction).expect("prediction");
    assert!(outcome.confidence > 1.0 / 3.0, "confidence {}", outcome.confidence);
}

#[then("the provider is labelled low reliability")]
fn labelled_low(prediction: &RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>) {
    let outcome = recorded(prediction).expect("prediction");
    assert_eq!(outcome.label, ReliabilityLabel::Low);
}

#[then("the split is not stratified")]
fn not_stratified(prepared: &RefCell<Option<PreparedData>>) {
    let binding = prepared.borrow();
    let data = binding.as_ref().expect("prepared data");
    assert!(!data.stratified);
}

#[then("one example in five is held out")]
fn fifth_held_out(prepared: &RefCell<Option<PreparedData>>) {
    let binding = prepared.borrow();
    let data = binding.as_ref().expect("prepared data");
    assert_eq!(data.test.len(), 2);
    assert_eq!(data.train.len(), 8);
}

#[scenario(path = "tests/features/classify.feature", index = 0)]
fn untrained_classifier(
    classifier: ReliabilityClassifier,
    prediction: RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    let _ = (classifier, prediction);
}

#[scenario(path = "tests/features/classify.feature", index = 1)]
fn forest_strong_provider(
    classifier: ReliabilityClassifier,
    prediction: RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    let _ = (classifier, prediction);
}

#[scenario(path = "tests/features/classify.feature", index = 2)]
fn linear_weak_provider(
    classifier: ReliabilityClassifier,
    prediction: RefCell<Option<Result<ReliabilityPrediction, ClassifierError>>>,
) {
    let _ = (classifier, prediction);
}

#[scenario(path = "tests/features/classify.feature", index = 3)]
fn degenerate_split(
    batch: RefCell<Vec<TrainingExample>>,
    prepared: RefCell<Option<PreparedData>>,
) {
    let _ = (batch, prepared);
}
