//! `train` command: fit every model and publish a new generation.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use localpro_core::{Interaction, Provider, ReliabilityLabel};
use localpro_recommender::{InteractionWeights, RecommenderSnapshot};
use localpro_reliability::{
    ForestConfig, TrainingConfig, TrainingError, TrainingExample, TrainingReport, train,
};
use localpro_store::{Generation, ModelStore};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_json, require_existing, write_json};
use crate::{
    ARG_INTERACTIONS, ARG_PROVIDERS, ARG_SEED, ARG_STORE, ARG_TEST_FRACTION, ARG_TREES, CliError,
    DEFAULT_STORE_DIR, ENV_TRAIN_PROVIDERS,
};

/// CLI arguments for the `train` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Build the recommender matrices from a provider export and \
                 an optional interaction export, fit the reliability models \
                 on providers that carry a `reliability` label, and publish \
                 everything as a new store generation.",
    about = "Train models and publish a new generation"
)]
#[ortho_config(prefix = "LOCALPRO")]
pub(crate) struct TrainArgs {
    /// JSON array of provider records, optionally labelled.
    #[arg(long = ARG_PROVIDERS, value_name = "path")]
    #[serde(default)]
    pub(crate) providers: Option<Utf8PathBuf>,
    /// JSON array of user interactions.
    #[arg(long = ARG_INTERACTIONS, value_name = "path")]
    #[serde(default)]
    pub(crate) interactions: Option<Utf8PathBuf>,
    /// Model store directory.
    #[arg(long = ARG_STORE, value_name = "dir")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Number of trees in the random forest.
    #[arg(long = ARG_TREES, value_name = "count")]
    #[serde(default)]
    pub(crate) trees: Option<usize>,
    /// Seed for the split and the forest.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Fraction of labelled providers held out for evaluation.
    #[arg(long = ARG_TEST_FRACTION, value_name = "fraction")]
    #[serde(default)]
    pub(crate) test_fraction: Option<f64>,
}

impl TrainArgs {
    pub(crate) fn into_config(self) -> Result<TrainConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        TrainConfig::try_from(merged)
    }
}

/// Resolved `train` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrainConfig {
    pub(crate) providers: Utf8PathBuf,
    pub(crate) interactions: Option<Utf8PathBuf>,
    pub(crate) store: Utf8PathBuf,
    pub(crate) training: TrainingConfig,
}

impl TrainConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.providers, ARG_PROVIDERS)?;
        if let Some(path) = &self.interactions {
            require_existing(path, ARG_INTERACTIONS)?;
        }
        Ok(())
    }
}

impl TryFrom<TrainArgs> for TrainConfig {
    type Error = CliError;

    fn try_from(args: TrainArgs) -> Result<Self, Self::Error> {
        let providers = args.providers.ok_or(CliError::MissingArgument {
            field: ARG_PROVIDERS,
            env: ENV_TRAIN_PROVIDERS,
        })?;
        let defaults = TrainingConfig::default();
        let seed = args.seed.unwrap_or(defaults.seed);
        let training = TrainingConfig {
            test_fraction: args.test_fraction.unwrap_or(defaults.test_fraction),
            seed,
            forest: ForestConfig {
                trees: args.trees.unwrap_or(defaults.forest.trees),
                seed,
                ..defaults.forest
            },
            ..defaults
        }
        .validate()
        .map_err(|err| match err {
            TrainingError::InvalidConfig { name: "trees", .. } => {
                CliError::InvalidArgument {
                    field: ARG_TREES,
                    reason: "must be at least 1",
                }
            }
            TrainingError::InvalidConfig {
                name: "test_fraction",
                ..
            } => CliError::InvalidArgument {
                field: ARG_TEST_FRACTION,
                reason: "must lie strictly between 0 and 1",
            },
            other => CliError::Training(other),
        })?;
        Ok(Self {
            providers,
            interactions: args.interactions,
            store: args
                .store
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE_DIR)),
            training,
        })
    }
}

/// One provider in the training export.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProviderRecord {
    #[serde(flatten)]
    pub(crate) provider: Provider,
    /// Known reliability class, when the provider has been assessed.
    #[serde(default)]
    pub(crate) reliability: Option<ReliabilityLabel>,
}

#[derive(Debug, Serialize)]
struct TrainSummary<'a> {
    success: bool,
    generation: Generation,
    providers: usize,
    labelled: usize,
    interactions: usize,
    report: &'a TrainingReport,
}

pub(crate) fn run_train(args: TrainArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    execute_train(&config, writer)
}

pub(crate) fn execute_train(config: &TrainConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let records: Vec<ProviderRecord> = load_json(&config.providers, ARG_PROVIDERS)?;
    let interactions: Vec<Interaction> = match &config.interactions {
        Some(path) => load_json(path, ARG_INTERACTIONS)?,
        None => Vec::new(),
    };
    let providers: Vec<Provider> = records.iter().map(|record| record.provider.clone()).collect();
    let examples: Vec<TrainingExample> = records
        .iter()
        .filter_map(|record| {
            record
                .reliability
                .map(|label| TrainingExample::from_provider(&record.provider, label))
        })
        .collect();
    log::info!(
        "training on {} providers ({} labelled) and {} interactions",
        providers.len(),
        examples.len(),
        interactions.len()
    );

    let snapshot =
        RecommenderSnapshot::build(&providers, &interactions, &InteractionWeights::default());
    let trained = train(&examples, &config.training)?;
    let generation = open_store(&config.store)?.publish(&snapshot, &trained.artifact)?;

    write_json(
        writer,
        &TrainSummary {
            success: true,
            generation,
            providers: providers.len(),
            labelled: examples.len(),
            interactions: interactions.len(),
            report: &trained.report,
        },
    )
}

pub(crate) fn open_store(path: &Utf8Path) -> Result<ModelStore, CliError> {
    Ok(ModelStore::open(path)?)
}
