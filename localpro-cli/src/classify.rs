//! `classify` command: predict one provider's reliability.

use std::collections::BTreeMap;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use localpro_reliability::{ModelChoice, ReliabilityClassifier, ReliabilityPrediction};
use localpro_store::{Generation, ModelStore, ModelStoreError};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_json, require_existing, write_json};
use crate::train::open_store;
use crate::{
    ARG_FEATURES, ARG_GENERATION, ARG_MODEL, ARG_STORE, CliError, DEFAULT_STORE_DIR,
    ENV_CLASSIFY_FEATURES,
};

/// CLI arguments for the `classify` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Predict the reliability class of one provider from a JSON \
                 object of named features (experience_years, rating, \
                 total_jobs, completion_rate, response_time, verified). \
                 Missing features count as zero.",
    about = "Classify a provider's reliability"
)]
#[ortho_config(prefix = "LOCALPRO")]
pub(crate) struct ClassifyArgs {
    /// JSON object mapping feature names to values.
    #[arg(long = ARG_FEATURES, value_name = "path")]
    #[serde(default)]
    pub(crate) features: Option<Utf8PathBuf>,
    /// Model store directory.
    #[arg(long = ARG_STORE, value_name = "dir")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Generation to load; defaults to the newest.
    #[arg(long = ARG_GENERATION, value_name = "number")]
    #[serde(default)]
    pub(crate) generation: Option<u64>,
    /// Model answering the request: `rf` (default) or `lr`.
    #[arg(long = ARG_MODEL, value_name = "name")]
    #[serde(default)]
    pub(crate) model: Option<String>,
}

impl ClassifyArgs {
    pub(crate) fn into_config(self) -> Result<ClassifyConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ClassifyConfig::try_from(merged)
    }
}

/// Resolved `classify` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClassifyConfig {
    pub(crate) features: Utf8PathBuf,
    pub(crate) store: Utf8PathBuf,
    pub(crate) generation: Option<Generation>,
    pub(crate) model: ModelChoice,
}

impl TryFrom<ClassifyArgs> for ClassifyConfig {
    type Error = CliError;

    fn try_from(args: ClassifyArgs) -> Result<Self, Self::Error> {
        let features = args.features.ok_or(CliError::MissingArgument {
            field: ARG_FEATURES,
            env: ENV_CLASSIFY_FEATURES,
        })?;
        let model = match args.model {
            Some(name) => name.parse()?,
            None => ModelChoice::default(),
        };
        Ok(Self {
            features,
            store: args
                .store
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE_DIR)),
            generation: args.generation.map(Generation::new),
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct ClassifyOutput<'a> {
    success: bool,
    generation: Generation,
    #[serde(flatten)]
    prediction: &'a ReliabilityPrediction,
}

pub(crate) fn run_classify(args: ClassifyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.features, ARG_FEATURES)?;
    execute_classify(&config, writer)
}

pub(crate) fn execute_classify(
    config: &ClassifyConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let features: BTreeMap<String, f64> = load_json(&config.features, ARG_FEATURES)?;
    let store = open_store(&config.store)?;
    let generation = resolve_generation(&store, config.generation)?;

    let classifier = ReliabilityClassifier::new();
    classifier.install(store.load_classifier(generation)?);
    let prediction = classifier.predict(&features, config.model)?;
    log::info!(
        "{} classified provider as {} ({:.3})",
        prediction.model,
        prediction.label,
        prediction.confidence
    );
    write_json(
        writer,
        &ClassifyOutput {
            success: true,
            generation,
            prediction: &prediction,
        },
    )
}

fn resolve_generation(
    store: &ModelStore,
    requested: Option<Generation>,
) -> Result<Generation, CliError> {
    if let Some(generation) = requested {
        return Ok(generation);
    }
    store
        .latest()?
        .ok_or_else(|| {
            CliError::Store(ModelStoreError::Empty {
                root: store.root().to_path_buf(),
            })
        })
}
