//! Command-line interface for LocalPro's offline model tooling.
//!
//! `localpro train` fits the recommender matrices and reliability models
//! from JSON exports and publishes them as a new store generation.
//! `localpro recommend` and `localpro classify` load a generation and answer
//! one request, printing JSON to stdout. Every option can also come from a
//! configuration file or `LOCALPRO_`-prefixed environment variables.
#![forbid(unsafe_code)]

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod classify;
mod error;
mod input;
mod recommend;
mod train;

pub use error::CliError;

use classify::ClassifyArgs;
use recommend::RecommendArgs;
use train::TrainArgs;

pub(crate) const ARG_PROVIDERS: &str = "providers";
pub(crate) const ARG_INTERACTIONS: &str = "interactions";
pub(crate) const ARG_STORE: &str = "store";
pub(crate) const ARG_GENERATION: &str = "generation";
pub(crate) const ARG_TREES: &str = "trees";
pub(crate) const ARG_SEED: &str = "seed";
pub(crate) const ARG_TEST_FRACTION: &str = "test-fraction";
pub(crate) const ARG_USER: &str = "user";
pub(crate) const ARG_LATITUDE: &str = "lat";
pub(crate) const ARG_LONGITUDE: &str = "lon";
pub(crate) const ARG_SERVICE_TYPE: &str = "service-type";
pub(crate) const ARG_COUNT: &str = "count";
pub(crate) const ARG_FEATURES: &str = "features";
pub(crate) const ARG_MODEL: &str = "model";
pub(crate) const ENV_TRAIN_PROVIDERS: &str = "LOCALPRO_CMDS_TRAIN_PROVIDERS";
pub(crate) const ENV_RECOMMEND_PROVIDERS: &str = "LOCALPRO_CMDS_RECOMMEND_PROVIDERS";
pub(crate) const ENV_CLASSIFY_FEATURES: &str = "LOCALPRO_CMDS_CLASSIFY_FEATURES";

/// Store directory used when none is configured.
pub(crate) const DEFAULT_STORE_DIR: &str = "models";

const LOG_ENV: &str = "LOCALPRO_LOG";

/// Install a stderr formatter for `log` records.
///
/// The filter comes from `LOCALPRO_LOG`, then `RUST_LOG`, then defaults to
/// `info`. Calling this twice leaves the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = installed {
        log::debug!("logging already initialised: {err}");
    }
}

/// Run the LocalPro CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration, inputs, or the model
/// store are unusable.
pub fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return err.print().map_err(CliError::WriteOutput);
        }
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Command::Train(args) => train::run_train(args, &mut stdout),
        Command::Recommend(args) => recommend::run_recommend(args, &mut stdout),
        Command::Classify(args) => classify::run_classify(args, &mut stdout),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "localpro",
    about = "Train and query LocalPro recommendation and reliability models",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit models from provider and interaction exports and publish them.
    Train(TrainArgs),
    /// Rank providers for one request using a published generation.
    Recommend(RecommendArgs),
    /// Predict one provider's reliability using a published generation.
    Classify(ClassifyArgs),
}

#[cfg(test)]
mod tests;
