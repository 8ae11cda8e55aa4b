//! `recommend` command: rank providers for one request.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use localpro_core::{Provider, coord_from_lat_lon};
use localpro_recommender::{HybridRecommender, RecommendationRequest};
use localpro_store::{Generation, ModelStore};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_json, require_existing, write_json};
use crate::train::open_store;
use crate::{
    ARG_COUNT, ARG_GENERATION, ARG_LATITUDE, ARG_LONGITUDE, ARG_PROVIDERS, ARG_SERVICE_TYPE,
    ARG_STORE, ARG_USER, CliError, DEFAULT_STORE_DIR, ENV_RECOMMEND_PROVIDERS,
};

const DEFAULT_COUNT: usize = 10;

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank the providers in a JSON export for one user using the \
                 recommender matrices of a published generation. Without a \
                 published generation the ranking falls back to ratings.",
    about = "Recommend providers for a user"
)]
#[ortho_config(prefix = "LOCALPRO")]
pub(crate) struct RecommendArgs {
    /// JSON array of candidate providers.
    #[arg(long = ARG_PROVIDERS, value_name = "path")]
    #[serde(default)]
    pub(crate) providers: Option<Utf8PathBuf>,
    /// Model store directory.
    #[arg(long = ARG_STORE, value_name = "dir")]
    #[serde(default)]
    pub(crate) store: Option<Utf8PathBuf>,
    /// Generation to load; defaults to the newest.
    #[arg(long = ARG_GENERATION, value_name = "number")]
    #[serde(default)]
    pub(crate) generation: Option<u64>,
    /// Requesting user.
    #[arg(long = ARG_USER, value_name = "id")]
    #[serde(default)]
    pub(crate) user: Option<u64>,
    /// Requesting user's latitude.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Requesting user's longitude.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Only rank providers offering this service.
    #[arg(long = ARG_SERVICE_TYPE, value_name = "name")]
    #[serde(default)]
    pub(crate) service_type: Option<String>,
    /// Number of providers to return.
    #[arg(long = ARG_COUNT, value_name = "n")]
    #[serde(default)]
    pub(crate) count: Option<usize>,
}

impl RecommendArgs {
    pub(crate) fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecommendConfig {
    pub(crate) providers: Utf8PathBuf,
    pub(crate) store: Utf8PathBuf,
    pub(crate) generation: Option<Generation>,
    pub(crate) request: RecommendationRequest,
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let providers = args.providers.ok_or(CliError::MissingArgument {
            field: ARG_PROVIDERS,
            env: ENV_RECOMMEND_PROVIDERS,
        })?;
        let count = args.count.unwrap_or(DEFAULT_COUNT);
        if count == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_COUNT,
                reason: "must be at least 1",
            });
        }
        let mut request = RecommendationRequest::new(count);
        if let Some(user) = args.user {
            request = request.with_user(user);
        }
        if let Some(location) = location(args.lat, args.lon)? {
            request = request.with_location(location);
        }
        if let Some(service_type) = args.service_type {
            request = request.with_service_type(service_type);
        }
        Ok(Self {
            providers,
            store: args
                .store
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE_DIR)),
            generation: args.generation.map(Generation::new),
            request,
        })
    }
}

fn location(lat: Option<f64>, lon: Option<f64>) -> Result<Option<Coord<f64>>, CliError> {
    match (lat, lon) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(CliError::InvalidArgument {
                    field: ARG_LATITUDE,
                    reason: "must lie between -90 and 90",
                });
            }
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(CliError::InvalidArgument {
                    field: ARG_LONGITUDE,
                    reason: "must lie between -180 and 180",
                });
            }
            Ok(Some(coord_from_lat_lon(latitude, longitude)))
        }
        (Some(_), None) => Err(CliError::InvalidArgument {
            field: ARG_LONGITUDE,
            reason: "is required together with --lat",
        }),
        (None, Some(_)) => Err(CliError::InvalidArgument {
            field: ARG_LATITUDE,
            reason: "is required together with --lon",
        }),
    }
}

#[derive(Debug, Serialize)]
struct RecommendOutput<'a> {
    success: bool,
    count: usize,
    recommendations: &'a [Provider],
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation: Option<Generation>,
}

pub(crate) fn run_recommend(args: RecommendArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.providers, ARG_PROVIDERS)?;
    execute_recommend(&config, writer)
}

pub(crate) fn execute_recommend(
    config: &RecommendConfig,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let providers: Vec<Provider> = load_json(&config.providers, ARG_PROVIDERS)?;
    let store = open_store(&config.store)?;
    let recommender = HybridRecommender::default();
    let generation = install_snapshot(&store, config.generation, &recommender)?;

    let recommendation = recommender.recommend(&config.request, &providers);
    let ranked = recommendation.providers();
    write_json(
        writer,
        &RecommendOutput {
            success: true,
            count: ranked.len(),
            recommendations: ranked,
            note: recommendation.note(),
            generation,
        },
    )
}

/// Install the requested or newest generation; an empty store leaves the
/// recommender uninitialised so requests fall back to ratings.
fn install_snapshot(
    store: &ModelStore,
    requested: Option<Generation>,
    recommender: &HybridRecommender,
) -> Result<Option<Generation>, CliError> {
    let Some(generation) = requested.map_or_else(|| store.latest(), |value| Ok(Some(value)))?
    else {
        log::warn!("no model generation under {}; ranking by rating", store.root());
        return Ok(None);
    };
    recommender.install(store.load_recommender(generation)?);
    Ok(Some(generation))
}
