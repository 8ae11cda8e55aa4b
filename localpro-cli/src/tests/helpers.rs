//! Test helpers writing marketplace exports and running commands in-process.

use super::*;
use crate::classify::{ClassifyConfig, execute_classify};
use crate::recommend::{RecommendConfig, execute_recommend};
use crate::train::{TrainConfig, execute_train};
use camino::{Utf8Path, Utf8PathBuf};
use localpro_core::test_support::{synthetic_interactions, synthetic_providers};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

/// Temporary directory holding exports and a model store.
#[derive(Debug)]
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root =
            Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace path");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn store(&self) -> Utf8PathBuf {
        self.path("models")
    }

    /// Write `count` labelled providers and return the export path.
    pub(super) fn write_providers(&self, count: usize) -> Utf8PathBuf {
        let records: Vec<Value> = synthetic_providers(7, count)
            .into_iter()
            .map(|(provider, label)| {
                let mut record = serde_json::to_value(&provider).expect("serialise provider");
                if let Value::Object(fields) = &mut record {
                    fields.insert("reliability".to_owned(), json!(label));
                }
                record
            })
            .collect();
        self.write_json("providers.json", &Value::Array(records))
    }

    /// Write interactions between ten users and the first `providers` ids.
    pub(super) fn write_interactions(&self, providers: u64) -> Utf8PathBuf {
        let users: Vec<u64> = (100..110).collect();
        let provider_ids: Vec<u64> = (1..=providers).collect();
        let interactions = synthetic_interactions(11, &users, &provider_ids, 200);
        let value = serde_json::to_value(&interactions).expect("serialise interactions");
        self.write_json("interactions.json", &value)
    }

    pub(super) fn write_features(&self, features: &BTreeMap<&str, f64>) -> Utf8PathBuf {
        let value = serde_json::to_value(features).expect("serialise features");
        self.write_json("features.json", &value)
    }

    pub(super) fn write_json(&self, name: &str, value: &Value) -> Utf8PathBuf {
        let payload = serde_json::to_vec_pretty(value).expect("serialise json");
        self.write_raw(name, &payload)
    }

    /// Write `payload` verbatim, for exports typed out by hand.
    pub(super) fn write_raw(&self, name: &str, payload: impl AsRef<[u8]>) -> Utf8PathBuf {
        let path = self.path(name);
        fs::write(&path, payload).expect("write fixture");
        path
    }
}

pub(super) fn train_config(providers: &Utf8Path, store: &Utf8Path) -> TrainConfig {
    TrainConfig::try_from(TrainArgs {
        providers: Some(providers.to_path_buf()),
        store: Some(store.to_path_buf()),
        trees: Some(10),
        ..TrainArgs::default()
    })
    .expect("valid train arguments")
}

/// Run one command and decode the JSON it printed.
pub(super) fn capture(
    run: impl FnOnce(&mut dyn std::io::Write) -> Result<(), CliError>,
) -> Result<Value, CliError> {
    let mut buffer = Vec::new();
    run(&mut buffer)?;
    Ok(serde_json::from_slice(&buffer).expect("command output is JSON"))
}

pub(super) fn train(config: &TrainConfig) -> Result<Value, CliError> {
    capture(|writer| execute_train(config, writer))
}

pub(super) fn recommend(config: &RecommendConfig) -> Result<Value, CliError> {
    capture(|writer| execute_recommend(config, writer))
}

pub(super) fn classify(config: &ClassifyConfig) -> Result<Value, CliError> {
    capture(|writer| execute_classify(config, writer))
}

/// Features describing a dependable provider.
pub(super) fn strong_features() -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
        ("experience_years", 15.0),
        ("rating", 4.9),
        ("total_jobs", 300.0),
        ("completion_rate", 0.98),
        ("response_time", 1.0),
        ("verified", 1.0),
    ])
}
