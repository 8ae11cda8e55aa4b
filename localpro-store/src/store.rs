//! Publishing and loading model generations.

use std::io;

use bincode::Options;
use camino::{Utf8Path, Utf8PathBuf};
use localpro_fs::{
    ensure_dir, file_is_file, list_subdirectories, path_is_dir, read_file,
    remove_dir_all_if_present, rename_sibling, write_file,
};
use localpro_recommender::RecommenderSnapshot;
use localpro_reliability::{
    ARTIFACT_SCHEMA_VERSION, ClassifierArtifact, LogisticRegression, RandomForest, StandardScaler,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{
    Blob, Generation, MANIFEST_FILE, Manifest, ModelStoreError, STORE_SCHEMA_VERSION,
    bincode_options,
};

/// Both halves of one published generation.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModels {
    /// Generation the models came from.
    pub generation: Generation,
    /// Recommender matrices.
    pub snapshot: RecommenderSnapshot,
    /// Reliability models.
    pub artifact: ClassifierArtifact,
}

/// Directory of numbered model generations.
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: Utf8PathBuf,
}

impl ModelStore {
    /// Open the store at `root`, creating the directory when missing.
    ///
    /// # Errors
    /// Returns [`ModelStoreError::CreateDir`] when the directory cannot be
    /// created.
    pub fn open(root: &Utf8Path) -> Result<Self, ModelStoreError> {
        ensure_dir(root).map_err(|source| ModelStoreError::CreateDir {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Directory holding `generation`.
    #[must_use]
    pub fn generation_dir(&self, generation: Generation) -> Utf8PathBuf {
        self.root.join(generation.dir_name())
    }

    /// Published generations in ascending order. Staging directories and
    /// unrelated entries are ignored.
    ///
    /// # Errors
    /// Returns [`ModelStoreError::List`] when the root cannot be read.
    pub fn generations(&self) -> Result<Vec<Generation>, ModelStoreError> {
        let names = list_subdirectories(&self.root).map_err(|source| ModelStoreError::List {
            path: self.root.clone(),
            source,
        })?;
        let mut generations: Vec<Generation> = names
            .iter()
            .filter_map(|name| {
                name.parse::<Generation>()
                    .ok()
                    .filter(|generation| generation.dir_name() == *name)
            })
            .collect();
        generations.sort_unstable();
        Ok(generations)
    }

    /// Most recent published generation, if any.
    ///
    /// # Errors
    /// Propagates [`ModelStoreError::List`].
    pub fn latest(&self) -> Result<Option<Generation>, ModelStoreError> {
        Ok(self.generations()?.last().copied())
    }

    /// Write `snapshot` and `artifact` as a new generation.
    ///
    /// Files are staged in `generation-NNNNNN.partial` and the directory is
    /// renamed into place after the manifest is written.
    ///
    /// # Errors
    /// Returns [`ModelStoreError`] when encoding or any filesystem step
    /// fails. A failed publish leaves no visible generation behind.
    pub fn publish(
        &self,
        snapshot: &RecommenderSnapshot,
        artifact: &ClassifierArtifact,
    ) -> Result<Generation, ModelStoreError> {
        let generation = match self.latest()? {
            Some(previous) => previous
                .next()
                .ok_or_else(|| ModelStoreError::GenerationOverflow {
                    root: self.root.clone(),
                })?,
            None => Generation::FIRST,
        };
        let staging = self.root.join(generation.staging_dir_name());
        remove_dir_all_if_present(&staging).map_err(|source| ModelStoreError::CreateDir {
            path: staging.clone(),
            source,
        })?;
        ensure_dir(&staging).map_err(|source| ModelStoreError::CreateDir {
            path: staging.clone(),
            source,
        })?;

        let written = write_blobs(&staging, snapshot, artifact).and_then(|()| {
            let manifest = Manifest {
                schema_version: STORE_SCHEMA_VERSION,
                generation,
                artifact_schema_version: artifact.schema_version,
                blobs: Blob::ALL
                    .iter()
                    .map(|blob| blob.file_name().to_owned())
                    .collect(),
                providers: snapshot.features().len(),
                users: snapshot.interactions().user_count(),
            };
            write_manifest(&staging.join(MANIFEST_FILE), &manifest)
        });
        if let Err(err) = written {
            if let Err(cleanup) = remove_dir_all_if_present(&staging) {
                log::warn!("failed to remove staging directory {staging}: {cleanup}");
            }
            return Err(err);
        }

        let target = self.generation_dir(generation);
        rename_sibling(&staging, &target).map_err(|source| ModelStoreError::Publish {
            path: staging.clone(),
            source,
        })?;
        log::info!("published {generation} to {target}");
        Ok(generation)
    }

    /// Read and validate the manifest of `generation`.
    ///
    /// # Errors
    /// Returns [`ModelStoreError::UnknownGeneration`] for a missing
    /// directory, [`ModelStoreError::MissingBlob`] for a missing manifest,
    /// [`ModelStoreError::SchemaMismatch`] for an incompatible layout, and
    /// [`ModelStoreError::ArtifactSchemaMismatch`] for incompatible
    /// classifier artifacts.
    pub fn manifest(&self, generation: Generation) -> Result<Manifest, ModelStoreError> {
        let dir = self.generation_dir(generation);
        if !exists(path_is_dir(&dir), &dir)? {
            return Err(ModelStoreError::UnknownGeneration {
                generation,
                root: self.root.clone(),
            });
        }
        let path = dir.join(MANIFEST_FILE);
        if !exists(file_is_file(&path), &path)? {
            return Err(ModelStoreError::MissingBlob {
                generation,
                file: MANIFEST_FILE,
            });
        }
        let bytes = read_file(&path).map_err(|source| ModelStoreError::Read {
            path: path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|source| ModelStoreError::Manifest {
                path: path.clone(),
                source,
            })?;
        if manifest.schema_version != STORE_SCHEMA_VERSION {
            return Err(ModelStoreError::SchemaMismatch {
                generation,
                found: manifest.schema_version,
                expected: STORE_SCHEMA_VERSION,
            });
        }
        if manifest.artifact_schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ModelStoreError::ArtifactSchemaMismatch {
                generation,
                found: manifest.artifact_schema_version,
                expected: ARTIFACT_SCHEMA_VERSION,
            });
        }
        Ok(manifest)
    }

    /// Load both halves of `generation`.
    ///
    /// # Errors
    /// Returns [`ModelStoreError`] when the generation is absent,
    /// incompatible, incomplete, or corrupt.
    pub fn load(&self, generation: Generation) -> Result<LoadedModels, ModelStoreError> {
        let snapshot = self.load_recommender(generation)?;
        let artifact = self.load_classifier(generation)?;
        log::info!("loaded {generation} from {}", self.root);
        Ok(LoadedModels {
            generation,
            snapshot,
            artifact,
        })
    }

    /// Load the newest generation.
    ///
    /// # Errors
    /// Returns [`ModelStoreError::Empty`] when nothing has been published,
    /// otherwise as [`Self::load`].
    pub fn load_latest(&self) -> Result<LoadedModels, ModelStoreError> {
        let generation = self.latest()?.ok_or_else(|| ModelStoreError::Empty {
            root: self.root.clone(),
        })?;
        self.load(generation)
    }

    /// Load only the recommender matrices of `generation`.
    ///
    /// # Errors
    /// As [`Self::load`], restricted to the recommender blobs.
    pub fn load_recommender(
        &self,
        generation: Generation,
    ) -> Result<RecommenderSnapshot, ModelStoreError> {
        self.manifest(generation)?;
        let dir = self.generation_dir(generation);
        require_blobs(&dir, generation, &Blob::RECOMMENDER)?;
        RecommenderSnapshot::from_parts(
            read_blob(&dir, Blob::InteractionMatrix)?,
            read_blob(&dir, Blob::FeatureMatrix)?,
            read_blob(&dir, Blob::SimilarityMatrix)?,
        )
        .map_err(|source| ModelStoreError::Snapshot { generation, source })
    }

    /// Load only the reliability models of `generation`.
    ///
    /// # Errors
    /// As [`Self::load`], restricted to the classifier blobs.
    pub fn load_classifier(
        &self,
        generation: Generation,
    ) -> Result<ClassifierArtifact, ModelStoreError> {
        let manifest = self.manifest(generation)?;
        let dir = self.generation_dir(generation);
        require_blobs(&dir, generation, &Blob::CLASSIFIER)?;
        let forest: RandomForest = read_blob(&dir, Blob::TreeModel)?;
        let linear: LogisticRegression = read_blob(&dir, Blob::LinearModel)?;
        let scaler: StandardScaler = read_blob(&dir, Blob::FeatureScaler)?;
        Ok(ClassifierArtifact {
            schema_version: manifest.artifact_schema_version,
            scaler,
            forest,
            linear,
        })
    }
}

/// Map a "does this exist" check so that a missing path reads as `false`.
fn exists(check: io::Result<bool>, path: &Utf8Path) -> Result<bool, ModelStoreError> {
    match check {
        Ok(found) => Ok(found),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ModelStoreError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn require_blobs(
    dir: &Utf8Path,
    generation: Generation,
    blobs: &[Blob],
) -> Result<(), ModelStoreError> {
    for blob in blobs {
        let path = dir.join(blob.file_name());
        if !exists(file_is_file(&path), &path)? {
            return Err(ModelStoreError::MissingBlob {
                generation,
                file: blob.file_name(),
            });
        }
    }
    Ok(())
}

fn write_blobs(
    dir: &Utf8Path,
    snapshot: &RecommenderSnapshot,
    artifact: &ClassifierArtifact,
) -> Result<(), ModelStoreError> {
    write_blob(dir, Blob::TreeModel, &artifact.forest)?;
    write_blob(dir, Blob::LinearModel, &artifact.linear)?;
    write_blob(dir, Blob::FeatureScaler, &artifact.scaler)?;
    write_blob(dir, Blob::InteractionMatrix, snapshot.interactions())?;
    write_blob(dir, Blob::FeatureMatrix, snapshot.features())?;
    write_blob(dir, Blob::SimilarityMatrix, snapshot.similarity())
}

fn write_blob<T: Serialize + ?Sized>(
    dir: &Utf8Path,
    blob: Blob,
    value: &T,
) -> Result<(), ModelStoreError> {
    let bytes = bincode_options()
        .serialize(value)
        .map_err(|source| ModelStoreError::Encode { blob, source })?;
    let path = dir.join(blob.file_name());
    write_file(&path, &bytes).map_err(|source| ModelStoreError::Write { path, source })
}

fn read_blob<T: DeserializeOwned>(dir: &Utf8Path, blob: Blob) -> Result<T, ModelStoreError> {
    let path = dir.join(blob.file_name());
    let bytes = read_file(&path).map_err(|source| ModelStoreError::Read {
        path: path.clone(),
        source,
    })?;
    bincode_options()
        .deserialize(&bytes)
        .map_err(|source| ModelStoreError::Decode { path, source })
}

fn write_manifest(path: &Utf8Path, manifest: &Manifest) -> Result<(), ModelStoreError> {
    let bytes =
        serde_json::to_vec_pretty(manifest).map_err(|source| ModelStoreError::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
    write_file(path, &bytes).map_err(|source| ModelStoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use localpro_core::test_support::{synthetic_interactions, synthetic_providers};
    use localpro_core::Provider;
    use localpro_recommender::InteractionWeights;
    use localpro_reliability::{ForestConfig, TrainingConfig, TrainingExample, train};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn workspace() -> (TempDir, ModelStore) {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().join("models")).expect("utf-8 tempdir");
        let store = ModelStore::open(&root).expect("open store");
        (tmp, store)
    }

    #[fixture]
    fn models() -> (RecommenderSnapshot, ClassifierArtifact) {
        let labelled = synthetic_providers(5, 60);
        let providers: Vec<Provider> = labelled.iter().map(|(provider, _)| provider.clone()).collect();
        let users: Vec<u64> = (1..=12).collect();
        let provider_ids: Vec<u64> = providers.iter().map(|provider| provider.id).collect();
        let interactions = synthetic_interactions(5, &users, &provider_ids, 40);
        let snapshot =
            RecommenderSnapshot::build(&providers, &interactions, &InteractionWeights::default());
        let examples: Vec<TrainingExample> = labelled
            .iter()
            .map(|(provider, label)| TrainingExample::from_provider(provider, *label))
            .collect();
        let config = TrainingConfig {
            forest: ForestConfig {
                trees: 8,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        };
        let artifact = train(&examples, &config).expect("train").artifact;
        (snapshot, artifact)
    }

    #[rstest]
    fn publishes_sequential_generations(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        assert_eq!(store.latest().expect("latest"), None);
        let first = store.publish(&snapshot, &artifact).expect("first publish");
        let second = store.publish(&snapshot, &artifact).expect("second publish");
        assert_eq!(first, Generation::FIRST);
        assert_eq!(second, Generation::new(2));
        assert_eq!(store.generations().expect("list"), vec![first, second]);
        let dir = store.generation_dir(second);
        for blob in Blob::ALL {
            assert!(file_is_file(&dir.join(blob.file_name())).expect("blob written"));
        }
        assert!(!path_is_dir(&store.root().join(second.staging_dir_name())).unwrap_or(false));
    }

    #[rstest]
    fn loads_what_was_published(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        let generation = store.publish(&snapshot, &artifact).expect("publish");
        let loaded = store.load_latest().expect("load");
        assert_eq!(loaded.generation, generation);
        assert_eq!(loaded.snapshot, snapshot);
        assert_eq!(loaded.artifact, artifact);
        let manifest = store.manifest(generation).expect("manifest");
        assert_eq!(manifest.providers, snapshot.features().len());
        assert!(Blob::ALL.into_iter().all(|blob| manifest.lists(blob)));
    }

    #[rstest]
    fn empty_store_has_nothing_to_load(workspace: (TempDir, ModelStore)) {
        let (_tmp, store) = workspace;
        assert!(matches!(
            store.load_latest(),
            Err(ModelStoreError::Empty { .. })
        ));
        assert!(matches!(
            store.load(Generation::new(3)),
            Err(ModelStoreError::UnknownGeneration { .. })
        ));
    }

    #[rstest]
    fn missing_blob_is_reported(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        let generation = store.publish(&snapshot, &artifact).expect("publish");
        let blob = store
            .generation_dir(generation)
            .join(Blob::SimilarityMatrix.file_name());
        std::fs::remove_file(blob.as_std_path()).expect("remove blob");

        let err = store.load_recommender(generation).expect_err("blob is gone");
        assert!(matches!(
            err,
            ModelStoreError::MissingBlob { file: "similarity_matrix.bin", .. }
        ));
        store
            .load_classifier(generation)
            .expect("classifier blobs are intact");
    }

    #[rstest]
    fn schema_mismatch_requires_retraining(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        let generation = store.publish(&snapshot, &artifact).expect("publish");
        let path = store.generation_dir(generation).join(MANIFEST_FILE);
        let mut manifest = store.manifest(generation).expect("manifest");
        manifest.schema_version = STORE_SCHEMA_VERSION + 1;
        write_manifest(&path, &manifest).expect("rewrite manifest");

        let err = store.load(generation).expect_err("schema differs");
        assert!(matches!(
            err,
            ModelStoreError::SchemaMismatch { found, expected, .. }
                if found == STORE_SCHEMA_VERSION + 1 && expected == STORE_SCHEMA_VERSION
        ));
    }

    #[rstest]
    fn artifact_version_mismatch_is_reported_as_such(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        let generation = store.publish(&snapshot, &artifact).expect("publish");
        let path = store.generation_dir(generation).join(MANIFEST_FILE);
        let mut manifest = store.manifest(generation).expect("manifest");
        manifest.artifact_schema_version = ARTIFACT_SCHEMA_VERSION + 7;
        write_manifest(&path, &manifest).expect("rewrite manifest");

        let err = store.load_classifier(generation).expect_err("artifact version differs");
        assert!(
            matches!(
                err,
                ModelStoreError::ArtifactSchemaMismatch { found, expected, .. }
                    if found == ARTIFACT_SCHEMA_VERSION + 7 && expected == ARTIFACT_SCHEMA_VERSION
            ),
            "found {err:?}"
        );
        assert!(err.to_string().contains("classifier artifacts at version 8"));
    }

    #[rstest]
    fn staging_directories_are_not_generations(
        workspace: (TempDir, ModelStore),
        models: (RecommenderSnapshot, ClassifierArtifact),
    ) {
        let (_tmp, store) = workspace;
        let (snapshot, artifact) = models;
        ensure_dir(&store.root().join("generation-000001.partial")).expect("stale staging dir");
        ensure_dir(&store.root().join("scratch")).expect("unrelated dir");
        assert!(store.generations().expect("list").is_empty());
        let generation = store.publish(&snapshot, &artifact).expect("publish");
        assert_eq!(generation, Generation::FIRST);
        assert_eq!(store.generations().expect("list"), vec![Generation::FIRST]);
    }
}
