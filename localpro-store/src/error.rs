//! Errors raised while publishing or loading model generations.

use camino::Utf8PathBuf;
use localpro_recommender::SnapshotError;
use thiserror::Error;

use crate::{Blob, Generation};

/// Errors raised by [`ModelStore`](crate::ModelStore).
#[derive(Debug, Error)]
pub enum ModelStoreError {
    /// Creating a directory failed.
    #[error("failed to create directory {path}")]
    CreateDir {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Listing generations failed.
    #[error("failed to list generations under {path}")]
    List {
        /// Store root.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Writing a file failed.
    #[error("failed to write {path}")]
    Write {
        /// Target file.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Reading a file failed.
    #[error("failed to read {path}")]
    Read {
        /// Source file.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Moving a staged generation into place failed.
    #[error("failed to publish {path}")]
    Publish {
        /// Staging directory.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Encoding a blob failed.
    #[error("failed to encode {blob}")]
    Encode {
        /// Blob being written.
        blob: Blob,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Decoding a blob failed.
    #[error("failed to decode {path}")]
    Decode {
        /// Blob file.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The manifest could not be encoded or decoded.
    #[error("invalid manifest at {path}")]
    Manifest {
        /// Manifest file.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The requested generation does not exist.
    #[error("{generation} does not exist under {root}")]
    UnknownGeneration {
        /// Requested generation.
        generation: Generation,
        /// Store root.
        root: Utf8PathBuf,
    },
    /// The store holds no published generation.
    #[error("no model generation has been published under {root}")]
    Empty {
        /// Store root.
        root: Utf8PathBuf,
    },
    /// A generation lacks a file required by the requested load.
    #[error("{generation} is missing {file}")]
    MissingBlob {
        /// Generation being loaded.
        generation: Generation,
        /// Missing file name.
        file: &'static str,
    },
    /// The store layout was written by an incompatible release.
    #[error("{generation} uses schema version {found}, expected {expected}; retrain the models")]
    SchemaMismatch {
        /// Generation being loaded.
        generation: Generation,
        /// Version recorded in the manifest.
        found: u32,
        /// Version this release reads.
        expected: u32,
    },
    /// The classifier artifact was written by an incompatible release.
    #[error(
        "{generation} holds classifier artifacts at version {found}, expected {expected}; retrain the models"
    )]
    ArtifactSchemaMismatch {
        /// Generation being loaded.
        generation: Generation,
        /// Artifact version recorded in the manifest.
        found: u32,
        /// Artifact version this release reads.
        expected: u32,
    },
    /// The persisted matrices do not form a consistent snapshot.
    #[error("{generation} holds an inconsistent recommender snapshot")]
    Snapshot {
        /// Generation being loaded.
        generation: Generation,
        /// Source error from the recommender.
        #[source]
        source: SnapshotError,
    },
    /// The generation counter cannot advance further.
    #[error("generation numbers are exhausted under {root}")]
    GenerationOverflow {
        /// Store root.
        root: Utf8PathBuf,
    },
}
