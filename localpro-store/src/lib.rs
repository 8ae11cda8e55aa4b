//! Versioned on-disk storage for trained LocalPro models.
//!
//! Each training run is published as a numbered generation directory under
//! the store root:
//!
//! ```text
//! models/
//! └── generation-000001/
//!     ├── manifest.json
//!     ├── tree_model.bin
//!     ├── linear_model.bin
//!     ├── feature_scaler.bin
//!     ├── interaction_matrix.bin
//!     ├── feature_matrix.bin
//!     └── similarity_matrix.bin
//! ```
//!
//! Blobs are `bincode` encoded; the manifest is JSON. A generation is staged
//! in a `.partial` sibling and renamed into place once every file is written,
//! so readers never observe a half-written generation.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use localpro_store::ModelStore;
//!
//! let store = ModelStore::open(Utf8Path::new("models")).expect("open store");
//! let loaded = store.load_latest().expect("load newest generation");
//! println!("serving {}", loaded.generation);
//! ```

#![forbid(unsafe_code)]

mod error;
mod layout;
mod store;

pub use error::ModelStoreError;
pub use layout::{Blob, Generation, MANIFEST_FILE, Manifest, STORE_SCHEMA_VERSION};
pub use store::{LoadedModels, ModelStore};

/// Bincode options used for every blob.
pub(crate) fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}
