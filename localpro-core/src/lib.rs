//! Core domain types for the LocalPro scoring engine.
//!
//! The records here are plain values supplied by the marketplace: service
//! providers, user interactions, and reliability labels. Scoring crates read
//! them but never mutate them during a pass.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod distance;
pub mod interaction;
pub mod provider;
pub mod reliability;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use distance::{EARTH_RADIUS_KM, coord_from_lat_lon, haversine_km};
pub use interaction::{Interaction, InteractionKind, InteractionLog};
pub use provider::Provider;
pub use reliability::{ReliabilityLabel, UnknownLabelError};
