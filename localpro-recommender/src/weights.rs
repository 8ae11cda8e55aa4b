//! Tunable weights for interaction scoring and request-time fusion.

use localpro_core::InteractionKind;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Per-kind multipliers applied to interaction counts.
///
/// An interaction contributes `weight(kind) × count` to its user–provider
/// cell. Kinds outside the known set use [`Self::fallback`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionWeights {
    /// Weight of a profile view.
    pub view: f64,
    /// Weight of a contact request.
    pub contact: f64,
    /// Weight of a favourite.
    pub favorite: f64,
    /// Weight of a hire.
    pub hire: f64,
    /// Weight of any other kind.
    pub fallback: f64,
}

impl Default for InteractionWeights {
    fn default() -> Self {
        Self {
            view: 1.0,
            contact: 2.0,
            favorite: 3.0,
            hire: 4.0,
            fallback: 1.0,
        }
    }
}

impl InteractionWeights {
    /// Weight applied to one interaction of `kind`.
    #[must_use]
    pub const fn weight(&self, kind: &InteractionKind) -> f64 {
        match kind {
            InteractionKind::View => self.view,
            InteractionKind::Contact => self.contact,
            InteractionKind::Favorite => self.favorite,
            InteractionKind::Hire => self.hire,
            InteractionKind::Other(_) => self.fallback,
        }
    }

    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWeight`] when any weight is negative or
    /// not finite.
    pub fn validate(self) -> Result<Self, ConfigError> {
        check_weight("view", self.view)?;
        check_weight("contact", self.contact)?;
        check_weight("favorite", self.favorite)?;
        check_weight("hire", self.hire)?;
        check_weight("fallback", self.fallback)?;
        Ok(self)
    }
}

/// Weights and shaping constants for request-time fusion.
///
/// Defaults give collaborative filtering 0.4, content similarity 0.3,
/// rating 0.2, and proximity 0.1 of the blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Weight of the collaborative-filtering term.
    pub collaborative_weight: f64,
    /// Weight of the content-similarity term.
    pub content_weight: f64,
    /// Weight of the rating term.
    pub rating_weight: f64,
    /// Weight of the proximity term.
    pub proximity_weight: f64,
    /// Multiplier applied to a provider's raw rating.
    pub rating_scale: f64,
    /// Distance beyond which proximity contributes nothing.
    pub proximity_radius_km: f64,
    /// Multiplier applied to the normalised proximity.
    pub proximity_scale: f64,
    /// Number of most similar users consulted by collaborative filtering.
    pub neighbour_count: usize,
    /// Number of a user's strongest providers used to seed content
    /// similarity.
    pub history_depth: usize,
    /// Collaborative list length as a multiple of the requested count.
    pub collaborative_depth: usize,
    /// Per-seed content list length as a multiple of the requested count.
    pub content_depth: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            collaborative_weight: 0.4,
            content_weight: 0.3,
            rating_weight: 0.2,
            proximity_weight: 0.1,
            rating_scale: 20.0,
            proximity_radius_km: 10.0,
            proximity_scale: 100.0,
            neighbour_count: 5,
            history_depth: 3,
            collaborative_depth: 3,
            content_depth: 2,
        }
    }
}

impl FusionConfig {
    /// Validate the configuration and return a copy.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidWeight`] for a negative or non-finite
    /// weight or scale, and [`ConfigError::InvalidRadius`] when the proximity
    /// radius is not a positive, finite distance.
    pub fn validate(self) -> Result<Self, ConfigError> {
        check_weight("collaborative_weight", self.collaborative_weight)?;
        check_weight("content_weight", self.content_weight)?;
        check_weight("rating_weight", self.rating_weight)?;
        check_weight("proximity_weight", self.proximity_weight)?;
        check_weight("rating_scale", self.rating_scale)?;
        check_weight("proximity_scale", self.proximity_scale)?;
        if !(self.proximity_radius_km.is_finite() && self.proximity_radius_km > 0.0) {
            return Err(ConfigError::InvalidRadius {
                radius_km: self.proximity_radius_km,
            });
        }
        Ok(self)
    }
}

const fn check_weight(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidWeight { name, value })
    }
}
