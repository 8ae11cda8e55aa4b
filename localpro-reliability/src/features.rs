//! Fixed-order numeric features describing one provider.

use std::collections::BTreeMap;

use localpro_core::Provider;
use serde::{Deserialize, Serialize};

/// Number of classifier inputs.
pub const FEATURE_COUNT: usize = 6;

/// Input names in column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "experience_years",
    "rating",
    "total_jobs",
    "completion_rate",
    "response_time",
    "verified",
];

/// Raw, unscaled classifier inputs in [`FEATURE_NAMES`] order.
///
/// Values are taken as given: nothing is clamped or range-checked.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use localpro_reliability::FeatureVector;
///
/// let map = BTreeMap::from([("rating".to_owned(), 4.8), ("verified".to_owned(), 1.0)]);
/// let features = FeatureVector::from_map(&map);
/// assert_eq!(features.values(), &[0.0, 4.8, 0.0, 0.0, 0.0, 1.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Wrap values already in column order.
    #[must_use]
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    /// Build from named values; missing names default to zero and unknown
    /// names are ignored.
    #[must_use]
    pub fn from_map(map: &BTreeMap<String, f64>) -> Self {
        Self::from_pairs(map.iter().map(|(name, value)| (name.as_str(), *value)))
    }

    /// Build from `(name, value)` pairs; later duplicates win.
    #[must_use]
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for (name, value) in pairs {
            let slot = FEATURE_NAMES
                .iter()
                .position(|known| *known == name)
                .and_then(|column| values.get_mut(column));
            if let Some(slot) = slot {
                *slot = value;
            }
        }
        Self(values)
    }

    /// Extract features from a provider record.
    #[must_use]
    pub fn from_provider(provider: &Provider) -> Self {
        Self([
            f64::from(provider.experience_years),
            provider.rating,
            f64::from(provider.total_jobs),
            provider.completion_rate,
            provider.response_time,
            if provider.verified { 1.0 } else { 0.0 },
        ])
    }

    /// Borrow the values in column order.
    #[must_use]
    pub const fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Pair each value with its name.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}
