//! Per-column standardisation fitted on a training batch.

use serde::{Deserialize, Serialize};

use crate::{FEATURE_COUNT, FeatureVector};

/// Subtracts each column's mean and divides by its population standard
/// deviation. Constant columns keep a scale of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self {
            mean: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        }
    }
}

impl StandardScaler {
    /// Fit column statistics on `rows`. An empty batch yields the identity
    /// transform.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        reason = "column means and variances"
    )]
    pub fn fit(rows: &[FeatureVector]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let count = rows.len() as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (total, value) in mean.iter_mut().zip(row.values()) {
                *total += value;
            }
        }
        for total in &mut mean {
            *total /= count;
        }
        let mut variance = [0.0; FEATURE_COUNT];
        for row in rows {
            for ((total, value), centre) in variance.iter_mut().zip(row.values()).zip(&mean) {
                *total += (value - centre).powi(2);
            }
        }
        let scale = variance.map(|total| {
            let deviation = (total / count).sqrt();
            if deviation > 0.0 { deviation } else { 1.0 }
        });
        Self { mean, scale }
    }

    /// Standardise one row.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "standardisation")]
    pub fn transform(&self, row: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut scaled = *row.values();
        for ((value, centre), scale) in scaled.iter_mut().zip(&self.mean).zip(&self.scale) {
            *value = (*value - centre) / scale;
        }
        scaled
    }

    /// Column means.
    #[must_use]
    pub const fn mean(&self) -> &[f64; FEATURE_COUNT] {
        &self.mean
    }

    /// Column scales.
    #[must_use]
    pub const fn scale(&self) -> &[f64; FEATURE_COUNT] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn standardises_columns() {
        let rows = [
            FeatureVector::new([1.0, 2.0, 5.0, 0.0, 0.0, 1.0]),
            FeatureVector::new([3.0, 2.0, 5.0, 0.0, 0.0, 1.0]),
        ];
        let scaler = StandardScaler::fit(&rows);
        assert_eq!(scaler.mean(), &[2.0, 2.0, 5.0, 0.0, 0.0, 1.0]);
        assert_eq!(scaler.scale(), &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let scaled = scaler.transform(rows.first().expect("first row"));
        assert_eq!(scaled, [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[rstest]
    fn empty_batch_is_identity() {
        let scaler = StandardScaler::fit(&[]);
        let row = FeatureVector::new([4.0, 1.0, 0.0, 2.0, 3.0, 0.0]);
        assert_eq!(&scaler.transform(&row), row.values());
    }
}
