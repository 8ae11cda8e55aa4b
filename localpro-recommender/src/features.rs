//! Normalised provider feature rows and their pairwise cosine similarity.

use std::collections::{BTreeMap, BTreeSet};

use localpro_core::Provider;
use serde::{Deserialize, Serialize};

use crate::SnapshotError;
use crate::similarity::{cosine_dense, norm};

/// Numeric columns appended after the service-type one-hot block:
/// rating, experience, completion, responsiveness, and verification.
pub const NUMERIC_FEATURE_COUNT: usize = 5;

const MAX_RATING: f64 = 5.0;
const EXPERIENCE_CAP_YEARS: f64 = 20.0;
const RESPONSE_CAP_HOURS: f64 = 24.0;

/// One feature row per provider.
///
/// Each row is `[one-hot(service_type) ‖ rating/5 ‖
/// min(experience/20, 1) ‖ completion_rate ‖ 1 − min(response/24, 1) ‖
/// verified]`. The one-hot columns follow the sorted set of service types
/// seen in the batch; rows follow input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderFeatureMatrix {
    service_types: Vec<String>,
    provider_ids: Vec<u64>,
    rows: Vec<Vec<f64>>,
    index: BTreeMap<u64, usize>,
}

impl ProviderFeatureMatrix {
    /// Encode `providers` and compute their similarity matrix.
    ///
    /// A repeated provider id keeps its first occurrence.
    ///
    /// # Examples
    /// ```
    /// use localpro_core::Provider;
    /// use localpro_recommender::ProviderFeatureMatrix;
    ///
    /// let providers = [
    ///     Provider::new(1, "Tutor").with_rating(5.0),
    ///     Provider::new(2, "Driver").with_rating(2.5),
    /// ];
    /// let (features, similarity) = ProviderFeatureMatrix::build(&providers);
    /// assert_eq!(features.service_types(), ["Driver", "Tutor"]);
    /// assert_eq!(features.row(1).map(<[f64]>::len), Some(7));
    /// assert_eq!(similarity.len(), 2);
    /// ```
    #[must_use]
    pub fn build(providers: &[Provider]) -> (Self, SimilarityMatrix) {
        let features = Self::encode(providers);
        let similarity = SimilarityMatrix::from_features(&features);
        (features, similarity)
    }

    fn encode(providers: &[Provider]) -> Self {
        let service_types: Vec<String> = providers
            .iter()
            .map(|provider| provider.service_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut matrix = Self {
            service_types,
            ..Self::default()
        };
        for provider in providers {
            if matrix.index.contains_key(&provider.id) {
                log::warn!(
                    "provider {} appears more than once; keeping the first record",
                    provider.id
                );
                continue;
            }
            let row = matrix.encode_row(provider);
            matrix.index.insert(provider.id, matrix.rows.len());
            matrix.provider_ids.push(provider.id);
            matrix.rows.push(row);
        }
        matrix
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "numeric features are scaled into the unit interval"
    )]
    fn encode_row(&self, provider: &Provider) -> Vec<f64> {
        let mut row: Vec<f64> = self
            .service_types
            .iter()
            .map(|service| {
                if *service == provider.service_type {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let experience = f64::from(provider.experience_years) / EXPERIENCE_CAP_YEARS;
        let response = provider.response_time / RESPONSE_CAP_HOURS;
        row.extend([
            provider.rating / MAX_RATING,
            experience.min(1.0),
            provider.completion_rate,
            1.0 - response.min(1.0),
            if provider.verified { 1.0 } else { 0.0 },
        ]);
        row
    }

    /// Check that rows, ids, and the index agree.
    ///
    /// # Errors
    /// Returns [`SnapshotError::RowWidth`] when a row has the wrong number of
    /// columns and [`SnapshotError::IndexMismatch`] when the id index is
    /// inconsistent.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let expected = self.dimension();
        for (row, values) in self.rows.iter().enumerate() {
            if values.len() != expected {
                return Err(SnapshotError::RowWidth {
                    row,
                    expected,
                    actual: values.len(),
                });
            }
        }
        let consistent = self.provider_ids.len() == self.rows.len()
            && self.index.len() == self.provider_ids.len()
            && self
                .provider_ids
                .iter()
                .enumerate()
                .all(|(position, id)| self.index.get(id) == Some(&position));
        if consistent {
            Ok(())
        } else {
            Err(SnapshotError::IndexMismatch)
        }
    }

    /// Number of encoded providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Report whether no providers were encoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Columns per row.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.service_types.len().saturating_add(NUMERIC_FEATURE_COUNT)
    }

    /// Service types backing the one-hot block, in column order.
    #[must_use]
    pub fn service_types(&self) -> &[String] {
        &self.service_types
    }

    /// Provider ids in row order.
    #[must_use]
    pub fn provider_ids(&self) -> &[u64] {
        &self.provider_ids
    }

    /// Row index of `provider_id`.
    #[must_use]
    pub fn position(&self, provider_id: u64) -> Option<usize> {
        self.index.get(&provider_id).copied()
    }

    /// Provider id stored at row `position`.
    #[must_use]
    pub fn provider_at(&self, position: usize) -> Option<u64> {
        self.provider_ids.get(position).copied()
    }

    /// Feature row for `provider_id`.
    #[must_use]
    pub fn row(&self, provider_id: u64) -> Option<&[f64]> {
        let position = self.position(provider_id)?;
        self.rows.get(position).map(Vec::as_slice)
    }

    fn row_at(&self, position: usize) -> &[f64] {
        self.rows.get(position).map_or(&[][..], Vec::as_slice)
    }
}

/// Symmetric provider×provider cosine similarity, stored row-major.
///
/// Rows and columns share the row order of the [`ProviderFeatureMatrix`] it
/// was computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute pairwise similarity over every feature row.
    ///
    /// Only the upper triangle is computed; the lower triangle mirrors it.
    /// The diagonal is `1.0` for nonzero rows and `0.0` for zero rows.
    #[must_use]
    pub fn from_features(features: &ProviderFeatureMatrix) -> Self {
        let size = features.len();
        let mut values = vec![0.0; size.saturating_mul(size)];
        for i in 0..size {
            let left = features.row_at(i);
            let diagonal = if norm(left.iter().copied()) > 0.0 {
                1.0
            } else {
                0.0
            };
            set(&mut values, size, i, i, diagonal);
            for j in (i.saturating_add(1))..size {
                let similarity = cosine_dense(left, features.row_at(j));
                set(&mut values, size, i, j, similarity);
                set(&mut values, size, j, i, similarity);
            }
        }
        Self { size, values }
    }

    /// Number of providers on each axis.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Report whether the matrix covers no providers.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Similarity between rows `i` and `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        self.values.get(offset(self.size, i, j)?).copied()
    }

    /// Borrow row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.size {
            return None;
        }
        let start = offset(self.size, i, 0)?;
        self.values.get(start..start.checked_add(self.size)?)
    }

    pub(crate) fn check_shape(&self, features: &ProviderFeatureMatrix) -> Result<(), SnapshotError> {
        let square = self.size.checked_mul(self.size) == Some(self.values.len());
        if square && self.size == features.len() {
            Ok(())
        } else {
            Err(SnapshotError::ShapeMismatch {
                features: features.len(),
                similarity: self.size,
            })
        }
    }
}

fn offset(size: usize, i: usize, j: usize) -> Option<usize> {
    i.checked_mul(size)?.checked_add(j)
}

fn set(values: &mut [f64], size: usize, i: usize, j: usize, value: f64) {
    if let Some(slot) = offset(size, i, j).and_then(|at| values.get_mut(at)) {
        *slot = value;
    }
}
