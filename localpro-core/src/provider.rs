//! Marketplace provider records.
//!
//! On the wire a provider carries flat `latitude`/`longitude` keys; in
//! memory they become one optional [`Coord`].

use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

#[cfg(feature = "serde")]
use crate::coord_from_lat_lon;

/// Default hourly rate applied by [`Provider::new`].
const DEFAULT_HOURLY_RATE: f64 = 500.0;

/// A service provider listed on the marketplace.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. Metric
/// fields are taken as-is: negative or out-of-range values are the caller's
/// responsibility and are never clamped here.
///
/// Serialised records use the marketplace export shape, with `latitude` and
/// `longitude` given together or not at all.
///
/// # Examples
/// ```
/// use localpro_core::{Provider, coord_from_lat_lon};
///
/// let provider = Provider::new(7, "Plumber")
///     .with_rating(4.5)
///     .with_coordinates(coord_from_lat_lon(13.0418, 80.2341));
///
/// assert_eq!(provider.id, 7);
/// assert_eq!(provider.service_type, "Plumber");
/// assert!(provider.coordinates.is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// Unique identifier.
    pub id: u64,
    /// Service category, e.g. `Electrician` or `Tutor`.
    pub service_type: String,
    /// Free-form address.
    pub location: String,
    /// Geographic position, when known.
    pub coordinates: Option<Coord<f64>>,
    /// Average review rating on a `0.0..=5.0` scale.
    pub rating: f64,
    /// Years in the trade.
    pub experience_years: u32,
    /// Jobs completed through the marketplace.
    pub total_jobs: u32,
    /// Fraction of accepted jobs completed, `0.0..=1.0`.
    pub completion_rate: f64,
    /// Typical response time in hours.
    pub response_time: f64,
    /// Whether the marketplace has verified the provider.
    pub verified: bool,
    /// Hourly rate in the marketplace currency.
    pub hourly_rate: f64,
}

/// Export shape of [`Provider`].
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ExportRecord {
    id: u64,
    service_type: String,
    #[serde(default)]
    location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    longitude: Option<f64>,
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    experience_years: u32,
    #[serde(default)]
    total_jobs: u32,
    #[serde(default)]
    completion_rate: f64,
    #[serde(default)]
    response_time: f64,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    hourly_rate: f64,
}

#[cfg(feature = "serde")]
impl Serialize for Provider {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ExportRecord {
            id: self.id,
            service_type: self.service_type.clone(),
            location: self.location.clone(),
            latitude: self.coordinates.map(|coord| coord.y),
            longitude: self.coordinates.map(|coord| coord.x),
            rating: self.rating,
            experience_years: self.experience_years,
            total_jobs: self.total_jobs,
            completion_rate: self.completion_rate,
            response_time: self.response_time,
            verified: self.verified,
            hourly_rate: self.hourly_rate,
        }
        .serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = ExportRecord::deserialize(deserializer)?;
        let coordinates = match (record.latitude, record.longitude) {
            (Some(latitude), Some(longitude)) => Some(coord_from_lat_lon(latitude, longitude)),
            (None, None) => None,
            _ => {
                return Err(D::Error::custom(format!(
                    "provider {} must give latitude and longitude together",
                    record.id
                )));
            }
        };
        Ok(Self {
            id: record.id,
            service_type: record.service_type,
            location: record.location,
            coordinates,
            rating: record.rating,
            experience_years: record.experience_years,
            total_jobs: record.total_jobs,
            completion_rate: record.completion_rate,
            response_time: record.response_time,
            verified: record.verified,
            hourly_rate: record.hourly_rate,
        })
    }
}

impl Provider {
    /// Construct a provider with zeroed metrics and no coordinates.
    ///
    /// # Examples
    /// ```
    /// use localpro_core::Provider;
    ///
    /// let provider = Provider::new(1, "Tutor");
    /// assert_eq!(provider.rating, 0.0);
    /// assert!(!provider.verified);
    /// ```
    #[must_use]
    pub fn new(id: u64, service_type: impl Into<String>) -> Self {
        Self {
            id,
            service_type: service_type.into(),
            location: String::new(),
            coordinates: None,
            rating: 0.0,
            experience_years: 0,
            total_jobs: 0,
            completion_rate: 0.0,
            response_time: 0.0,
            verified: false,
            hourly_rate: DEFAULT_HOURLY_RATE,
        }
    }

    /// Set the address while returning `self` for chaining.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the coordinates while returning `self` for chaining.
    #[must_use]
    pub const fn with_coordinates(mut self, coordinates: Coord<f64>) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Set the rating while returning `self` for chaining.
    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    /// Set experience and job history while returning `self` for chaining.
    #[must_use]
    pub const fn with_history(mut self, experience_years: u32, total_jobs: u32) -> Self {
        self.experience_years = experience_years;
        self.total_jobs = total_jobs;
        self
    }

    /// Set completion rate and response time while returning `self` for
    /// chaining.
    #[must_use]
    pub const fn with_performance(mut self, completion_rate: f64, response_time: f64) -> Self {
        self.completion_rate = completion_rate;
        self.response_time = response_time;
        self
    }

    /// Set the verification flag while returning `self` for chaining.
    #[must_use]
    pub const fn with_verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    /// Report whether the provider offers `service_type`.
    ///
    /// A `None` filter matches every provider.
    #[must_use]
    pub fn matches_service(&self, service_type: Option<&str>) -> bool {
        service_type.is_none_or(|wanted| self.service_type == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord_from_lat_lon;
    use rstest::rstest;

    #[rstest]
    #[case(None, true)]
    #[case(Some("Plumber"), true)]
    #[case(Some("Electrician"), false)]
    #[case(Some("plumber"), false)]
    fn service_filter(#[case] filter: Option<&str>, #[case] expected: bool) {
        let provider = Provider::new(1, "Plumber");
        assert_eq!(provider.matches_service(filter), expected);
    }

    #[rstest]
    fn builders_chain() {
        let provider = Provider::new(3, "Driver")
            .with_location("Adyar")
            .with_coordinates(coord_from_lat_lon(13.0, 80.2))
            .with_rating(4.1)
            .with_history(5, 120)
            .with_performance(0.9, 3.0)
            .with_verified(true);
        assert_eq!(provider.location, "Adyar");
        assert_eq!(provider.experience_years, 5);
        assert_eq!(provider.total_jobs, 120);
        assert!(provider.verified);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_sparse_records() {
        let provider: Provider =
            serde_json::from_str(r#"{"id": 9, "service_type": "Cleaner", "rating": 3.5}"#)
                .expect("decode provider");
        assert_eq!(provider.id, 9);
        assert_eq!(provider.rating, 3.5);
        assert!(provider.coordinates.is_none());
        assert_eq!(provider.hourly_rate, 0.0);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn reads_latitude_and_longitude_keys() {
        let provider: Provider = serde_json::from_str(
            r#"{"id": 1, "service_type": "Plumber", "rating": 4.0,
                "latitude": 13.04, "longitude": 80.23}"#,
        )
        .expect("decode provider");
        assert_eq!(provider.coordinates, Some(coord_from_lat_lon(13.04, 80.23)));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    #[case(r#"{"id": 1, "service_type": "Plumber", "latitude": 13.04}"#)]
    #[case(r#"{"id": 1, "service_type": "Plumber", "longitude": 80.23}"#)]
    fn rejects_half_a_position(#[case] raw: &str) {
        let err = serde_json::from_str::<Provider>(raw).expect_err("incomplete position");
        assert!(err.to_string().contains("together"), "unexpected error {err}");
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn writes_the_export_shape() {
        let provider =
            Provider::new(2, "Tutor").with_coordinates(coord_from_lat_lon(13.0850, 80.2101));
        let value = serde_json::to_value(&provider).expect("encode provider");
        assert_eq!(value["latitude"], 13.0850);
        assert_eq!(value["longitude"], 80.2101);
        assert!(value.get("coordinates").is_none());
        let without = serde_json::to_value(Provider::new(3, "Tutor")).expect("encode provider");
        assert!(without.get("latitude").is_none());
    }
}
