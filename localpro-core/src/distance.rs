//! Great-circle distance between WGS84 coordinates.
//!
//! Coordinates follow the `geo` convention used throughout the workspace:
//! `x = longitude`, `y = latitude`, both in degrees.

use geo::Coord;

/// Mean Earth radius in kilometres used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Build a coordinate from a `(latitude, longitude)` pair.
///
/// # Examples
/// ```
/// use localpro_core::coord_from_lat_lon;
///
/// let t_nagar = coord_from_lat_lon(13.0418, 80.2341);
/// assert_eq!(t_nagar.x, 80.2341);
/// assert_eq!(t_nagar.y, 13.0418);
/// ```
#[must_use]
pub const fn coord_from_lat_lon(latitude: f64, longitude: f64) -> Coord<f64> {
    Coord {
        x: longitude,
        y: latitude,
    }
}

/// Haversine distance between two coordinates in kilometres.
///
/// Non-finite inputs propagate `NaN` rather than failing.
///
/// # Examples
/// ```
/// use localpro_core::{coord_from_lat_lon, haversine_km};
///
/// let a = coord_from_lat_lon(13.0418, 80.2341);
/// assert_eq!(haversine_km(a, a), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the haversine formula is floating-point trigonometry"
)]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let delta_lat = (b.y - a.y).to_radians();
    let delta_lon = (b.x - a.x).to_radians();

    let half_chord = (delta_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (delta_lon / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * angle
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const T_NAGAR: (f64, f64) = (13.0418, 80.2341);
    const ANNA_NAGAR: (f64, f64) = (13.0850, 80.2101);

    #[rstest]
    #[case(T_NAGAR)]
    #[case(ANNA_NAGAR)]
    #[case((0.0, 0.0))]
    #[case((-33.8688, 151.2093))]
    fn distance_to_self_is_zero(#[case] point: (f64, f64)) {
        let coord = coord_from_lat_lon(point.0, point.1);
        assert_eq!(haversine_km(coord, coord), 0.0);
    }

    #[rstest]
    fn chennai_reference_distance() {
        let a = coord_from_lat_lon(T_NAGAR.0, T_NAGAR.1);
        let b = coord_from_lat_lon(ANNA_NAGAR.0, ANNA_NAGAR.1);
        let distance = haversine_km(a, b);
        assert!(
            (distance - 5.462).abs() < 0.1,
            "T Nagar to Anna Nagar should be about 5.46 km, got {distance}"
        );
    }

    #[rstest]
    fn distance_is_symmetric() {
        let a = coord_from_lat_lon(T_NAGAR.0, T_NAGAR.1);
        let b = coord_from_lat_lon(ANNA_NAGAR.0, ANNA_NAGAR.1);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[rstest]
    fn one_degree_of_latitude() {
        let a = coord_from_lat_lon(0.0, 0.0);
        let b = coord_from_lat_lon(1.0, 0.0);
        let expected = EARTH_RADIUS_KM * std::f64::consts::PI / 180.0;
        assert!((haversine_km(a, b) - expected).abs() < 1e-9);
    }

    #[rstest]
    fn nan_propagates() {
        let a = coord_from_lat_lon(f64::NAN, 80.0);
        let b = coord_from_lat_lon(13.0, 80.0);
        assert!(haversine_km(a, b).is_nan());
    }
}
