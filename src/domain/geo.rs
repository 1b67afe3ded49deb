//! Great-circle distance and human-readable distance formatting
//!
//! Pure math, no side effects. `distance_meters` is the single source of
//! truth for geofence decisions; `format_distance` is presentational only
//! and never feeds back into decision logic.

use crate::domain::types::Coordinates;

/// Mean earth radius in meters (IUGG)
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per statute mile
pub const METERS_PER_MILE: f64 = 1_609.344;

/// Haversine great-circle distance between two coordinates, in meters
///
/// Symmetric: distance_meters(a, b) == distance_meters(b, a).
/// Zero iff a == b.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Render a distance in meters as miles with one decimal place
pub fn format_distance(meters: f64) -> String {
    format!("{:.1} mi", meters / METERS_PER_MILE)
}
