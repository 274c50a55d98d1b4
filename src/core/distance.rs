//! Great-circle distance between two points
//!
//! Haversine formula on a spherical Earth:
//!     a = sin²(Δlat/2) + cos(lat1)·cos(lat2)·sin²(Δlng/2)
//!     d = 2·R·asin(√a)
//!
//! Coordinates are in decimal degrees, longitude first.

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Distance between two (longitude, latitude) points
pub trait DistanceCalculator {
    /// Distance in kilometers
    fn distance(&self, lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64;
}

/// Haversine great-circle distance
#[derive(Debug, Clone, Copy)]
pub struct Haversine {
    pub radius_km: f64,
}

impl Haversine {
    pub fn new(radius_km: f64) -> Self {
        Self { radius_km }
    }
}

impl Default for Haversine {
    fn default() -> Self {
        Self::new(EARTH_RADIUS_KM)
    }
}

impl DistanceCalculator for Haversine {
    fn distance(&self, lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
        let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
        let dlat = lat2 - lat1;
        let dlng = (lng2 - lng1).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

        // Clamp guards asin against a drifting just above 1.0
        2.0 * self.radius_km * a.sqrt().min(1.0).asin()
    }
}

/// Haversine distance in kilometers using the mean Earth radius
///
/// # Examples
/// ```
/// use olist::core::distance::haversine_distance;
/// let d = haversine_distance(-46.63, -23.55, -46.63, -23.55);
/// assert!(d.abs() < 1e-9);
/// ```
pub fn haversine_distance(lng1: f64, lat1: f64, lng2: f64, lat2: f64) -> f64 {
    Haversine::default().distance(lng1, lat1, lng2, lat2)
}
