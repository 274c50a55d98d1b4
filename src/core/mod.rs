//! Core calculation modules

pub mod distance;

// Re-export commonly used types
pub use distance::{haversine_distance, DistanceCalculator, Haversine, EARTH_RADIUS_KM};
