use crate::catalog::Coordinates;

/// Approximate ground distance covered by one degree.
pub const MILES_PER_DEGREE: f64 = 69.0;

/// Planar small-area distance approximation. Not valid across large latitude spans.
pub struct DistanceEstimator;

impl DistanceEstimator {
    /// Distance in miles, treating degree offsets as Cartesian.
    pub fn estimate(a: Coordinates, b: Coordinates) -> f64 {
        let lat_diff = b.latitude - a.latitude;
        let lon_diff = b.longitude - a.longitude;
        lat_diff.hypot(lon_diff) * MILES_PER_DEGREE
    }
}
