use crate::catalog::{Artwork, PositionSample};
use crate::geo::DistanceEstimator;

/// In-range artwork selected for a position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityMatch<'a> {
    pub artwork: &'a Artwork,
    pub distance: f64,
}

/// Scans the catalog for the nearest artwork whose trigger radius covers a sample.
pub struct ProximityMatcher;

impl ProximityMatcher {
    /// Nearest candidate with `distance <= trigger_distance`; ties keep catalog order.
    pub fn find_nearest<'a>(
        sample: &PositionSample,
        catalog: &'a [Artwork],
    ) -> Option<ProximityMatch<'a>> {
        let mut best: Option<ProximityMatch<'a>> = None;
        for artwork in catalog {
            let distance = DistanceEstimator::estimate(sample.coords, artwork.coords);
            let in_range = distance <= artwork.trigger_distance;
            if !in_range {
                continue;
            }
            if best.map_or(true, |current| distance < current.distance) {
                best = Some(ProximityMatch { artwork, distance });
            }
        }
        best
    }
}
