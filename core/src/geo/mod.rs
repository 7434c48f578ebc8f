pub mod distance;

pub use distance::{DistanceEstimator, MILES_PER_DEGREE};
