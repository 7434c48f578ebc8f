pub mod artwork;
pub mod samples;

pub use artwork::{Artwork, ArtworkId, Catalog, Coordinates};
pub use samples::{DiscoveryEvent, DiscoveryNotice, NearbyArtwork, PositionSample, StepSample};
