//! Proximity discovery and walking-session engine for the art walk platform.
//!
//! Two independent producers (position fixes and cumulative step counts) feed a
//! single stream merger, which matches positions against a static artwork catalog,
//! records first-time discoveries and tracks walking sessions.

pub mod catalog;
pub mod geo;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use catalog::{Artwork, ArtworkId, Catalog, Coordinates, DiscoveryEvent, PositionSample, StepSample};
pub use prelude::{EngineConfig, EngineError, EngineResult, SampleSink};
pub use processing::{EngineHandle, EngineSnapshot, SessionRecord, StreamMerger, WalkingSession};
