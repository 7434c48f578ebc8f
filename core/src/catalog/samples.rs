use super::artwork::{Artwork, ArtworkId, Coordinates};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position fix delivered by the position producer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub coords: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coords: Coordinates::new(latitude, longitude),
            timestamp,
        }
    }
}

/// Cumulative step count delivered by the step producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSample {
    pub cumulative_steps: u64,
    pub timestamp: DateTime<Utc>,
}

impl StepSample {
    pub fn new(cumulative_steps: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            cumulative_steps,
            timestamp,
        }
    }
}

/// Emitted once per artwork, the first time it enters range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    pub artwork_id: ArtworkId,
    pub artwork_name: String,
    pub artist: String,
    pub distance: f64,
    pub timestamp: DateTime<Utc>,
    /// Live step count when the discovery happened.
    pub step_count: u64,
}

impl DiscoveryEvent {
    pub fn new(artwork: &Artwork, distance: f64, timestamp: DateTime<Utc>, step_count: u64) -> Self {
        Self {
            artwork_id: artwork.id,
            artwork_name: artwork.name.clone(),
            artist: artwork.artist.clone(),
            distance,
            timestamp,
            step_count,
        }
    }
}

/// Artwork currently in range, with its estimated distance in miles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyArtwork {
    pub artwork: Artwork,
    pub distance: f64,
}

/// Human-readable rendering of a discovery against the daily step goal.
pub struct DiscoveryNotice;

impl DiscoveryNotice {
    pub fn message(event: &DiscoveryEvent, step_goal: u64) -> String {
        let remaining = step_goal.saturating_sub(event.step_count);
        format!(
            "You've found \"{}\" by {}!\n\nYou've walked {} steps today.\n{} more steps to reach your daily goal.",
            event.artwork_name, event.artist, event.step_count, remaining
        )
    }
}
