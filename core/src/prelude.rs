use crate::catalog::{PositionSample, StepSample};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Shared configuration for the discovery engine and its merger task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Daily step goal used for progress reporting.
    pub step_goal: u64,
    /// Bound of the merger inbox shared by both producers.
    pub channel_capacity: usize,
    /// Step sensor availability assumed until the sensor layer reports otherwise.
    pub step_sensor_available: bool,
    /// Buffered discovery events per subscriber before lagging.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_goal: 100,
            channel_capacity: 256,
            step_sensor_available: true,
            event_capacity: 64,
        }
    }
}

/// Common error type for engine commands.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("engine closed")]
    Closed,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Seam between the sensor layer and the engine: anything that accepts raw samples.
pub trait SampleSink {
    fn ingest_position(&self, sample: PositionSample)
        -> impl Future<Output = EngineResult<()>> + Send;
    fn ingest_steps(&self, sample: StepSample) -> impl Future<Output = EngineResult<()>> + Send;
}
