use serde::{Deserialize, Serialize};

/// Position fix posted by an external sensor client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionReport {
    pub latitude: f64,
    pub longitude: f64,
}

/// Cumulative pedometer reading posted by an external sensor client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StepReport {
    pub steps: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorReport {
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    pub status: String,
    pub error: String,
}
