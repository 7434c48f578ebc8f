use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters shared between the merger task and handle readers.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub position_samples: usize,
    pub step_samples: usize,
    pub discoveries: usize,
    pub rejected_commands: usize,
    pub step_counter_resets: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_position(&self) {
        self.update(|metrics| metrics.position_samples += 1);
    }

    pub fn record_steps(&self) {
        self.update(|metrics| metrics.step_samples += 1);
    }

    pub fn record_discovery(&self) {
        self.update(|metrics| metrics.discoveries += 1);
    }

    pub fn record_rejected(&self) {
        self.update(|metrics| metrics.rejected_commands += 1);
    }

    pub fn record_step_reset(&self) {
        self.update(|metrics| metrics.step_counter_resets += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }

    fn update(&self, apply: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_position();
        metrics.record_position();
        metrics.record_discovery();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.position_samples, 2);
        assert_eq!(snapshot.discoveries, 1);
        assert_eq!(snapshot.step_samples, 0);
    }
}
