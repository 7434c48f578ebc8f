use artwalkcore::catalog::{PositionSample, StepSample};
use artwalkcore::prelude::{EngineResult, SampleSink};
use log::debug;
use std::time::Duration;

/// Replays position fixes into the sink, one push per fix.
pub async fn feed_positions<S: SampleSink>(
    sink: S,
    samples: Vec<PositionSample>,
    pace: Duration,
) -> EngineResult<usize> {
    let mut pushed = 0;
    for sample in samples {
        sink.ingest_position(sample).await?;
        pushed += 1;
        pause(pace).await;
    }
    debug!("position producer finished after {} fixes", pushed);
    Ok(pushed)
}

/// Replays cumulative step counts into the sink.
pub async fn feed_steps<S: SampleSink>(
    sink: S,
    samples: Vec<StepSample>,
    pace: Duration,
) -> EngineResult<usize> {
    let mut pushed = 0;
    for sample in samples {
        sink.ingest_steps(sample).await?;
        pushed += 1;
        pause(pace).await;
    }
    debug!("step producer finished after {} samples", pushed);
    Ok(pushed)
}

async fn pause(pace: Duration) {
    if pace.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(pace).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artwalkcore::prelude::EngineError;
    use chrono::Utc;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        steps: Arc<Mutex<Vec<u64>>>,
        positions: Arc<Mutex<usize>>,
        closed: bool,
    }

    impl SampleSink for RecordingSink {
        async fn ingest_position(&self, _sample: PositionSample) -> EngineResult<()> {
            if self.closed {
                return Err(EngineError::Closed);
            }
            *self.positions.lock().unwrap() += 1;
            Ok(())
        }

        async fn ingest_steps(&self, sample: StepSample) -> EngineResult<()> {
            if self.closed {
                return Err(EngineError::Closed);
            }
            self.steps.lock().unwrap().push(sample.cumulative_steps);
            Ok(())
        }
    }

    #[tokio::test]
    async fn steps_arrive_in_order() {
        let sink = RecordingSink::default();
        let samples = (0..5)
            .map(|count| StepSample::new(count * 3, Utc::now()))
            .collect();
        let pushed = feed_steps(sink.clone(), samples, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(pushed, 5);
        assert_eq!(*sink.steps.lock().unwrap(), vec![0, 3, 6, 9, 12]);
    }

    #[tokio::test]
    async fn closed_sink_stops_the_producer() {
        let sink = RecordingSink {
            closed: true,
            ..Default::default()
        };
        let samples = vec![PositionSample::new(37.69, -97.34, Utc::now())];
        let err = feed_positions(sink.clone(), samples, Duration::ZERO)
            .await
            .unwrap_err();

        assert_eq!(err, EngineError::Closed);
        assert_eq!(*sink.positions.lock().unwrap(), 0);
    }
}
