use crate::generator::feed::{feed_positions, feed_steps};
use crate::generator::profile::build_walk_plan;
use crate::workflow::config::WalkConfig;
use anyhow::Context;
use artwalkcore::catalog::DiscoveryEvent;
use artwalkcore::processing::{EngineHandle, EngineSnapshot, SessionRecord};
use artwalkcore::telemetry::MetricsSnapshot;
use chrono::Utc;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub struct WalkResult {
    pub discoveries: Vec<DiscoveryEvent>,
    pub record: SessionRecord,
    pub snapshot: Arc<EngineSnapshot>,
    pub metrics: MetricsSnapshot,
    pub positions_sent: usize,
    pub steps_sent: usize,
}

#[derive(Clone)]
pub struct Runner {
    config: WalkConfig,
}

/// Drains the discovery feed while the walk runs, until `stop` fires or the feed closes.
///
/// Events already queued when `stop` fires are still collected.
fn collect_discoveries(
    mut events: broadcast::Receiver<DiscoveryEvent>,
    mut stop: oneshot::Receiver<()>,
) -> JoinHandle<Vec<DiscoveryEvent>> {
    tokio::spawn(async move {
        let mut discoveries = Vec::new();
        loop {
            tokio::select! {
                biased;
                received = events.recv() => match received {
                    Ok(event) => discoveries.push(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("discovery feed lagged, {} events skipped", skipped)
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = &mut stop => break,
            }
        }
        discoveries
    })
}

impl Runner {
    pub fn new(config: WalkConfig) -> Self {
        Self { config }
    }

    /// Walks the whole catalog inside one session, with both producers running concurrently.
    pub async fn execute(&self, handle: &EngineHandle) -> anyhow::Result<WalkResult> {
        let generator = &self.config.generator;
        let plan = build_walk_plan(&handle.catalog(), generator, Utc::now())
            .context("building walk plan")?;
        let pace = Duration::from_millis(generator.pace_ms);
        let (stop_tx, stop_rx) = oneshot::channel();
        let collector = collect_discoveries(handle.subscribe_discoveries(), stop_rx);

        // The first count is the baseline the session starts from.
        let mut steps = plan.steps.into_iter();
        let mut steps_sent = 0;
        if let Some(baseline) = steps.next() {
            steps_sent += feed_steps(handle.clone(), vec![baseline], Duration::ZERO)
                .await
                .context("priming step counter")?;
        }
        handle
            .start_session_at(plan.started_at)
            .await
            .context("starting walking session")?;

        let position_task = tokio::spawn(feed_positions(handle.clone(), plan.positions, pace));
        let step_task = tokio::spawn(feed_steps(handle.clone(), steps.collect(), pace));
        let positions_sent = position_task
            .await
            .context("joining position producer")?
            .context("position producer")?;
        steps_sent += step_task
            .await
            .context("joining step producer")?
            .context("step producer")?;

        let record = handle
            .end_session_at(plan.finished_at)
            .await
            .context("ending walking session")?;

        // Every discovery was broadcast before the end command was answered.
        let _ = stop_tx.send(());
        let discoveries = collector.await.context("joining discovery collector")?;

        Ok(WalkResult {
            discoveries,
            record,
            snapshot: handle.snapshot(),
            metrics: handle.metrics(),
            positions_sent,
            steps_sent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artwalkcore::catalog::{Artwork, Catalog, Coordinates};
    use artwalkcore::processing::StreamMerger;
    use std::path::PathBuf;

    fn catalog() -> Catalog {
        let art = |id: u32, latitude: f64, longitude: f64| Artwork {
            id,
            name: format!("Stop {}", id),
            artist: "Anon".into(),
            description: String::new(),
            image: None,
            coords: Coordinates::new(latitude, longitude),
            trigger_distance: 0.0095,
            art_type: None,
            year: None,
        };
        Catalog::new(vec![
            art(1, 37.6922, -97.3456),
            art(2, 37.6941, -97.3412),
            art(3, 37.6958, -97.3381),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn runner_discovers_whole_catalog_in_one_session() {
        let cfg = WalkConfig::from_args(PathBuf::from("unused.json"), 100, 5);
        let (handle, _task) = StreamMerger::spawn(catalog(), cfg.engine.clone());
        let result = Runner::new(cfg).execute(&handle).await.unwrap();

        assert_eq!(result.record.artwork_count, 3);
        assert_eq!(result.discoveries.len(), 3);
        assert_eq!(result.snapshot.history.len(), 1);
        assert!(result.snapshot.active_session.is_none());
        assert_eq!(result.metrics.position_samples, result.positions_sent);
        assert_eq!(
            result.record.steps_walked,
            result.snapshot.live_step_count
        );
    }

    #[tokio::test]
    async fn discoveries_beyond_event_capacity_are_all_collected() {
        let artworks: Vec<Artwork> = (1..=100u32)
            .map(|id| Artwork {
                id,
                name: format!("Stop {}", id),
                artist: "Anon".into(),
                description: String::new(),
                image: None,
                coords: Coordinates::new(37.0 + f64::from(id) * 0.001, -97.0),
                trigger_distance: 0.0095,
                art_type: None,
                year: None,
            })
            .collect();
        let cfg = WalkConfig::from_args(PathBuf::from("unused.json"), 100, 5);
        assert!(artworks.len() > cfg.engine.event_capacity);
        let (handle, _task) =
            StreamMerger::spawn(Catalog::new(artworks).unwrap(), cfg.engine.clone());
        let result = Runner::new(cfg).execute(&handle).await.unwrap();

        assert_eq!(result.record.artwork_count, 100);
        assert_eq!(result.discoveries.len(), 100);
        let ids: Vec<_> = result.discoveries.iter().map(|event| event.artwork_id).collect();
        assert_eq!(ids, (1..=100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn second_walk_finds_nothing_new() {
        let cfg = WalkConfig::from_args(PathBuf::from("unused.json"), 100, 5);
        let (handle, _task) = StreamMerger::spawn(catalog(), cfg.engine.clone());
        let runner = Runner::new(cfg);
        runner.execute(&handle).await.unwrap();
        let second = runner.execute(&handle).await.unwrap();

        assert_eq!(second.record.artwork_count, 0);
        assert!(second.discoveries.is_empty());
        assert_eq!(second.snapshot.history.len(), 2);
    }
}
