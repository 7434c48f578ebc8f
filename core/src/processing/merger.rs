//! Single-consumer event loop serialising both sensor streams and user commands.
//!
//! Producers push samples into one bounded inbox; the merger task applies them to
//! the [`WalkEngine`] one at a time and republishes a snapshot after each message,
//! before any reply or discovery broadcast goes out.
//! Readers never touch engine state directly.

use crate::catalog::{
    Artwork, ArtworkId, Catalog, DiscoveryEvent, NearbyArtwork, PositionSample, StepSample,
};
use crate::prelude::{EngineConfig, EngineError, EngineResult, SampleSink};
use crate::processing::engine::{ActiveSessionView, EngineSnapshot, StepProgress, WalkEngine};
use crate::processing::session::{SessionRecord, WalkingSession};
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Everything the merger task accepts, in arrival order.
#[derive(Debug)]
pub enum EngineMessage {
    Position(PositionSample),
    Steps(StepSample),
    SensorAvailability(bool),
    StartSession {
        at: DateTime<Utc>,
        reply: oneshot::Sender<EngineResult<WalkingSession>>,
    },
    EndSession {
        at: DateTime<Utc>,
        reply: oneshot::Sender<EngineResult<SessionRecord>>,
    },
    /// Acknowledged once every earlier message has been applied.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub struct StreamMerger {
    engine: WalkEngine,
    inbox: mpsc::Receiver<EngineMessage>,
    snapshots: watch::Sender<Arc<EngineSnapshot>>,
    discoveries: broadcast::Sender<DiscoveryEvent>,
    logger: LogManager,
}

impl StreamMerger {
    /// Builds the merger and its handle without starting the loop.
    pub fn new(catalog: Catalog, config: EngineConfig) -> (Self, EngineHandle) {
        let catalog = Arc::new(catalog);
        let metrics = Arc::new(MetricsRecorder::new());
        let (inbox_tx, inbox_rx) = mpsc::channel(config.channel_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(EngineSnapshot::empty(&config)));
        let (discovery_tx, _) = broadcast::channel(config.event_capacity.max(1));

        let handle = EngineHandle {
            inbox: inbox_tx,
            snapshots: snapshot_rx,
            discoveries: discovery_tx.clone(),
            catalog: Arc::clone(&catalog),
            metrics: Arc::clone(&metrics),
            step_goal: config.step_goal,
        };
        let merger = Self {
            engine: WalkEngine::new(catalog, config, metrics),
            inbox: inbox_rx,
            snapshots: snapshot_tx,
            discoveries: discovery_tx,
            logger: LogManager::new("merger"),
        };
        (merger, handle)
    }

    /// Spawns the merger loop on the current tokio runtime.
    pub fn spawn(catalog: Catalog, config: EngineConfig) -> (EngineHandle, JoinHandle<()>) {
        let (merger, handle) = Self::new(catalog, config);
        let task = tokio::spawn(merger.run());
        (handle, task)
    }

    /// Drains the inbox until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        self.logger.record("stream merger running");
        while let Some(message) = self.inbox.recv().await {
            if !self.apply(message) {
                break;
            }
        }
        self.logger.record("stream merger stopped");
    }

    fn apply(&mut self, message: EngineMessage) -> bool {
        match message {
            EngineMessage::Position(sample) => {
                let discovery = self.engine.ingest_position(sample);
                self.publish();
                if let Some(event) = discovery {
                    // No subscribers is not an error.
                    let _ = self.discoveries.send(event);
                }
            }
            EngineMessage::Steps(sample) => {
                self.engine.ingest_steps(sample);
                self.publish();
            }
            EngineMessage::SensorAvailability(available) => {
                self.engine.set_step_sensor_available(available);
                self.publish();
            }
            EngineMessage::StartSession { at, reply } => {
                let result = self.engine.start_session(at);
                self.publish();
                if reply.send(result).is_err() {
                    self.logger.debug("start requester went away");
                }
            }
            EngineMessage::EndSession { at, reply } => {
                let result = self.engine.end_session(at);
                self.publish();
                if reply.send(result).is_err() {
                    self.logger.debug("end requester went away");
                }
            }
            EngineMessage::Flush(reply) => {
                self.publish();
                let _ = reply.send(());
            }
            EngineMessage::Shutdown => return false,
        }
        true
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.engine.snapshot()));
    }
}

/// Cloneable surface used by the sensor layer and the presentation layer.
#[derive(Clone)]
pub struct EngineHandle {
    inbox: mpsc::Sender<EngineMessage>,
    snapshots: watch::Receiver<Arc<EngineSnapshot>>,
    discoveries: broadcast::Sender<DiscoveryEvent>,
    catalog: Arc<Catalog>,
    metrics: Arc<MetricsRecorder>,
    step_goal: u64,
}

impl EngineHandle {
    async fn send(&self, message: EngineMessage) -> EngineResult<()> {
        self.inbox
            .send(message)
            .await
            .map_err(|_| EngineError::Closed)
    }

    pub async fn set_step_sensor_available(&self, available: bool) -> EngineResult<()> {
        self.send(EngineMessage::SensorAvailability(available)).await
    }

    pub async fn start_session(&self) -> EngineResult<WalkingSession> {
        self.start_session_at(Utc::now()).await
    }

    pub async fn start_session_at(&self, at: DateTime<Utc>) -> EngineResult<WalkingSession> {
        let (reply, response) = oneshot::channel();
        self.send(EngineMessage::StartSession { at, reply }).await?;
        response.await.map_err(|_| EngineError::Closed)?
    }

    pub async fn end_session(&self) -> EngineResult<SessionRecord> {
        self.end_session_at(Utc::now()).await
    }

    pub async fn end_session_at(&self, at: DateTime<Utc>) -> EngineResult<SessionRecord> {
        let (reply, response) = oneshot::channel();
        self.send(EngineMessage::EndSession { at, reply }).await?;
        response.await.map_err(|_| EngineError::Closed)?
    }

    /// Waits until every sample sent before this call has been applied.
    pub async fn flush(&self) -> EngineResult<()> {
        let (reply, response) = oneshot::channel();
        self.send(EngineMessage::Flush(reply)).await?;
        response.await.map_err(|_| EngineError::Closed)
    }

    /// Stops the merger loop; samples already queued ahead of this are still applied.
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.send(EngineMessage::Shutdown).await
    }

    pub fn subscribe_discoveries(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.discoveries.subscribe()
    }

    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn current_nearest_artwork(&self) -> Option<NearbyArtwork> {
        self.snapshots.borrow().nearest.clone()
    }

    pub fn discovered_artworks(&self) -> Vec<Artwork> {
        self.snapshots.borrow().discovered.to_vec()
    }

    pub fn live_step_count(&self) -> u64 {
        self.snapshots.borrow().live_step_count
    }

    pub fn active_session(&self) -> Option<ActiveSessionView> {
        self.snapshots.borrow().active_session.clone()
    }

    pub fn session_history(&self) -> Vec<SessionRecord> {
        self.snapshots.borrow().history.to_vec()
    }

    pub fn step_progress(&self) -> StepProgress {
        self.snapshots.borrow().step_progress
    }

    pub fn step_goal(&self) -> u64 {
        self.step_goal
    }

    pub fn artwork(&self, id: ArtworkId) -> Option<Artwork> {
        self.catalog.get(id).cloned()
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl SampleSink for EngineHandle {
    async fn ingest_position(&self, sample: PositionSample) -> EngineResult<()> {
        self.send(EngineMessage::Position(sample)).await
    }

    async fn ingest_steps(&self, sample: StepSample) -> EngineResult<()> {
        self.send(EngineMessage::Steps(sample)).await
    }
}
