use crate::catalog::{Artwork, Catalog, DiscoveryEvent, NearbyArtwork, PositionSample, StepSample};
use crate::prelude::{EngineConfig, EngineResult};
use crate::processing::proximity::ProximityMatcher;
use crate::processing::registry::DiscoveryRegistry;
use crate::processing::session::{SessionMachine, SessionRecord, SessionState, WalkingSession};
use crate::telemetry::{LogManager, MetricsRecorder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Progress of the live step count against the daily goal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub steps: u64,
    pub goal: u64,
    pub remaining: u64,
    pub percent: f64,
}

impl StepProgress {
    pub fn new(steps: u64, goal: u64) -> Self {
        let percent = if goal == 0 {
            100.0
        } else {
            (steps as f64 / goal as f64 * 100.0).min(100.0)
        };
        Self {
            steps,
            goal,
            remaining: goal.saturating_sub(steps),
            percent,
        }
    }
}

/// Active session as seen by readers, with live derived counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSessionView {
    pub session: WalkingSession,
    pub steps_so_far: u64,
    pub artwork_count: usize,
}

/// Read-only copy of everything the presentation layer renders.
///
/// `discovered` and `history` are shared with the engine and only reallocated when
/// they grow, so publishing a snapshot per sample stays cheap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub nearest: Option<NearbyArtwork>,
    pub discovered: Arc<[Artwork]>,
    pub live_step_count: u64,
    pub session_state: SessionState,
    pub active_session: Option<ActiveSessionView>,
    pub history: Arc<[SessionRecord]>,
    pub step_progress: StepProgress,
    pub step_sensor_available: bool,
}

impl EngineSnapshot {
    pub fn empty(config: &EngineConfig) -> Self {
        Self {
            nearest: None,
            discovered: Arc::from(Vec::new()),
            live_step_count: 0,
            session_state: SessionState::Idle,
            active_session: None,
            history: Arc::from(Vec::new()),
            step_progress: StepProgress::new(0, config.step_goal),
            step_sensor_available: config.step_sensor_available,
        }
    }
}

/// Synchronous engine state. Not shared: the stream merger owns the only instance.
pub struct WalkEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    registry: DiscoveryRegistry,
    sessions: SessionMachine,
    current_step_count: u64,
    step_sensor_available: bool,
    nearest: Option<NearbyArtwork>,
    discovered_view: Arc<[Artwork]>,
    history_view: Arc<[SessionRecord]>,
    logger: LogManager,
    metrics: Arc<MetricsRecorder>,
}

impl WalkEngine {
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            catalog,
            step_sensor_available: config.step_sensor_available,
            config,
            registry: DiscoveryRegistry::new(),
            sessions: SessionMachine::new(),
            current_step_count: 0,
            nearest: None,
            discovered_view: Arc::from(Vec::new()),
            history_view: Arc::from(Vec::new()),
            logger: LogManager::new("engine"),
            metrics,
        }
    }

    /// Updates the nearby artwork and returns an event on first-ever discovery.
    pub fn ingest_position(&mut self, sample: PositionSample) -> Option<DiscoveryEvent> {
        self.metrics.record_position();
        let found = ProximityMatcher::find_nearest(&sample, self.catalog.artworks());

        let mut event = None;
        if let Some(found) = &found {
            if self.registry.record_if_new(found.artwork) {
                self.sessions.on_discovery(found.artwork.id);
                self.discovered_view = Arc::from(self.registry.list_all());
                self.metrics.record_discovery();
                self.logger.record(&format!(
                    "discovered artwork {} \"{}\" at {:.4} mi",
                    found.artwork.id, found.artwork.name, found.distance
                ));
                event = Some(DiscoveryEvent::new(
                    found.artwork,
                    found.distance,
                    sample.timestamp,
                    self.current_step_count,
                ));
            }
        }

        self.nearest = found.map(|found| NearbyArtwork {
            artwork: found.artwork.clone(),
            distance: found.distance,
        });
        event
    }

    pub fn ingest_steps(&mut self, sample: StepSample) {
        self.metrics.record_steps();
        if sample.cumulative_steps < self.current_step_count {
            self.metrics.record_step_reset();
            self.logger.warn(&format!(
                "step counter went backwards ({} -> {})",
                self.current_step_count, sample.cumulative_steps
            ));
        }
        self.current_step_count = sample.cumulative_steps;
    }

    pub fn set_step_sensor_available(&mut self, available: bool) {
        if self.step_sensor_available != available {
            self.logger
                .record(&format!("step sensor availability changed to {}", available));
        }
        self.step_sensor_available = available;
    }

    pub fn start_session(&mut self, now: DateTime<Utc>) -> EngineResult<WalkingSession> {
        match self
            .sessions
            .start(self.current_step_count, now, self.step_sensor_available)
        {
            Ok(session) => {
                self.logger.record(&format!(
                    "session {} started at {} steps",
                    session.id, session.start_step_count
                ));
                Ok(session.clone())
            }
            Err(err) => {
                self.metrics.record_rejected();
                self.logger.warn(&format!("start rejected: {}", err));
                Err(err)
            }
        }
    }

    pub fn end_session(&mut self, now: DateTime<Utc>) -> EngineResult<SessionRecord> {
        match self.sessions.end(self.current_step_count, now) {
            Ok(record) => {
                self.history_view = self.sessions.history().cloned().collect();
                self.logger.record(&format!(
                    "session {} ended: {} steps in {}, {} artworks",
                    record.id, record.steps_walked, record.duration, record.artwork_count
                ));
                Ok(record)
            }
            Err(err) => {
                self.metrics.record_rejected();
                self.logger.warn(&format!("end rejected: {}", err));
                Err(err)
            }
        }
    }

    pub fn current_nearest_artwork(&self) -> Option<&NearbyArtwork> {
        self.nearest.as_ref()
    }

    pub fn discovered_artworks(&self) -> &[Artwork] {
        self.registry.list_all()
    }

    pub fn live_step_count(&self) -> u64 {
        self.current_step_count
    }

    pub fn active_session(&self) -> Option<ActiveSessionView> {
        self.sessions.active().map(|session| ActiveSessionView {
            steps_so_far: session.steps_so_far(self.current_step_count),
            artwork_count: session.artwork_count(),
            session: session.clone(),
        })
    }

    pub fn session_history(&self) -> &[SessionRecord] {
        &self.history_view
    }

    pub fn step_progress(&self) -> StepProgress {
        StepProgress::new(self.current_step_count, self.config.step_goal)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            nearest: self.nearest.clone(),
            discovered: Arc::clone(&self.discovered_view),
            live_step_count: self.current_step_count,
            session_state: self.sessions.state(),
            active_session: self.active_session(),
            history: Arc::clone(&self.history_view),
            step_progress: self.step_progress(),
            step_sensor_available: self.step_sensor_available,
        }
    }
}
