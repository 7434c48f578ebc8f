use crate::catalog::ArtworkId;
use crate::prelude::{EngineError, EngineResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Active,
}

/// A walking session; active while `end_time` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkingSession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub start_step_count: u64,
    pub end_time: Option<DateTime<Utc>>,
    pub end_step_count: Option<u64>,
    /// Artworks first discovered while this session was active.
    pub discovered_artwork_ids: HashSet<ArtworkId>,
}

impl WalkingSession {
    fn begin(start_step_count: u64, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_time,
            start_step_count,
            end_time: None,
            end_step_count: None,
            discovered_artwork_ids: HashSet::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }

    /// Steps since the session started, clamped at zero across counter resets.
    pub fn steps_so_far(&self, current_step_count: u64) -> u64 {
        current_step_count.saturating_sub(self.start_step_count)
    }

    pub fn artwork_count(&self) -> usize {
        self.discovered_artwork_ids.len()
    }
}

/// Immutable history entry derived from a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub steps_walked: u64,
    /// `minutes:seconds`
    pub duration: String,
    pub duration_secs: i64,
    pub artwork_count: usize,
}

impl SessionRecord {
    fn from_completed(session: &WalkingSession, end_time: DateTime<Utc>, end_step_count: u64) -> Self {
        let duration_secs = (end_time - session.start_time).num_seconds().max(0);
        Self {
            id: session.id,
            date: session.start_time.date_naive(),
            start_time: session.start_time,
            end_time,
            steps_walked: end_step_count.saturating_sub(session.start_step_count),
            duration: format_duration(duration_secs),
            duration_secs,
            artwork_count: session.artwork_count(),
        }
    }
}

pub fn format_duration(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Idle/Active cycle plus the most-recent-first history of completed sessions.
#[derive(Debug, Default)]
pub struct SessionMachine {
    active: Option<WalkingSession>,
    history: VecDeque<SessionRecord>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    pub fn start(
        &mut self,
        current_step_count: u64,
        now: DateTime<Utc>,
        step_sensor_available: bool,
    ) -> EngineResult<&WalkingSession> {
        if let Some(active) = &self.active {
            return Err(EngineError::Precondition(format!(
                "session {} already active",
                active.id
            )));
        }
        if !step_sensor_available {
            return Err(EngineError::SensorUnavailable(
                "step counter is not available".into(),
            ));
        }
        let session: &WalkingSession = self
            .active
            .insert(WalkingSession::begin(current_step_count, now));
        Ok(session)
    }

    /// Attributes a fresh discovery to the active session. Returns `false` while idle.
    pub fn on_discovery(&mut self, artwork_id: ArtworkId) -> bool {
        match self.active.as_mut() {
            Some(session) => {
                session.discovered_artwork_ids.insert(artwork_id);
                true
            }
            None => false,
        }
    }

    pub fn end(&mut self, current_step_count: u64, now: DateTime<Utc>) -> EngineResult<SessionRecord> {
        let mut session = self
            .active
            .take()
            .ok_or_else(|| EngineError::Precondition("no active session to end".into()))?;
        session.end_time = Some(now);
        session.end_step_count = Some(current_step_count);

        let record = SessionRecord::from_completed(&session, now, current_step_count);
        self.history.push_front(record.clone());
        Ok(record)
    }

    pub fn active(&self) -> Option<&WalkingSession> {
        self.active.as_ref()
    }

    pub fn history(&self) -> impl Iterator<Item = &SessionRecord> {
        self.history.iter()
    }
}
