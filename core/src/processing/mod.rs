pub mod engine;
pub mod merger;
pub mod proximity;
pub mod registry;
pub mod session;

pub use engine::{ActiveSessionView, EngineSnapshot, StepProgress, WalkEngine};
pub use merger::{EngineHandle, EngineMessage, StreamMerger};
pub use proximity::{ProximityMatch, ProximityMatcher};
pub use registry::DiscoveryRegistry;
pub use session::{format_duration, SessionMachine, SessionRecord, SessionState, WalkingSession};
