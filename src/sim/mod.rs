//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual millisecond clock supplied by the host
//! - Seeded RNG only
//! - One dispatch loop, timer events popped in (due, id) order
//! - No rendering or platform dependencies

pub mod autoplay;
pub mod difficulty;
pub mod frames;
pub mod input;
pub mod pattern;
pub mod scheduler;
pub mod session;
pub mod star_catch;

pub use autoplay::AutoPlayer;
pub use difficulty::DifficultyParams;
pub use frames::{Frame, FrameSequence};
pub use input::{IgnoreReason, InputArbiter, Verdict};
pub use pattern::{
    Direction, FailReason, FailureClass, PatternInstance, PatternOutcome, PatternType,
};
pub use scheduler::{CancelHandle, Scheduler, TimerEvent, TimerKind, Track};
pub use session::{
    GameEvent, GameOverSummary, GamePhase, GameSession, InputResult, SessionIdentity,
    SessionSnapshot,
};
pub use star_catch::{StarCatch, StarPhase, StarResolution, TargetZone};
