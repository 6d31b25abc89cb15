//! Parry Rush - A reaction-timing arcade challenge
//!
//! Core modules:
//! - `sim`: Deterministic reaction pattern engine (scheduler, patterns, session)
//! - `platform`: Render/navigation collaborator traits and event routing
//! - `audio`: Audio cues and the volume-aware audio manager
//! - `telemetry`: Structured gameplay events and the batching queue
//! - `ranking`: In-memory ranking board with nickname ownership
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod platform;
pub mod ranking;
pub mod sim;
pub mod telemetry;
pub mod tuning;

pub use ranking::RankingBoard;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Score awarded for every resolved pattern
    pub const SCORE_PER_SUCCESS: u64 = 100;

    /// Star-catch indicator travel range
    pub const INDICATOR_MIN: f32 = 0.0;
    pub const INDICATOR_MAX: f32 = 100.0;

    /// Number of chain-click sample variants
    pub const CHAIN_CLICK_VARIANTS: u8 = 3;

    /// First sequence order handed out in a game
    pub const FIRST_SEQUENCE_ORDER: u64 = 1;
}
