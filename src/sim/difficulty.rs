//! Score-driven difficulty scaling
//!
//! Pure functions of a score snapshot. Callers evaluate them once per spawn
//! (or activation) and keep the result for the whole round.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Timing parameters of one round
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyParams {
    /// Delay between cue animation steps
    pub step_delay_ms: u64,
    /// Rest before the next spawn after a success
    pub next_pattern_delay_ms: u64,
    /// Playback rate of the ready cue
    pub cue_rate: f32,
}

/// Difficulty at the given score
pub fn scale(score: u64, tuning: &Tuning) -> DifficultyParams {
    DifficultyParams {
        step_delay_ms: tuning.step_delay.at(score),
        next_pattern_delay_ms: tuning.next_pattern_delay.at(score),
        cue_rate: tuning.cue_rate.at(score),
    }
}

/// Star-catch indicator speed (track units per tick) at the given score
pub fn star_speed(score: u64, tuning: &Tuning) -> f32 {
    tuning.star_speed.at(score)
}
