//! Pattern types, instances, outcomes and the random pattern selector

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Challenge type of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Tap the shown side
    Parry,
    /// Withhold input until the cue finishes
    FakeParry,
    /// Tap the shown side for several links in a row
    ChainParry,
    /// Tap while the oscillating indicator is inside the target zone
    StarCatch,
}

impl PatternType {
    pub const ALL: [PatternType; 4] = [
        PatternType::Parry,
        PatternType::FakeParry,
        PatternType::ChainParry,
        PatternType::StarCatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternType::Parry => "parry",
            PatternType::FakeParry => "fake_parry",
            PatternType::ChainParry => "chain_parry",
            PatternType::StarCatch => "star_catch",
        }
    }
}

/// Screen side of a cue or an input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Side of the screen a pointer coordinate falls on
    pub fn from_pointer(pointer_x: f32, screen_width: f32) -> Self {
        if pointer_x < screen_width / 2.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "LEFT",
            Direction::Right => "RIGHT",
        }
    }
}

/// The single active challenge of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInstance {
    pub kind: PatternType,
    pub direction: Direction,
    /// Correct inputs still needed (ChainParry only, 0 otherwise)
    pub chain_remaining: u32,
    /// Engine time (ms) the instance was spawned or the chain link started
    pub spawn_timestamp: u64,
    /// Round counter, shared by all links of one chain
    pub sequence_order: u64,
}

impl PatternInstance {
    /// Milliseconds since spawn
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.spawn_timestamp)
    }
}

/// Why a round failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    WrongDirection,
    FakeTricked,
    WrongTiming,
    Timeout,
}

/// Failure class of a fail reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The player acted wrongly
    UserInput,
    /// The challenge ran out with no valid input
    Timeout,
}

impl FailReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::WrongDirection => "wrong_direction",
            FailReason::FakeTricked => "fake_tricked",
            FailReason::WrongTiming => "wrong_timing",
            FailReason::Timeout => "timeout",
        }
    }

    pub fn class(&self) -> FailureClass {
        match self {
            FailReason::Timeout => FailureClass::Timeout,
            _ => FailureClass::UserInput,
        }
    }
}

impl std::fmt::Display for FailReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternOutcome {
    Success,
    Fail(FailReason),
}

/// Pick a pattern type and a side, both uniformly
///
/// # Panics
/// Panics if `types` is empty. `Tuning::validate` rejects an empty set.
pub fn select<R: Rng + ?Sized>(types: &[PatternType], rng: &mut R) -> (PatternType, Direction) {
    assert!(!types.is_empty(), "pattern selector needs at least one type");
    let kind = types[rng.random_range(0..types.len())];
    (kind, random_direction(rng))
}

/// Uniform side
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    if rng.random_bool(0.5) {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Number of links of a new chain, uniform in `[min, max]`
pub fn chain_length<R: Rng + ?Sized>(min: u32, max: u32, rng: &mut R) -> u32 {
    if max <= min {
        return min;
    }
    rng.random_range(min..=max)
}
