//! Scripted player for headless runs
//!
//! Reads the session snapshot each frame and taps like a player with a fixed
//! reaction time. With probability `miss_rate` it botches an instance instead.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::pattern::{Direction, PatternType};
use super::session::{GamePhase, SessionSnapshot};

/// Deterministic bot driven by a seeded RNG
#[derive(Debug)]
pub struct AutoPlayer {
    rng: Pcg32,
    reaction_ms: u64,
    miss_rate: f64,
    screen_width: f32,
    /// (sequence_order, spawn_timestamp) of the instance being handled and
    /// whether this one is a planned miss
    current: Option<((u64, u64), bool)>,
    acted: bool,
}

impl AutoPlayer {
    pub fn new(seed: u64, reaction_ms: u64, miss_rate: f64, screen_width: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            reaction_ms,
            miss_rate: miss_rate.clamp(0.0, 1.0),
            screen_width,
            current: None,
            acted: false,
        }
    }

    pub fn screen_width(&self) -> f32 {
        self.screen_width
    }

    fn x_for(&self, direction: Direction) -> f32 {
        match direction {
            Direction::Left => self.screen_width * 0.25,
            Direction::Right => self.screen_width * 0.75,
        }
    }

    /// Pointer x to tap at `now`, if the bot wants to tap
    pub fn decide(&mut self, snapshot: &SessionSnapshot, now: u64) -> Option<f32> {
        if snapshot.phase != GamePhase::Playing {
            return None;
        }
        let pattern = snapshot.active_pattern?;
        let key = (pattern.sequence_order, pattern.spawn_timestamp);
        let miss = match self.current {
            Some((current, miss)) if current == key => miss,
            _ => {
                let miss = self.rng.random_bool(self.miss_rate);
                self.current = Some((key, miss));
                self.acted = false;
                miss
            }
        };
        if self.acted || !snapshot.input_enabled || pattern.elapsed(now) < self.reaction_ms {
            return None;
        }

        let tap = match pattern.kind {
            PatternType::Parry | PatternType::ChainParry => {
                let side = if miss {
                    pattern.direction.opposite()
                } else {
                    pattern.direction
                };
                Some(self.x_for(side))
            }
            PatternType::FakeParry => miss.then(|| self.x_for(pattern.direction)),
            PatternType::StarCatch => {
                let zone = snapshot.target_zone?;
                let inside = zone.contains(snapshot.indicator_position);
                (inside != miss).then(|| self.x_for(pattern.direction))
            }
        };
        if tap.is_some() {
            self.acted = true;
        }
        tap
    }
}
