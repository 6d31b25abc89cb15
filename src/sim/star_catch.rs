//! Star-catch sub-state-machine
//!
//! An indicator sweeps back and forth across a 0..100 track. The player has to
//! tap while it sits inside a randomly placed target zone. The indicator is
//! clamped to the track bounds; every reversal counts as a bounce.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::pattern::{FailReason, PatternOutcome};
use crate::consts::{INDICATOR_MAX, INDICATOR_MIN};

/// Half-open catch window `[start, start + width)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    pub start: f32,
    pub width: f32,
}

impl TargetZone {
    pub fn end(&self) -> f32 {
        self.start + self.width
    }

    pub fn contains(&self, position: f32) -> bool {
        position >= self.start && position < self.end()
    }

    /// Random zone fully inside the track
    pub fn random<R: Rng + ?Sized>(rng: &mut R, width: f32) -> Self {
        let max_start = (INDICATOR_MAX - INDICATOR_MIN - width).max(0.0);
        let start = INDICATOR_MIN + rng.random_range(0.0..=max_start);
        Self { start, width }
    }
}

/// How an activation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarResolution {
    Success,
    /// Bounce limit reached with no input
    Timeout,
    /// Input outside the zone
    Timing,
}

impl StarResolution {
    pub fn outcome(self) -> PatternOutcome {
        match self {
            StarResolution::Success => PatternOutcome::Success,
            StarResolution::Timeout => PatternOutcome::Fail(FailReason::Timeout),
            StarResolution::Timing => PatternOutcome::Fail(FailReason::WrongTiming),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StarPhase {
    Idle,
    Active,
    Resolved(StarResolution),
}

/// Oscillating indicator and its catch judgment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarCatch {
    phase: StarPhase,
    position: f32,
    /// +1.0 or -1.0
    direction: f32,
    bounce_count: u32,
    bounce_limit: u32,
    /// Track units per tick, fixed at activation
    speed: f32,
    target_zone: TargetZone,
}

impl Default for StarCatch {
    fn default() -> Self {
        Self::new()
    }
}

impl StarCatch {
    pub fn new() -> Self {
        Self {
            phase: StarPhase::Idle,
            position: INDICATOR_MIN,
            direction: 1.0,
            bounce_count: 0,
            bounce_limit: 4,
            speed: 0.0,
            target_zone: TargetZone {
                start: INDICATOR_MIN,
                width: 0.0,
            },
        }
    }

    /// Start a fresh activation
    pub fn activate<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        zone_width: f32,
        speed: f32,
        bounce_limit: u32,
    ) {
        self.phase = StarPhase::Active;
        self.position = INDICATOR_MIN;
        self.direction = 1.0;
        self.bounce_count = 0;
        self.bounce_limit = bounce_limit;
        self.speed = speed;
        self.target_zone = TargetZone::random(rng, zone_width);
        log::debug!(
            "Star catch active: zone [{:.1}, {:.1}), speed {:.2}",
            self.target_zone.start,
            self.target_zone.end(),
            speed
        );
    }

    /// Move the indicator one tick. Returns the timeout resolution if the
    /// bounce limit was reached.
    pub fn tick(&mut self) -> Option<StarResolution> {
        if self.phase != StarPhase::Active {
            return None;
        }

        self.position += self.direction * self.speed;
        if self.position >= INDICATOR_MAX {
            self.position = INDICATOR_MAX;
            self.direction = -1.0;
            self.bounce_count += 1;
        } else if self.position <= INDICATOR_MIN {
            self.position = INDICATOR_MIN;
            self.direction = 1.0;
            self.bounce_count += 1;
        }

        if self.bounce_count >= self.bounce_limit {
            return self.resolve(StarResolution::Timeout);
        }
        None
    }

    /// Judge a tap at the current position
    pub fn catch(&mut self) -> Option<StarResolution> {
        if self.phase != StarPhase::Active {
            return None;
        }
        if self.target_zone.contains(self.position) {
            self.resolve(StarResolution::Success)
        } else {
            self.resolve(StarResolution::Timing)
        }
    }

    /// Abort the activation. Returns false if nothing was running.
    pub fn stop(&mut self) -> bool {
        if self.phase == StarPhase::Active {
            self.phase = StarPhase::Idle;
            true
        } else {
            false
        }
    }

    /// Single exit from `Active`; later resolutions are dropped
    fn resolve(&mut self, resolution: StarResolution) -> Option<StarResolution> {
        if self.phase != StarPhase::Active {
            return None;
        }
        self.phase = StarPhase::Resolved(resolution);
        Some(resolution)
    }

    pub fn phase(&self) -> StarPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == StarPhase::Active
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn bounce_count(&self) -> u32 {
        self.bounce_count
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn target_zone(&self) -> TargetZone {
        self.target_zone
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, position: f32, zone: TargetZone) {
        self.position = position;
        self.target_zone = zone;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn active(speed: f32) -> StarCatch {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut star = StarCatch::new();
        star.activate(&mut rng, 20.0, speed, 4);
        star
    }

    #[test]
    fn test_activation_resets_state() {
        let mut star = active(10.0);
        for _ in 0..15 {
            star.tick();
        }
        let mut rng = Pcg32::seed_from_u64(2);
        star.activate(&mut rng, 20.0, 5.0, 4);
        assert_eq!(star.phase(), StarPhase::Active);
        assert_eq!(star.position(), 0.0);
        assert_eq!(star.bounce_count(), 0);
    }

    #[test]
    fn test_bounce_reverses_and_clamps() {
        let mut star = active(30.0);
        star.tick(); // 30
        star.tick(); // 60
        star.tick(); // 90
        assert_eq!(star.bounce_count(), 0);
        star.tick(); // 120 -> clamped 100, bounce
        assert_eq!(star.position(), 100.0);
        assert_eq!(star.bounce_count(), 1);
        star.tick();
        assert_eq!(star.position(), 70.0);
    }

    #[test]
    fn test_timeout_after_four_bounces() {
        let mut star = active(50.0);
        let mut resolution = None;
        let mut ticks = 0;
        while resolution.is_none() && ticks < 100 {
            resolution = star.tick();
            ticks += 1;
        }
        // 0 -> 50 -> 100(b1) -> 50 -> 0(b2) -> 50 -> 100(b3) -> 50 -> 0(b4)
        assert_eq!(ticks, 8);
        assert_eq!(resolution, Some(StarResolution::Timeout));
        assert_eq!(star.bounce_count(), 4);
        assert_eq!(star.phase(), StarPhase::Resolved(StarResolution::Timeout));
    }

    #[test]
    fn test_catch_inside_zone_succeeds() {
        let mut star = active(1.0);
        star.place(35.0, TargetZone { start: 30.0, width: 20.0 });
        assert_eq!(star.catch(), Some(StarResolution::Success));
    }

    #[test]
    fn test_catch_outside_zone_is_timing_fail() {
        let mut star = active(1.0);
        star.place(50.0, TargetZone { start: 30.0, width: 20.0 });
        assert_eq!(star.catch(), Some(StarResolution::Timing));
        assert_eq!(
            StarResolution::Timing.outcome(),
            PatternOutcome::Fail(FailReason::WrongTiming)
        );
    }

    #[test]
    fn test_only_one_resolution_per_activation() {
        let mut star = active(50.0);
        star.place(40.0, TargetZone { start: 30.0, width: 20.0 });
        assert_eq!(star.catch(), Some(StarResolution::Success));
        for _ in 0..20 {
            assert_eq!(star.tick(), None);
        }
        assert_eq!(star.catch(), None);
        assert_eq!(star.phase(), StarPhase::Resolved(StarResolution::Success));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut star = active(1.0);
        assert!(star.stop());
        assert!(!star.stop());
        assert_eq!(star.tick(), None);
        assert_eq!(star.catch(), None);
    }

    proptest! {
        #[test]
        fn prop_zone_inside_track(seed in any::<u64>(), width in 1.0f32..99.0) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let zone = TargetZone::random(&mut rng, width);
            prop_assert!(zone.start >= INDICATOR_MIN);
            prop_assert!(zone.end() <= INDICATOR_MAX + 1e-3);
        }

        #[test]
        fn prop_position_stays_on_track(speed in 0.5f32..40.0, ticks in 1usize..400) {
            let mut star = active(speed);
            let mut previous = star.bounce_count();
            for _ in 0..ticks {
                star.tick();
                prop_assert!(star.position() >= INDICATOR_MIN && star.position() <= INDICATOR_MAX);
                prop_assert!(star.bounce_count() >= previous);
                previous = star.bounce_count();
            }
            prop_assert!(star.bounce_count() <= 4);
        }
    }
}
