//! Input arbitration
//!
//! Maps a pointer position to a side and judges it against the active pattern.
//! The gate latches on the first accepted input so repeated events for the same
//! instance are dropped.

use super::pattern::{Direction, FailReason, PatternInstance, PatternOutcome, PatternType};
use super::star_catch::{StarCatch, StarResolution};

/// Input gate of the active instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Spawned, grace period still running
    Grace,
    /// Accepting input
    Open,
    /// Input consumed or pattern resolved
    Consumed,
}

/// Why an input was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotPlaying,
    NoActivePattern,
    GracePeriod,
    AlreadyConsumed,
}

/// Result of judging one input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The pattern is resolved
    Resolve(PatternOutcome),
    /// Correct chain link, more links to go
    ChainLink { remaining: u32 },
    Ignored(IgnoreReason),
}

/// Judges pointer input against the active pattern
#[derive(Debug, Clone)]
pub struct InputArbiter {
    grace_ms: u64,
    gate: Gate,
}

impl InputArbiter {
    pub fn new(grace_ms: u64) -> Self {
        Self {
            grace_ms,
            gate: Gate::Consumed,
        }
    }

    pub fn grace_ms(&self) -> u64 {
        self.grace_ms
    }

    /// New instance spawned: wait for the grace period
    pub fn arm(&mut self) {
        self.gate = Gate::Grace;
    }

    /// Grace period elapsed
    pub fn open(&mut self) {
        if self.gate == Gate::Grace {
            self.gate = Gate::Open;
        }
    }

    /// Stop accepting input for the current instance
    pub fn latch(&mut self) {
        self.gate = Gate::Consumed;
    }

    pub fn gate(&self) -> Gate {
        self.gate
    }

    pub fn is_enabled(&self) -> bool {
        self.gate == Gate::Open
    }

    pub fn is_consumed(&self) -> bool {
        self.gate == Gate::Consumed
    }

    /// Judge a tap at `pointer_x` against the active pattern.
    ///
    /// Accepting an input latches the gate before dispatching on the pattern
    /// type. A correct chain link decrements `chain_remaining` in place.
    pub fn judge(
        &mut self,
        pattern: Option<&mut PatternInstance>,
        star: &mut StarCatch,
        pointer_x: f32,
        screen_width: f32,
        now: u64,
    ) -> Verdict {
        let Some(pattern) = pattern else {
            return Verdict::Ignored(IgnoreReason::NoActivePattern);
        };
        if pattern.elapsed(now) < self.grace_ms {
            return Verdict::Ignored(IgnoreReason::GracePeriod);
        }
        if self.gate != Gate::Open {
            return Verdict::Ignored(IgnoreReason::AlreadyConsumed);
        }
        self.latch();

        let side = Direction::from_pointer(pointer_x, screen_width);
        match pattern.kind {
            PatternType::Parry => {
                if side == pattern.direction {
                    Verdict::Resolve(PatternOutcome::Success)
                } else {
                    Verdict::Resolve(PatternOutcome::Fail(FailReason::WrongDirection))
                }
            }
            PatternType::FakeParry => Verdict::Resolve(PatternOutcome::Fail(FailReason::FakeTricked)),
            PatternType::ChainParry => {
                if side != pattern.direction {
                    return Verdict::Resolve(PatternOutcome::Fail(FailReason::WrongDirection));
                }
                pattern.chain_remaining = pattern.chain_remaining.saturating_sub(1);
                if pattern.chain_remaining == 0 {
                    Verdict::Resolve(PatternOutcome::Success)
                } else {
                    Verdict::ChainLink {
                        remaining: pattern.chain_remaining,
                    }
                }
            }
            PatternType::StarCatch => match star.catch() {
                Some(resolution) => Verdict::Resolve(resolution.outcome()),
                None => Verdict::Ignored(IgnoreReason::AlreadyConsumed),
            },
        }
    }
}

/// Timer-driven resolution of a cue that ran to completion with no input
pub fn cue_exhausted(kind: PatternType) -> Option<PatternOutcome> {
    match kind {
        PatternType::Parry | PatternType::ChainParry => {
            Some(PatternOutcome::Fail(FailReason::Timeout))
        }
        PatternType::FakeParry => Some(PatternOutcome::Success),
        // Looping idle animation; the bounce limit ends the round
        PatternType::StarCatch => None,
    }
}

/// Map a star-catch tick result to a pattern outcome
pub fn star_tick_outcome(resolution: Option<StarResolution>) -> Option<PatternOutcome> {
    resolution.map(StarResolution::outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::star_catch::TargetZone;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const WIDTH: f32 = 1000.0;
    const LEFT_X: f32 = 100.0;
    const RIGHT_X: f32 = 900.0;

    fn instance(kind: PatternType, direction: Direction, chain: u32) -> PatternInstance {
        PatternInstance {
            kind,
            direction,
            chain_remaining: chain,
            spawn_timestamp: 1000,
            sequence_order: 1,
        }
    }

    fn open_arbiter() -> InputArbiter {
        let mut arbiter = InputArbiter::new(80);
        arbiter.arm();
        arbiter.open();
        arbiter
    }

    #[test]
    fn test_parry_matching_side_succeeds() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::Parry, Direction::Left, 0);
        let v = arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::Resolve(PatternOutcome::Success));
        assert!(arbiter.is_consumed());
    }

    #[test]
    fn test_parry_wrong_side_fails() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::Parry, Direction::Left, 0);
        let v = arbiter.judge(Some(&mut p), &mut star, RIGHT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::Resolve(PatternOutcome::Fail(FailReason::WrongDirection)));
    }

    #[test]
    fn test_fake_parry_any_input_fails() {
        for x in [LEFT_X, RIGHT_X] {
            let mut arbiter = open_arbiter();
            let mut star = StarCatch::new();
            let mut p = instance(PatternType::FakeParry, Direction::Right, 0);
            let v = arbiter.judge(Some(&mut p), &mut star, x, WIDTH, 1200);
            assert_eq!(v, Verdict::Resolve(PatternOutcome::Fail(FailReason::FakeTricked)));
        }
    }

    #[test]
    fn test_chain_decrements_only_on_correct_side() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::ChainParry, Direction::Right, 3);
        let v = arbiter.judge(Some(&mut p), &mut star, RIGHT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::ChainLink { remaining: 2 });
        assert_eq!(p.chain_remaining, 2);

        let mut arbiter = open_arbiter();
        let v = arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1300);
        assert_eq!(v, Verdict::Resolve(PatternOutcome::Fail(FailReason::WrongDirection)));
        assert_eq!(p.chain_remaining, 2);
    }

    #[test]
    fn test_chain_last_link_succeeds() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::ChainParry, Direction::Left, 1);
        let v = arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::Resolve(PatternOutcome::Success));
    }

    #[test]
    fn test_grace_period_ignores_input() {
        let mut arbiter = InputArbiter::new(80);
        arbiter.arm();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::Parry, Direction::Left, 0);
        let v = arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1079);
        assert_eq!(v, Verdict::Ignored(IgnoreReason::GracePeriod));
        assert_eq!(arbiter.gate(), Gate::Grace);
    }

    #[test]
    fn test_second_input_is_dropped() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let mut p = instance(PatternType::Parry, Direction::Left, 0);
        arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1200);
        let v = arbiter.judge(Some(&mut p), &mut star, LEFT_X, WIDTH, 1201);
        assert_eq!(v, Verdict::Ignored(IgnoreReason::AlreadyConsumed));
    }

    #[test]
    fn test_no_pattern_is_noop() {
        let mut arbiter = open_arbiter();
        let mut star = StarCatch::new();
        let v = arbiter.judge(None, &mut star, LEFT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::Ignored(IgnoreReason::NoActivePattern));
        assert!(arbiter.is_enabled());
    }

    #[test]
    fn test_star_catch_delegates_to_controller() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut star = StarCatch::new();
        star.activate(&mut rng, 20.0, 2.0, 4);
        star.place(12.0, TargetZone { start: 10.0, width: 20.0 });

        let mut arbiter = open_arbiter();
        let mut p = instance(PatternType::StarCatch, Direction::Left, 0);
        // Side does not matter for star catch
        let v = arbiter.judge(Some(&mut p), &mut star, RIGHT_X, WIDTH, 1200);
        assert_eq!(v, Verdict::Resolve(PatternOutcome::Success));
    }

    #[test]
    fn test_cue_exhaustion_outcomes() {
        assert_eq!(
            cue_exhausted(PatternType::Parry),
            Some(PatternOutcome::Fail(FailReason::Timeout))
        );
        assert_eq!(cue_exhausted(PatternType::FakeParry), Some(PatternOutcome::Success));
        assert_eq!(cue_exhausted(PatternType::StarCatch), None);
    }
}
