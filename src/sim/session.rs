//! Game session controller
//!
//! Owns the scheduler, the active pattern, the input gate and the star-catch
//! controller. Everything that happens in a game goes through one dispatch loop:
//! due timer events are popped in time order and mapped to transitions, and
//! player input is arbitrated only after every timer due at its timestamp has
//! been processed. Collaborator traffic is queued as [`GameEvent`]s for the host
//! to drain.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::difficulty::{self, DifficultyParams};
use super::frames::{self, FAIL_FRAME, Frame};
use super::input::{self, IgnoreReason, InputArbiter, Verdict};
use super::pattern::{self, FailReason, PatternInstance, PatternOutcome, PatternType};
use super::scheduler::{CancelHandle, Scheduler, TimerEvent, TimerKind, Track};
use super::star_catch::{StarCatch, TargetZone};
use crate::audio::AudioCue;
use crate::consts::{CHAIN_CLICK_VARIANTS, FIRST_SEQUENCE_ORDER, SCORE_PER_SUCCESS};
use crate::telemetry::{EventName, TelemetryEvent};
use crate::tuning::{Tuning, TuningError};

/// Top-level game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Created, waiting for `start`
    Ready,
    /// Patterns are being spawned and resolved
    Playing,
    /// A pattern failed; terminal
    GameOver,
}

/// Final result handed to the navigation collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverSummary {
    pub final_score: u64,
    pub fail_reason: FailReason,
}

/// Output of the engine, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Draw(Frame),
    Audio(AudioCue),
    Telemetry(TelemetryEvent),
    GameOver(GameOverSummary),
}

/// Who is playing, for telemetry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub session_id: String,
    /// 1-based game counter within the session
    pub game_index: u32,
}

impl SessionIdentity {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            game_index: 1,
        }
    }
}

/// Read-only view of the session for the UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub phase: GamePhase,
    pub score: u64,
    pub active_pattern: Option<PatternInstance>,
    pub input_enabled: bool,
    pub bounce_count: u32,
    pub indicator_position: f32,
    pub target_zone: Option<TargetZone>,
    pub difficulty: DifficultyParams,
}

/// What happened to an input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputResult {
    Ignored(IgnoreReason),
    /// Correct chain link, the chain continues
    ChainAdvanced { remaining: u32 },
    Resolved(PatternOutcome),
}

/// One game: spawn, arbitrate, resolve, repeat until a failure
#[derive(Debug)]
pub struct GameSession {
    tuning: Tuning,
    identity: SessionIdentity,
    rng: Pcg32,
    phase: GamePhase,
    score: u64,
    difficulty: DifficultyParams,
    active: Option<PatternInstance>,
    arbiter: InputArbiter,
    star: StarCatch,
    scheduler: Scheduler,
    /// Cue timer of the active pattern (not of effects)
    pattern_cue: Option<CancelHandle>,
    next_sequence_order: u64,
    /// Engine time of the last processed event
    now: u64,
    events: Vec<GameEvent>,
    summary: Option<GameOverSummary>,
    torn_down: bool,
}

impl GameSession {
    /// Create a session in `Ready`. The tuning is validated here so the engine
    /// itself never meets an unusable constant.
    pub fn new(tuning: Tuning, identity: SessionIdentity, seed: u64) -> Result<Self, TuningError> {
        tuning.validate()?;
        let difficulty = difficulty::scale(0, &tuning);
        let arbiter = InputArbiter::new(tuning.grace_ms);
        Ok(Self {
            tuning,
            identity,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Ready,
            score: 0,
            difficulty,
            active: None,
            arbiter,
            star: StarCatch::new(),
            scheduler: Scheduler::new(),
            pattern_cue: None,
            next_sequence_order: FIRST_SEQUENCE_ORDER,
            now: 0,
            events: Vec::new(),
            summary: None,
            torn_down: false,
        })
    }

    /// Fresh game for a retry: same player, next game index, new seed.
    /// This session is torn down first.
    pub fn next_game(&mut self) -> Result<GameSession, TuningError> {
        self.teardown();
        let identity = SessionIdentity {
            session_id: self.identity.session_id.clone(),
            game_index: self.identity.game_index + 1,
        };
        let seed = self.rng.next_u64();
        GameSession::new(self.tuning.clone(), identity, seed)
    }

    // === Lifecycle ===

    /// `Ready -> Playing`, spawning the first pattern at `now`
    pub fn start(&mut self, now: u64) -> bool {
        if self.phase != GamePhase::Ready {
            log::warn!("start() ignored in phase {:?}", self.phase);
            return false;
        }
        self.now = now;
        self.phase = GamePhase::Playing;
        log::info!(
            "Game {} started (session {})",
            self.identity.game_index,
            self.identity.session_id
        );
        self.spawn(now);
        self.advance(now);
        true
    }

    /// Process every timer due at or before `now`
    pub fn advance(&mut self, now: u64) {
        let now = now.max(self.now);
        while let Some(event) = self.scheduler.pop_due(now) {
            self.now = event.at;
            self.dispatch(event);
        }
        self.now = now;
    }

    /// Pointer/tap at `pointer_x` on a screen `screen_width` wide
    pub fn handle_input(&mut self, pointer_x: f32, screen_width: f32, now: u64) -> InputResult {
        self.advance(now);
        if self.phase != GamePhase::Playing {
            return InputResult::Ignored(IgnoreReason::NotPlaying);
        }

        let verdict = self.arbiter.judge(
            self.active.as_mut(),
            &mut self.star,
            pointer_x,
            screen_width,
            self.now,
        );
        match verdict {
            Verdict::Ignored(reason) => {
                log::trace!("Input at {} ignored: {:?}", self.now, reason);
                InputResult::Ignored(reason)
            }
            Verdict::ChainLink { remaining } => {
                self.advance_chain(remaining);
                self.advance(now);
                InputResult::ChainAdvanced { remaining }
            }
            Verdict::Resolve(outcome) => {
                self.resolve(outcome);
                self.advance(now);
                InputResult::Resolved(outcome)
            }
        }
    }

    /// Stop everything. Safe to call any number of times.
    pub fn teardown(&mut self) {
        self.cancel_timers();
        self.arbiter.latch();
        self.active = None;
        if !self.torn_down {
            self.torn_down = true;
            self.events.push(GameEvent::Audio(AudioCue::StopAll));
            log::debug!("Session torn down at score {}", self.score);
        }
    }

    /// Take all queued collaborator events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // === Dispatch ===

    fn dispatch(&mut self, event: TimerEvent) {
        match (event.track(), event.kind) {
            (Track::Cue, TimerKind::Step(frame)) => self.events.push(GameEvent::Draw(frame)),
            (Track::Cue, TimerKind::Complete) => self.on_cue_complete(event.handle),
            (Track::Grace, TimerKind::Complete) => {
                if self.active.is_some() {
                    self.arbiter.open();
                }
            }
            (Track::Star, TimerKind::Tick) => {
                if let Some(outcome) = input::star_tick_outcome(self.star.tick()) {
                    self.resolve(outcome);
                }
            }
            (Track::Spawn, TimerKind::Complete) => self.spawn(event.at),
            (track, kind) => log::trace!("Unhandled timer event {:?} on {:?}", kind, track),
        }
    }

    fn on_cue_complete(&mut self, handle: CancelHandle) {
        if self.pattern_cue != Some(handle) {
            // Effect sequence finished
            return;
        }
        self.pattern_cue = None;
        let Some(active) = self.active else { return };
        if self.arbiter.is_consumed() {
            return;
        }
        if let Some(outcome) = input::cue_exhausted(active.kind) {
            self.arbiter.latch();
            self.resolve(outcome);
        }
    }

    // === Transitions ===

    fn spawn(&mut self, now: u64) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.cancel_timers();

        self.difficulty = difficulty::scale(self.score, &self.tuning);
        let (kind, direction) = pattern::select(&self.tuning.patterns, &mut self.rng);
        let chain_remaining = if kind == PatternType::ChainParry {
            pattern::chain_length(self.tuning.chain_min, self.tuning.chain_max, &mut self.rng)
        } else {
            0
        };
        let instance = PatternInstance {
            kind,
            direction,
            chain_remaining,
            spawn_timestamp: now,
            sequence_order: self.next_sequence_order,
        };
        self.next_sequence_order += 1;
        self.active = Some(instance);
        self.arm_instance(now);

        let mut star_speed = None;
        if kind == PatternType::StarCatch {
            let speed = difficulty::star_speed(self.score, &self.tuning);
            star_speed = Some(speed);
            self.star.activate(
                &mut self.rng,
                self.tuning.star_zone_width,
                speed,
                self.tuning.star_bounce_limit,
            );
            self.scheduler
                .schedule_interval(Track::Star, self.tuning.star_tick_ms, now);
            self.pattern_cue = Some(self.scheduler.schedule_loop(
                Track::Cue,
                frames::cue(kind, direction),
                self.tuning.star_idle_frame_ms,
                now,
            ));
            self.events.push(GameEvent::Audio(AudioCue::StarLoopStart {
                rate: self.difficulty.cue_rate,
            }));
        } else {
            self.start_cue(&instance, now);
        }

        log::debug!(
            "Spawned #{} {} {} (chain {}, step {}ms)",
            instance.sequence_order,
            kind.as_str(),
            direction.as_str(),
            chain_remaining,
            self.difficulty.step_delay_ms
        );
        let mut event = self.telemetry(EventName::PatternSpawn, &instance, now);
        event.star_speed = star_speed;
        self.events.push(GameEvent::Telemetry(event));
    }

    /// Grace timer for a freshly started instance or chain link
    fn arm_instance(&mut self, now: u64) {
        self.arbiter.arm();
        self.scheduler
            .schedule_once(Track::Grace, self.tuning.grace_ms, now);
    }

    fn start_cue(&mut self, instance: &PatternInstance, now: u64) {
        self.pattern_cue = Some(self.scheduler.schedule(
            Track::Cue,
            frames::cue(instance.kind, instance.direction),
            self.difficulty.step_delay_ms,
            now,
        ));
        self.events.push(GameEvent::Audio(AudioCue::PatternReady {
            pattern: instance.kind,
            rate: self.difficulty.cue_rate,
        }));
    }

    fn advance_chain(&mut self, remaining: u32) {
        let Some(current) = self.active else { return };
        let now = self.now;
        let direction = if self.tuning.reroll_chain_direction {
            pattern::random_direction(&mut self.rng)
        } else {
            current.direction
        };
        let variant = self.rng.random_range(1..=CHAIN_CLICK_VARIANTS);
        self.events
            .push(GameEvent::Audio(AudioCue::ChainClick { variant }));

        let link = PatternInstance {
            direction,
            chain_remaining: remaining,
            spawn_timestamp: now,
            ..current
        };
        self.active = Some(link);
        self.arm_instance(now);
        self.start_cue(&link, now);
        log::debug!(
            "Chain #{} link ok, {} left, next {}",
            link.sequence_order,
            remaining,
            direction.as_str()
        );
    }

    fn resolve(&mut self, outcome: PatternOutcome) {
        match outcome {
            PatternOutcome::Success => self.on_success(),
            PatternOutcome::Fail(reason) => self.on_fail(reason),
        }
    }

    fn on_success(&mut self) {
        let Some(instance) = self.active.take() else { return };
        let now = self.now;
        self.arbiter.latch();
        self.cancel_timers();

        self.score += SCORE_PER_SUCCESS;

        if instance.kind == PatternType::StarCatch {
            self.events.push(GameEvent::Audio(AudioCue::StarLoopStop));
            self.events.push(GameEvent::Audio(AudioCue::StarSuccess));
        } else {
            let variant = self.rng.random_range(1..=CHAIN_CLICK_VARIANTS);
            self.events
                .push(GameEvent::Audio(AudioCue::Success { variant }));
        }

        // Reports the delay the instance ran with, before rescaling
        let mut event = self.telemetry(EventName::PatternSuccess, &instance, now);
        event.reaction_time_ms = Some(instance.elapsed(now));
        self.events.push(GameEvent::Telemetry(event));

        self.difficulty = difficulty::scale(self.score, &self.tuning);

        self.scheduler.schedule(
            Track::Cue,
            frames::success_effect(),
            self.tuning.success_frame_ms,
            now,
        );
        self.scheduler
            .schedule_once(Track::Spawn, self.difficulty.next_pattern_delay_ms, now);

        log::debug!(
            "Pattern #{} cleared, score {}, next in {}ms",
            instance.sequence_order,
            self.score,
            self.difficulty.next_pattern_delay_ms
        );
    }

    fn on_fail(&mut self, reason: FailReason) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let now = self.now;
        self.arbiter.latch();
        self.cancel_timers();
        let instance = self.active.take();

        self.events.push(GameEvent::Audio(AudioCue::StopAll));
        self.events.push(GameEvent::Audio(AudioCue::Fail));
        self.events.push(GameEvent::Draw(FAIL_FRAME));

        if let Some(instance) = instance {
            let mut event = self.telemetry(EventName::PatternFail, &instance, now);
            event.reaction_time_ms = Some(instance.elapsed(now));
            event.fail_reason = Some(reason);
            self.events.push(GameEvent::Telemetry(event));
        }

        let summary = GameOverSummary {
            final_score: self.score,
            fail_reason: reason,
        };
        self.phase = GamePhase::GameOver;
        self.summary = Some(summary);
        self.events.push(GameEvent::GameOver(summary));
        log::info!(
            "Game {} over: score {}, reason {}",
            self.identity.game_index,
            self.score,
            reason
        );
    }

    /// Cancel every timer and the star controller
    fn cancel_timers(&mut self) {
        let cancelled = self.scheduler.cancel_all();
        self.pattern_cue = None;
        if self.star.stop() {
            log::trace!("Star catch aborted");
        }
        if cancelled > 0 {
            log::trace!("Cancelled {} timers", cancelled);
        }
    }

    fn telemetry(&self, name: EventName, instance: &PatternInstance, now: u64) -> TelemetryEvent {
        TelemetryEvent {
            event_name: name,
            event_time: now,
            session_id: self.identity.session_id.clone(),
            game_index: self.identity.game_index,
            pattern_type: instance.kind,
            direction: instance.direction,
            sequence_order: instance.sequence_order,
            delay_ms: self.difficulty.step_delay_ms,
            reaction_time_ms: None,
            fail_reason: None,
            score: self.score,
            star_speed: None,
        }
    }

    // === Accessors ===

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn active_pattern(&self) -> Option<&PatternInstance> {
        self.active.as_ref()
    }

    pub fn input_enabled(&self) -> bool {
        self.arbiter.is_enabled()
    }

    pub fn difficulty(&self) -> DifficultyParams {
        self.difficulty
    }

    pub fn star(&self) -> &StarCatch {
        &self.star
    }

    pub fn summary(&self) -> Option<GameOverSummary> {
        self.summary
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Timers currently outstanding
    pub fn pending_timers(&self) -> usize {
        self.scheduler.active_count()
    }

    /// Earliest pending timer, for hosts that sleep between events
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let star_running = self.star.is_active();
        SessionSnapshot {
            phase: self.phase,
            score: self.score,
            active_pattern: self.active,
            input_enabled: self.arbiter.is_enabled(),
            bounce_count: self.star.bounce_count(),
            indicator_position: self.star.position(),
            target_zone: star_running.then(|| self.star.target_zone()),
            difficulty: self.difficulty,
        }
    }

    #[cfg(test)]
    pub(crate) fn star_mut(&mut self) -> &mut StarCatch {
        &mut self.star
    }
}
