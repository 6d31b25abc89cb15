//! Cancellable timing scheduler
//!
//! Timers live on a fixed set of tracks, one outstanding timer per track.
//! Scheduling on a busy track replaces (cancels) the timer already there, so two
//! timers can never drive the same target. Time is the engine's virtual
//! millisecond clock: the owner pops due events one at a time with
//! [`Scheduler::pop_due`] and is free to reschedule between events.

use super::frames::{Frame, FrameSequence};

/// Logical timer lanes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    /// Cue animation or effect frames (the render target)
    Cue,
    /// Post-spawn grace period
    Grace,
    /// Star-catch indicator movement
    Star,
    /// Delay until the next spawn
    Spawn,
}

impl Track {
    pub const COUNT: usize = 4;

    pub const ALL: [Track; Track::COUNT] = [Track::Cue, Track::Grace, Track::Star, Track::Spawn];

    fn index(self) -> usize {
        match self {
            Track::Cue => 0,
            Track::Grace => 1,
            Track::Star => 2,
            Track::Spawn => 3,
        }
    }
}

/// Identifies one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelHandle {
    track: Track,
    id: u64,
}

impl CancelHandle {
    pub fn track(&self) -> Track {
        self.track
    }
}

/// What a due timer produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Next frame of a sequence
    Step(Frame),
    /// Interval elapsed
    Tick,
    /// Sequence exhausted or one-shot delay elapsed
    Complete,
}

/// A due timer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub handle: CancelHandle,
    /// Engine time the event was due
    pub at: u64,
    pub kind: TimerKind,
}

impl TimerEvent {
    pub fn track(&self) -> Track {
        self.handle.track
    }
}

#[derive(Debug, Clone)]
enum Plan {
    Frames { sequence: FrameSequence, index: usize },
    Interval,
    Once,
}

#[derive(Debug, Clone)]
struct Timer {
    id: u64,
    delay_ms: u64,
    due: u64,
    plan: Plan,
}

/// Per-session timer owner
#[derive(Debug, Default)]
pub struct Scheduler {
    slots: [Option<Timer>; Track::COUNT],
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step through `sequence`, one frame per `delay_ms`, starting at `now`.
    ///
    /// A finite sequence completes `delay_ms` after its last frame; an empty one
    /// completes at `now` without stepping. A looping sequence never completes.
    pub fn schedule(
        &mut self,
        track: Track,
        sequence: FrameSequence,
        delay_ms: u64,
        now: u64,
    ) -> CancelHandle {
        let delay_ms = if sequence.is_looping() {
            delay_ms.max(1)
        } else {
            delay_ms
        };
        if sequence.is_looping() && sequence.is_empty() {
            // Nothing to show and nothing to complete; just clear the track
            self.cancel_track(track);
            return self.reserve(track);
        }
        self.install(
            track,
            delay_ms,
            now,
            Plan::Frames {
                sequence,
                index: 0,
            },
        )
    }

    /// Loop `sequence` until cancelled
    pub fn schedule_loop(
        &mut self,
        track: Track,
        sequence: FrameSequence,
        delay_ms: u64,
        now: u64,
    ) -> CancelHandle {
        self.schedule(track, sequence.into_looping(), delay_ms, now)
    }

    /// Fire a single `Complete` after `delay_ms`
    pub fn schedule_once(&mut self, track: Track, delay_ms: u64, now: u64) -> CancelHandle {
        self.install(track, delay_ms, now.saturating_add(delay_ms), Plan::Once)
    }

    /// Fire `Tick` every `period_ms` until cancelled
    pub fn schedule_interval(&mut self, track: Track, period_ms: u64, now: u64) -> CancelHandle {
        let period_ms = period_ms.max(1);
        self.install(track, period_ms, now.saturating_add(period_ms), Plan::Interval)
    }

    fn reserve(&mut self, track: Track) -> CancelHandle {
        let id = self.next_id;
        self.next_id += 1;
        CancelHandle { track, id }
    }

    fn install(&mut self, track: Track, delay_ms: u64, due: u64, plan: Plan) -> CancelHandle {
        if self.cancel_track(track) {
            log::trace!("Replaced outstanding timer on {:?}", track);
        }
        let handle = self.reserve(track);
        self.slots[track.index()] = Some(Timer {
            id: handle.id,
            delay_ms,
            due,
            plan,
        });
        handle
    }

    /// Cancel a specific timer. Returns false if it already finished, was
    /// cancelled, or was replaced.
    pub fn cancel(&mut self, handle: CancelHandle) -> bool {
        let slot = &mut self.slots[handle.track.index()];
        if slot.as_ref().is_some_and(|t| t.id == handle.id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Cancel whatever runs on `track`
    pub fn cancel_track(&mut self, track: Track) -> bool {
        self.slots[track.index()].take().is_some()
    }

    /// Cancel every track. Returns how many timers were running.
    pub fn cancel_all(&mut self) -> usize {
        self.slots.iter_mut().filter_map(Option::take).count()
    }

    pub fn is_active(&self, handle: CancelHandle) -> bool {
        self.slots[handle.track.index()]
            .as_ref()
            .is_some_and(|t| t.id == handle.id)
    }

    pub fn is_track_busy(&self, track: Track) -> bool {
        self.slots[track.index()].is_some()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Earliest due time over all tracks
    pub fn next_due(&self) -> Option<u64> {
        self.slots.iter().flatten().map(|t| t.due).min()
    }

    /// Pop the earliest event due at or before `now`.
    ///
    /// Ties go to the timer scheduled first.
    pub fn pop_due(&mut self, now: u64) -> Option<TimerEvent> {
        let track = Track::ALL
            .into_iter()
            .filter_map(|track| {
                self.slots[track.index()]
                    .as_ref()
                    .filter(|t| t.due <= now)
                    .map(|t| (t.due, t.id, track))
            })
            .min_by_key(|&(due, id, _)| (due, id))
            .map(|(_, _, track)| track)?;

        let slot = &mut self.slots[track.index()];
        let timer = slot.as_mut()?;
        let handle = CancelHandle {
            track,
            id: timer.id,
        };
        let at = timer.due;
        let next_due = at.saturating_add(timer.delay_ms);

        let (kind, finished) = match &mut timer.plan {
            Plan::Frames { sequence, index } => {
                if *index >= sequence.len() && sequence.is_looping() {
                    *index = 0;
                }
                match sequence.get(*index) {
                    Some(frame) => {
                        *index += 1;
                        (TimerKind::Step(frame), false)
                    }
                    None => (TimerKind::Complete, true),
                }
            }
            Plan::Interval => (TimerKind::Tick, false),
            Plan::Once => (TimerKind::Complete, true),
        };

        if finished {
            *slot = None;
        } else {
            timer.due = next_due;
        }

        Some(TimerEvent { handle, at, kind })
    }
}
