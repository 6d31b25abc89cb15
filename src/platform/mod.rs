//! Platform abstraction layer
//!
//! Routes engine output to the host's collaborators:
//! - Rendering (frame names only)
//! - Audio cues
//! - Telemetry sink
//! - Navigation to the game-over screen

use crate::audio::AudioSink;
use crate::sim::{Frame, GameEvent, GameOverSummary};
use crate::telemetry::TelemetrySink;

/// Draws named animation frames
pub trait Renderer {
    fn draw(&mut self, frame: Frame);
}

/// Moves the host to the game-over screen
pub trait Navigator {
    fn game_over(&mut self, summary: GameOverSummary);
}

/// Renderer that logs frames, for headless runs
#[derive(Debug, Default)]
pub struct LogRenderer {
    drawn: u64,
}

impl LogRenderer {
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: Frame) {
        self.drawn += 1;
        log::trace!("draw {}", frame);
    }
}

impl Renderer for Vec<Frame> {
    fn draw(&mut self, frame: Frame) {
        self.push(frame);
    }
}

impl Navigator for Option<GameOverSummary> {
    fn game_over(&mut self, summary: GameOverSummary) {
        *self = Some(summary);
    }
}

/// Collaborators a session talks to
pub struct Platform<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub audio: &'a mut dyn AudioSink,
    pub telemetry: &'a mut dyn TelemetrySink,
    pub navigator: &'a mut dyn Navigator,
}

impl Platform<'_> {
    /// Deliver one engine event
    pub fn dispatch(&mut self, event: GameEvent) {
        match event {
            GameEvent::Draw(frame) => self.renderer.draw(frame),
            GameEvent::Audio(cue) => self.audio.play_cue(cue),
            GameEvent::Telemetry(event) => self.telemetry.record(event),
            GameEvent::GameOver(summary) => self.navigator.game_over(summary),
        }
    }

    /// Deliver a drained batch in order. Returns how many were delivered.
    pub fn dispatch_all(&mut self, events: impl IntoIterator<Item = GameEvent>) -> usize {
        let mut count = 0;
        for event in events {
            self.dispatch(event);
            count += 1;
        }
        count
    }
}
