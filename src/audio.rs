//! Audio cues and playback
//!
//! The engine only emits discrete [`AudioCue`]s. [`AudioManager`] turns them into
//! sample playback on an [`AudioBackend`], applying volume and mute settings and
//! tracking looping samples so a stop-all silences them.

use crate::sim::PatternType;

/// Discrete sound requests from the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    /// A pattern cue starts (played at the difficulty's cue rate)
    PatternReady { pattern: PatternType, rate: f32 },
    /// Parry / chain / fake parry resolved successfully, `variant` in 1..=3
    Success { variant: u8 },
    /// Star catch landed inside the zone
    StarSuccess,
    /// Terminal failure
    Fail,
    /// Correct chain link, `variant` in 1..=3
    ChainClick { variant: u8 },
    /// Star-catch indicator loop starts
    StarLoopStart { rate: f32 },
    StarLoopStop,
    /// Silence everything
    StopAll,
}

/// Receiver of audio cues
pub trait AudioSink {
    fn play_cue(&mut self, cue: AudioCue);
}

impl AudioSink for Vec<AudioCue> {
    fn play_cue(&mut self, cue: AudioCue) {
        self.push(cue);
    }
}

/// Sample playback primitives
pub trait AudioBackend {
    fn play(&mut self, sample: &'static str, rate: f32, volume: f32);
    fn play_loop(&mut self, sample: &'static str, rate: f32, volume: f32);
    fn stop(&mut self, sample: &'static str);
}

/// Sample names
pub mod samples {
    pub const PARRY_READY: &str = "parry_ready";
    pub const FAKE_READY: &str = "fake_ready";
    pub const STAR_SUCCESS: &str = "star_success";
    pub const STAR_MOVE: &str = "star_move";
    pub const GAME_OVER: &str = "game_over";
    pub const PARRY_CLICKS: [&str; 3] = ["parry_click1", "parry_click2", "parry_click3"];
}

fn click_sample(variant: u8) -> &'static str {
    let count = samples::PARRY_CLICKS.len() as u8;
    samples::PARRY_CLICKS[usize::from(variant.clamp(1, count) - 1)]
}

/// Sample a one-shot cue plays, if any
pub fn sample_for(cue: AudioCue) -> Option<&'static str> {
    match cue {
        AudioCue::PatternReady { pattern, .. } => match pattern {
            PatternType::FakeParry => Some(samples::FAKE_READY),
            PatternType::Parry | PatternType::ChainParry => Some(samples::PARRY_READY),
            // The star loop carries its own sound
            PatternType::StarCatch => None,
        },
        AudioCue::Success { variant } | AudioCue::ChainClick { variant } => {
            Some(click_sample(variant))
        }
        AudioCue::StarSuccess => Some(samples::STAR_SUCCESS),
        AudioCue::Fail => Some(samples::GAME_OVER),
        AudioCue::StarLoopStart { .. } => Some(samples::STAR_MOVE),
        AudioCue::StarLoopStop | AudioCue::StopAll => None,
    }
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    /// Looping samples currently playing
    looping: Vec<&'static str>,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            looping: Vec::new(),
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio. Muting stops running loops.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_all();
        }
    }

    /// Get effective volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_looping(&self, sample: &str) -> bool {
        self.looping.iter().any(|s| *s == sample)
    }

    fn stop_all(&mut self) {
        for sample in self.looping.drain(..) {
            self.backend.stop(sample);
        }
    }

    /// Play a cue
    pub fn play(&mut self, cue: AudioCue) {
        match cue {
            AudioCue::StopAll => {
                self.stop_all();
                return;
            }
            AudioCue::StarLoopStop => {
                self.looping.retain(|s| *s != samples::STAR_MOVE);
                self.backend.stop(samples::STAR_MOVE);
                return;
            }
            _ => {}
        }

        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(sample) = sample_for(cue) else { return };

        match cue {
            AudioCue::StarLoopStart { rate } => {
                if !self.looping.contains(&sample) {
                    self.looping.push(sample);
                }
                self.backend.play_loop(sample, rate, vol);
            }
            AudioCue::PatternReady { rate, .. } => self.backend.play(sample, rate, vol),
            _ => self.backend.play(sample, 1.0, vol),
        }
    }
}

impl<B: AudioBackend> AudioSink for AudioManager<B> {
    fn play_cue(&mut self, cue: AudioCue) {
        self.play(cue);
    }
}

/// Backend that only logs, for headless runs
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play(&mut self, sample: &'static str, rate: f32, volume: f32) {
        log::debug!("audio: play {} (rate {:.2}, vol {:.2})", sample, rate, volume);
    }

    fn play_loop(&mut self, sample: &'static str, rate: f32, volume: f32) {
        log::debug!("audio: loop {} (rate {:.2}, vol {:.2})", sample, rate, volume);
    }

    fn stop(&mut self, sample: &'static str) {
        log::debug!("audio: stop {}", sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl AudioBackend for Recorder {
        fn play(&mut self, sample: &'static str, rate: f32, _volume: f32) {
            self.calls.push(format!("play {sample} {rate:.1}"));
        }
        fn play_loop(&mut self, sample: &'static str, rate: f32, _volume: f32) {
            self.calls.push(format!("loop {sample} {rate:.1}"));
        }
        fn stop(&mut self, sample: &'static str) {
            self.calls.push(format!("stop {sample}"));
        }
    }

    #[test]
    fn test_ready_cue_uses_pattern_sample_and_rate() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play(AudioCue::PatternReady {
            pattern: PatternType::FakeParry,
            rate: 1.5,
        });
        audio.play(AudioCue::PatternReady {
            pattern: PatternType::ChainParry,
            rate: 1.0,
        });
        assert_eq!(
            audio.backend().calls,
            vec!["play fake_ready 1.5", "play parry_ready 1.0"]
        );
    }

    #[test]
    fn test_chain_click_variants() {
        assert_eq!(sample_for(AudioCue::ChainClick { variant: 1 }), Some("parry_click1"));
        assert_eq!(sample_for(AudioCue::ChainClick { variant: 3 }), Some("parry_click3"));
        assert_eq!(sample_for(AudioCue::ChainClick { variant: 9 }), Some("parry_click3"));
    }

    #[test]
    fn test_success_plays_a_click_sample() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play(AudioCue::Success { variant: 2 });
        audio.play(AudioCue::StarSuccess);
        assert_eq!(
            audio.backend().calls,
            vec!["play parry_click2 1.0", "play star_success 1.0"]
        );
        for variant in 1..=3 {
            let sample = sample_for(AudioCue::Success { variant }).unwrap();
            assert!(samples::PARRY_CLICKS.contains(&sample));
        }
    }

    #[test]
    fn test_stop_all_stops_loops_once() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.play(AudioCue::StarLoopStart { rate: 1.2 });
        assert!(audio.is_looping(samples::STAR_MOVE));
        audio.play(AudioCue::StopAll);
        audio.play(AudioCue::StopAll);
        assert_eq!(
            audio.backend().calls,
            vec!["loop star_move 1.2", "stop star_move"]
        );
    }

    #[test]
    fn test_muted_plays_nothing() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.set_muted(true);
        audio.play(AudioCue::Success { variant: 1 });
        audio.play(AudioCue::Fail);
        assert!(audio.backend().calls.is_empty());
        assert_eq!(audio.effective_volume(), 0.0);
    }

    #[test]
    fn test_volume_clamped() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.set_master_volume(2.0);
        audio.set_sfx_volume(-1.0);
        assert_eq!(audio.effective_volume(), 0.0);
        audio.set_sfx_volume(0.5);
        assert!((audio.effective_volume() - 0.5).abs() < 1e-6);
    }
}
