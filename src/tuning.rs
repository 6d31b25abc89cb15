//! Game balance tuning
//!
//! Every numeric constant of the engine lives here so the difficulty curve can be
//! adjusted without touching code. Loaded from JSON; missing fields fall back to
//! the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{INDICATOR_MAX, INDICATOR_MIN};
use crate::sim::PatternType;

/// Errors raised while loading or validating tuning
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("no pattern types enabled")]
    NoPatterns,

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TuningError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Stepped delay curve: `max(floor, base - floor(score / interval) * decrement)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayCurve {
    pub base_ms: u64,
    pub floor_ms: u64,
    /// Score points per decrement step
    pub interval: u64,
    pub decrement_ms: u64,
}

impl DelayCurve {
    /// Delay at the given score
    pub fn at(&self, score: u64) -> u64 {
        let steps = score / self.interval.max(1);
        self.base_ms
            .saturating_sub(steps.saturating_mul(self.decrement_ms))
            .max(self.floor_ms)
    }

    fn validate(&self, field: &'static str) -> Result<(), TuningError> {
        if self.floor_ms == 0 {
            return Err(TuningError::invalid(field, "floor must be positive"));
        }
        if self.floor_ms > self.base_ms {
            return Err(TuningError::invalid(
                field,
                format!("floor {} exceeds base {}", self.floor_ms, self.base_ms),
            ));
        }
        if self.interval == 0 {
            return Err(TuningError::invalid(field, "interval must be positive"));
        }
        Ok(())
    }
}

/// Linear capped curve: `min(cap, base + (score / interval) * step)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateCurve {
    pub base: f32,
    /// Score points per `step` increase
    pub interval: f32,
    pub step: f32,
    pub cap: f32,
}

impl RateCurve {
    /// Value at the given score
    pub fn at(&self, score: u64) -> f32 {
        (self.base + (score as f32 / self.interval) * self.step).min(self.cap)
    }

    fn validate(&self, field: &'static str) -> Result<(), TuningError> {
        if !(self.base > 0.0) {
            return Err(TuningError::invalid(field, "base must be positive"));
        }
        if !(self.interval > 0.0) {
            return Err(TuningError::invalid(field, "interval must be positive"));
        }
        if self.step < 0.0 {
            return Err(TuningError::invalid(field, "step must not be negative"));
        }
        if self.cap < self.base {
            return Err(TuningError::invalid(field, "cap is below base"));
        }
        Ok(())
    }
}

/// Complete engine tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Pattern types the selector may pick from
    pub patterns: Vec<PatternType>,

    // === Difficulty ===
    /// Delay between cue animation steps
    pub step_delay: DelayCurve,
    /// Rest between a success and the next spawn
    pub next_pattern_delay: DelayCurve,
    /// Playback rate of the ready cue
    pub cue_rate: RateCurve,

    // === Input ===
    /// Window after spawn during which input is ignored
    pub grace_ms: u64,

    // === Chain parry ===
    pub chain_min: u32,
    pub chain_max: u32,
    /// Pick a fresh side for every chain link
    pub reroll_chain_direction: bool,

    // === Star catch ===
    /// Indicator speed in track units per tick
    pub star_speed: RateCurve,
    pub star_tick_ms: u64,
    /// Width of the catch zone in track units
    pub star_zone_width: f32,
    /// Bounces without input before the catch times out
    pub star_bounce_limit: u32,
    /// Frame delay of the idle animation loop
    pub star_idle_frame_ms: u64,

    // === Effects ===
    /// Frame delay of the success effect
    pub success_frame_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            patterns: PatternType::ALL.to_vec(),

            step_delay: DelayCurve {
                base_ms: 150,
                floor_ms: 60,
                interval: 500,
                decrement_ms: 10,
            },
            next_pattern_delay: DelayCurve {
                base_ms: 400,
                floor_ms: 150,
                interval: 500,
                decrement_ms: 25,
            },
            cue_rate: RateCurve {
                base: 1.0,
                interval: 1000.0,
                step: 0.1,
                cap: 2.0,
            },

            grace_ms: 80,

            chain_min: 2,
            chain_max: 3,
            reroll_chain_direction: true,

            star_speed: RateCurve {
                base: 1.5,
                interval: 2000.0,
                step: 0.25,
                cap: 4.0,
            },
            star_tick_ms: 16,
            star_zone_width: 20.0,
            star_bounce_limit: 4,
            star_idle_frame_ms: 200,

            success_frame_ms: 80,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check that every constant is usable by the engine
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.patterns.is_empty() {
            return Err(TuningError::NoPatterns);
        }
        self.step_delay.validate("step_delay")?;
        self.next_pattern_delay.validate("next_pattern_delay")?;
        self.cue_rate.validate("cue_rate")?;
        self.star_speed.validate("star_speed")?;

        if self.chain_min == 0 {
            return Err(TuningError::invalid("chain_min", "must be at least 1"));
        }
        if self.chain_min > self.chain_max {
            return Err(TuningError::invalid(
                "chain_max",
                format!("{} is below chain_min {}", self.chain_max, self.chain_min),
            ));
        }

        let span = INDICATOR_MAX - INDICATOR_MIN;
        if !(self.star_zone_width > 0.0 && self.star_zone_width < span) {
            return Err(TuningError::invalid(
                "star_zone_width",
                format!("must be within (0, {span})"),
            ));
        }
        if self.star_bounce_limit == 0 {
            return Err(TuningError::invalid("star_bounce_limit", "must be positive"));
        }
        if self.star_tick_ms == 0 {
            return Err(TuningError::invalid("star_tick_ms", "must be positive"));
        }
        if self.star_idle_frame_ms == 0 {
            return Err(TuningError::invalid("star_idle_frame_ms", "must be positive"));
        }
        if self.success_frame_ms == 0 {
            return Err(TuningError::invalid("success_frame_ms", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "grace_ms": 120, "patterns": ["parry"] }"#).unwrap();
        assert_eq!(tuning.grace_ms, 120);
        assert_eq!(tuning.patterns, vec![PatternType::Parry]);
        assert_eq!(tuning.star_bounce_limit, Tuning::default().star_bounce_limit);
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let err = Tuning::from_json(r#"{ "patterns": [] }"#).unwrap_err();
        assert!(matches!(err, TuningError::NoPatterns));
    }

    #[test]
    fn test_inverted_chain_range_rejected() {
        let tuning = Tuning {
            chain_min: 4,
            chain_max: 2,
            ..Default::default()
        };
        let err = tuning.validate().unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "chain_max", .. }));
    }

    #[test]
    fn test_zone_width_must_fit_track() {
        let tuning = Tuning {
            star_zone_width: 100.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_floor_above_base_rejected() {
        let mut tuning = Tuning::default();
        tuning.step_delay.floor_ms = 500;
        let err = tuning.validate().unwrap_err();
        assert!(err.to_string().contains("step_delay"));
    }

    #[test]
    fn test_malformed_json_is_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Json(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_preserves_curves() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }
}
