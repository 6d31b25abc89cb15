//! Presentation frames and the per-pattern frame catalog

use std::rc::Rc;

use super::pattern::{Direction, PatternType};

/// A presentation asset handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Frame(&'static str);

impl Frame {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Ordered frames, played once or looped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    frames: Rc<[Frame]>,
    looping: bool,
}

impl FrameSequence {
    /// Sequence that completes after its last frame
    pub fn finite(frames: &[Frame]) -> Self {
        Self {
            frames: frames.into(),
            looping: false,
        }
    }

    /// Sequence that wraps around until cancelled
    pub fn looping(frames: &[Frame]) -> Self {
        Self {
            frames: frames.into(),
            looping: true,
        }
    }

    pub fn empty() -> Self {
        Self::finite(&[])
    }

    /// Same frames, looped
    pub fn into_looping(self) -> Self {
        Self {
            looping: true,
            ..self
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Frame> {
        self.frames.get(index).copied()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

const PARRY_LEFT: [Frame; 5] = [
    Frame::new("parry_left_1"),
    Frame::new("parry_left_2"),
    Frame::new("parry_left_3"),
    Frame::new("parry_left_4"),
    Frame::new("parry_left_5"),
];
const PARRY_RIGHT: [Frame; 5] = [
    Frame::new("parry_right_1"),
    Frame::new("parry_right_2"),
    Frame::new("parry_right_3"),
    Frame::new("parry_right_4"),
    Frame::new("parry_right_5"),
];
const FAKE_LEFT: [Frame; 5] = [
    Frame::new("fake_left_1"),
    Frame::new("fake_left_2"),
    Frame::new("fake_left_3"),
    Frame::new("fake_left_4"),
    Frame::new("fake_left_5"),
];
const FAKE_RIGHT: [Frame; 5] = [
    Frame::new("fake_right_1"),
    Frame::new("fake_right_2"),
    Frame::new("fake_right_3"),
    Frame::new("fake_right_4"),
    Frame::new("fake_right_5"),
];
const CHAIN_LEFT: [Frame; 5] = [
    Frame::new("chain_left_1"),
    Frame::new("chain_left_2"),
    Frame::new("chain_left_3"),
    Frame::new("chain_left_4"),
    Frame::new("chain_left_5"),
];
const CHAIN_RIGHT: [Frame; 5] = [
    Frame::new("chain_right_1"),
    Frame::new("chain_right_2"),
    Frame::new("chain_right_3"),
    Frame::new("chain_right_4"),
    Frame::new("chain_right_5"),
];
const SUCCESS: [Frame; 5] = [
    Frame::new("parry_success_1"),
    Frame::new("parry_success_2"),
    Frame::new("parry_success_3"),
    Frame::new("parry_success_4"),
    Frame::new("parry_success_5"),
];
const STAR_IDLE: [Frame; 2] = [Frame::new("starforce_1"), Frame::new("starforce_2")];

/// Frame shown when a round fails
pub const FAIL_FRAME: Frame = Frame::new("parry_fail");

/// Cue animation for a pattern. StarCatch gets its looping idle animation.
pub fn cue(kind: PatternType, direction: Direction) -> FrameSequence {
    let frames: &[Frame] = match (kind, direction) {
        (PatternType::Parry, Direction::Left) => &PARRY_LEFT,
        (PatternType::Parry, Direction::Right) => &PARRY_RIGHT,
        (PatternType::FakeParry, Direction::Left) => &FAKE_LEFT,
        (PatternType::FakeParry, Direction::Right) => &FAKE_RIGHT,
        (PatternType::ChainParry, Direction::Left) => &CHAIN_LEFT,
        (PatternType::ChainParry, Direction::Right) => &CHAIN_RIGHT,
        (PatternType::StarCatch, _) => return FrameSequence::looping(&STAR_IDLE),
    };
    FrameSequence::finite(frames)
}

/// Effect played after a success
pub fn success_effect() -> FrameSequence {
    FrameSequence::finite(&SUCCESS)
}
