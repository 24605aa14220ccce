//! ABOUTME: Frame-skip gating and block-count classification into a motion state
//! ABOUTME: Two-state machine re-evaluated once per evaluated frame, no debounce

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Binary motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MotionState {
    #[default]
    NoMotion,
    Motion,
}

impl MotionState {
    pub fn is_motion(self) -> bool {
        matches!(self, Self::Motion)
    }
}

impl From<MotionState> for bool {
    fn from(state: MotionState) -> bool {
        state.is_motion()
    }
}

impl fmt::Display for MotionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMotion => write!(f, "NO_MOTION"),
            Self::Motion => write!(f, "MOTION"),
        }
    }
}

/// Decides which frames are evaluated and what state they produce
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    frame_skip: u32,
    motion_blocks_threshold: u32,
    counter: u64,
    state: MotionState,
}

impl MotionClassifier {
    pub fn new(frame_skip: u32, motion_blocks_threshold: u32) -> Self {
        Self {
            frame_skip,
            motion_blocks_threshold,
            counter: 0,
            state: MotionState::NoMotion,
        }
    }

    /// Whether the next ingested frame will be evaluated
    pub fn is_due(&self) -> bool {
        self.counter % (self.frame_skip as u64 + 1) == 0
    }

    /// Count one ingested frame and report whether it must be evaluated
    ///
    /// Frame 0 is always evaluated, then every `frame_skip + 1`th frame.
    pub fn tick(&mut self) -> bool {
        let due = self.is_due();
        self.counter += 1;
        due
    }

    /// Apply the block-count rule to an evaluated frame
    ///
    /// Motion needs at least one active block even when the threshold is 0.
    pub fn classify(&mut self, active_blocks: usize) -> MotionState {
        let required = self.motion_blocks_threshold.max(1) as usize;
        let next = if active_blocks >= required {
            MotionState::Motion
        } else {
            MotionState::NoMotion
        };

        if next != self.state {
            info!(
                "Motion state {} -> {} (active_blocks={}, threshold={})",
                self.state, next, active_blocks, self.motion_blocks_threshold
            );
        }
        self.state = next;
        next
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Ingested frames so far, skipped ones included
    pub fn frames_seen(&self) -> u64 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
        self.state = MotionState::NoMotion;
    }
}
