// src/mediapipe_bridge.rs - Turns pose estimator output into classifier frames
use crate::tracking::{Landmark, PoseFrame, PoseSample};
use anyhow::Result;
use std::collections::VecDeque;

/// Anything that can hand out pose frames in capture order.
pub trait PoseSource {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<PoseFrame>>;
}

/// Builds a frame from raw MediaPipe output: one entry per detected person,
/// each a list of `[x, y, z]` landmarks. Only the first person is used.
pub fn frame_from_landmarks(people: &[Vec<[f64; 3]>], timestamp_ms: u64) -> PoseFrame {
    match people.first() {
        Some(landmarks) if !landmarks.is_empty() => PoseFrame::Detected(PoseSample::new(
            timestamp_ms,
            landmarks.iter().copied().map(Landmark::from).collect(),
        )),
        _ => PoseFrame::NoDetection { timestamp_ms },
    }
}

/// Plays back frames that were captured earlier.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<PoseFrame>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = PoseFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>> {
        Ok(self.frames.pop_front())
    }
}
