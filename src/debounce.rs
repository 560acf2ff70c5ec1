// src/debounce.rs
use serde::Serialize;

/// Tracks how long a candidate condition has held without interruption.
///
/// The anchor is armed on the first qualifying tick and dropped on any tick
/// where the condition is false, so a single noisy frame restarts the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StableTimer {
    anchor_ms: Option<u64>,
}

impl StableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one tick. Returns true once the condition has held for strictly
    /// more than `required_ms` since the anchor was armed.
    pub fn observe(&mut self, candidate: bool, now_ms: u64, required_ms: u64) -> bool {
        if !candidate {
            self.anchor_ms = None;
            return false;
        }
        let anchor = *self.anchor_ms.get_or_insert(now_ms);
        now_ms.saturating_sub(anchor) > required_ms
    }

    pub fn disarm(&mut self) {
        self.anchor_ms = None;
    }

    pub fn anchor_ms(&self) -> Option<u64> {
        self.anchor_ms
    }

    pub fn is_armed(&self) -> bool {
        self.anchor_ms.is_some()
    }
}
