// src/tracking.rs - Pose landmarks and the joint geometry built on them
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Number of landmarks in a full MediaPipe pose estimate.
pub const POSE_LANDMARK_COUNT: usize = 33;

// MediaPipe pose landmark indices
pub const LEFT_SHOULDER: usize = 11;
pub const RIGHT_SHOULDER: usize = 12;
pub const LEFT_ELBOW: usize = 13;
pub const RIGHT_ELBOW: usize = 14;
pub const LEFT_HIP: usize = 23;
pub const RIGHT_HIP: usize = 24;
pub const LEFT_KNEE: usize = 25;
pub const RIGHT_KNEE: usize = 26;
pub const LEFT_ANKLE: usize = 27;
pub const RIGHT_ANKLE: usize = 28;

/// A single tracked body joint in normalized image coordinates.
///
/// `x` and `y` are in [0, 1] with `y` growing downwards; `z` is carried
/// along but never used for angle math.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn planar(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<[f64; 3]> for Landmark {
    fn from(v: [f64; 3]) -> Self {
        Landmark::new(v[0], v[1], v[2])
    }
}

/// One frame of pose estimation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseSample {
    pub timestamp_ms: u64,
    pub landmarks: Vec<Landmark>,
}

impl PoseSample {
    pub fn new(timestamp_ms: u64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            landmarks,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= POSE_LANDMARK_COUNT
    }

    /// Landmark by MediaPipe index. Callers check `is_complete` first.
    pub fn joint(&self, index: usize) -> Landmark {
        self.landmarks[index]
    }
}

/// What the pose source produced for a given instant.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseFrame {
    Detected(PoseSample),
    NoDetection { timestamp_ms: u64 },
}

impl PoseFrame {
    pub fn timestamp_ms(&self) -> u64 {
        match self {
            PoseFrame::Detected(sample) => sample.timestamp_ms,
            PoseFrame::NoDetection { timestamp_ms } => *timestamp_ms,
        }
    }
}

/// Unsigned angle in degrees at vertex `b` between `a - b` and `c - b`.
///
/// Returns 0 when either arm of the angle has zero length.
pub fn angle_between(a: &Landmark, b: &Landmark, c: &Landmark) -> f64 {
    let v1 = a.planar() - b.planar();
    let v2 = c.planar() - b.planar();

    let mag1 = v1.norm();
    let mag2 = v2.norm();

    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    let cos_angle = (v1.dot(&v2) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos_angle.acos().to_degrees()
}

/// Angle of the vector `to -> from` against the horizontal axis, folded
/// into [0, 180] degrees. Coincident points give 0.
pub fn incline_from_horizontal(from: &Landmark, to: &Landmark) -> f64 {
    let d = from.planar() - to.planar();
    d.y.atan2(d.x).to_degrees().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lm(x: f64, y: f64) -> Landmark {
        Landmark::new(x, y, 0.0)
    }

    #[test]
    fn straight_line_is_180() {
        let angle = angle_between(&lm(0.0, 0.0), &lm(0.5, 0.0), &lm(1.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn right_angle() {
        let angle = angle_between(&lm(0.0, 0.0), &lm(0.5, 0.0), &lm(0.5, 0.5));
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_vertex_gives_zero() {
        let p = lm(0.3, 0.3);
        assert_eq!(angle_between(&p, &p, &lm(0.9, 0.1)), 0.0);
        assert_eq!(angle_between(&lm(0.2, 0.2), &lm(0.4, 0.4), &lm(0.4, 0.4)), 0.0);
    }

    #[test]
    fn coincident_ends_give_zero_not_nan() {
        let a = lm(0.1, 0.7);
        let angle = angle_between(&a, &lm(0.5, 0.5), &a);
        assert!(!angle.is_nan());
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn z_is_ignored() {
        let flat = angle_between(&lm(0.0, 0.0), &lm(0.5, 0.0), &lm(0.5, 0.5));
        let deep = angle_between(
            &Landmark::new(0.0, 0.0, 3.0),
            &Landmark::new(0.5, 0.0, -1.0),
            &Landmark::new(0.5, 0.5, 0.2),
        );
        assert_eq!(flat, deep);
    }

    #[test]
    fn incline_is_folded() {
        // Shoulder left of the ankle, slightly higher in frame
        let shoulder = lm(0.2, 0.48);
        let ankle = lm(0.8, 0.5);
        let incline = incline_from_horizontal(&shoulder, &ankle);
        assert!(incline > 170.0 && incline <= 180.0);

        // Upper arm hanging straight down from the shoulder
        let elbow = lm(0.2, 0.7);
        let arm = incline_from_horizontal(&shoulder, &elbow);
        assert!((arm - 90.0).abs() < 1e-9);

        assert_eq!(incline_from_horizontal(&shoulder, &shoulder), 0.0);
    }

    #[test]
    fn frame_timestamp() {
        let frame = PoseFrame::NoDetection { timestamp_ms: 42 };
        assert_eq!(frame.timestamp_ms(), 42);
        let sample = PoseSample::new(7, vec![Landmark::default(); POSE_LANDMARK_COUNT]);
        assert!(sample.is_complete());
        assert_eq!(PoseFrame::Detected(sample).timestamp_ms(), 7);
    }
}
