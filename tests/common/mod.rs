// Pose fixtures shared by the scenario tests.
#![allow(dead_code)]

use rep_tracker::classifier::{ExerciseClassifier, SessionEvent};
use rep_tracker::tracking::{
    Landmark, PoseSample, LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP, LEFT_KNEE, LEFT_SHOULDER,
    POSE_LANDMARK_COUNT, RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER,
};

pub const FRAME_MS: u64 = 50;

fn base() -> Vec<Landmark> {
    vec![Landmark::new(0.5, 0.5, 0.0); POSE_LANDMARK_COUNT]
}

/// Left leg bent so the knee angle is `angle` degrees.
pub fn squat_pose(timestamp_ms: u64, angle: f64) -> PoseSample {
    let mut landmarks = base();
    let rad = angle.to_radians();
    landmarks[LEFT_KNEE] = Landmark::new(0.5, 0.5, 0.0);
    landmarks[LEFT_ANKLE] = Landmark::new(0.5, 0.8, 0.0);
    landmarks[LEFT_HIP] = Landmark::new(0.5 + 0.3 * rad.sin(), 0.5 + 0.3 * rad.cos(), 0.0);
    PoseSample::new(timestamp_ms, landmarks)
}

/// Front plank on the left side; `good` picks textbook form or standing upright.
pub fn plank_pose(timestamp_ms: u64, good: bool) -> PoseSample {
    let mut landmarks = base();
    if good {
        landmarks[LEFT_SHOULDER] = Landmark::new(0.2, 0.5, 0.0);
        landmarks[LEFT_ELBOW] = Landmark::new(0.2, 0.7, 0.0);
        landmarks[LEFT_HIP] = Landmark::new(0.5, 0.5, 0.0);
        landmarks[LEFT_ANKLE] = Landmark::new(0.8, 0.5, 0.0);
    } else {
        landmarks[LEFT_SHOULDER] = Landmark::new(0.5, 0.2, 0.0);
        landmarks[LEFT_ELBOW] = Landmark::new(0.5, 0.35, 0.0);
        landmarks[LEFT_HIP] = Landmark::new(0.5, 0.5, 0.0);
        landmarks[LEFT_ANKLE] = Landmark::new(0.5, 0.9, 0.0);
    }
    PoseSample::new(timestamp_ms, landmarks)
}

/// Side plank where both sides hold good form; `left_elbow_y` and
/// `right_elbow_y` decide which side bears the weight.
pub fn side_plank_pose(timestamp_ms: u64, left_elbow_y: f64, right_elbow_y: f64) -> PoseSample {
    let mut landmarks = base();
    for (shoulder, elbow, hip, ankle, elbow_y) in [
        (LEFT_SHOULDER, LEFT_ELBOW, LEFT_HIP, LEFT_ANKLE, left_elbow_y),
        (RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_HIP, RIGHT_ANKLE, right_elbow_y),
    ] {
        landmarks[shoulder] = Landmark::new(0.2, 0.5, 0.0);
        landmarks[elbow] = Landmark::new(0.22, elbow_y, 0.0);
        landmarks[hip] = Landmark::new(0.5, 0.5, 0.0);
        landmarks[ankle] = Landmark::new(0.8, 0.5, 0.0);
    }
    PoseSample::new(timestamp_ms, landmarks)
}

/// Feeds `angle` every `FRAME_MS` from `from_ms` through `to_ms` inclusive.
pub fn hold_squat(
    classifier: &mut ExerciseClassifier,
    angle: f64,
    from_ms: u64,
    to_ms: u64,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    let mut t = from_ms;
    while t <= to_ms {
        let update = classifier.update(&squat_pose(t, angle)).unwrap();
        events.extend(update.events);
        t += FRAME_MS;
    }
    events
}

/// One clean rep starting at `start_ms`: 300 ms down, then 350 ms up.
/// Counted at `start_ms + 600` when the cooldown allows it.
pub fn squat_rep(classifier: &mut ExerciseClassifier, start_ms: u64) -> Vec<SessionEvent> {
    let mut events = hold_squat(classifier, 80.0, start_ms, start_ms + 300);
    events.extend(hold_squat(classifier, 170.0, start_ms + 350, start_ms + 700));
    events
}
