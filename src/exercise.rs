// src/exercise.rs - Per-exercise form checks
use crate::config::ClassifierConfig;
use crate::tracking::{
    angle_between, incline_from_horizontal, PoseSample, LEFT_ANKLE, LEFT_ELBOW, LEFT_HIP,
    LEFT_KNEE, LEFT_SHOULDER, RIGHT_ANKLE, RIGHT_ELBOW, RIGHT_HIP, RIGHT_SHOULDER,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Squat,
    Plank,
    SidePlank,
}

impl ExerciseKind {
    /// Timed holds count seconds, everything else counts reps.
    pub fn is_timed(&self) -> bool {
        matches!(self, ExerciseKind::Plank | ExerciseKind::SidePlank)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "SQUAT",
            ExerciseKind::Plank => "PLANK",
            ExerciseKind::SidePlank => "SIDE PLANK",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// User-facing message chosen by the last evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackCode {
    Idle,
    PromptRise,
    PromptLower,
    TuckElbow,
    StraightenBody,
    RaiseHip,
    LowerHip,
    Excellent,
    RestNextSet,
    Finished,
}

impl FeedbackCode {
    pub fn message(&self) -> &'static str {
        match self {
            FeedbackCode::Idle => "Get ready...",
            FeedbackCode::PromptRise => "Stand up!",
            FeedbackCode::PromptLower => "Get level with the floor!",
            FeedbackCode::TuckElbow => "Bring your elbow under your shoulder",
            FeedbackCode::StraightenBody => "Keep your body straight",
            FeedbackCode::RaiseHip => "Push your hips up!",
            FeedbackCode::LowerHip => "Lower your hips!",
            FeedbackCode::Excellent => "Excellent! Hold it",
            FeedbackCode::RestNextSet => "Rest! Next set...",
            FeedbackCode::Finished => "Well done! Finished!",
        }
    }
}

impl fmt::Display for FeedbackCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

/// Knee angle of the left leg.
pub fn squat_knee_angle(sample: &PoseSample) -> f64 {
    angle_between(
        &sample.joint(LEFT_HIP),
        &sample.joint(LEFT_KNEE),
        &sample.joint(LEFT_ANKLE),
    )
}

/// Where a squat knee angle sits relative to the counting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquatZone {
    Down,
    Transition,
    Up,
}

pub fn squat_zone(angle: f64, cfg: &ClassifierConfig) -> SquatZone {
    if angle < cfg.squat_down_angle {
        SquatZone::Down
    } else if angle > cfg.squat_up_angle {
        SquatZone::Up
    } else {
        SquatZone::Transition
    }
}

/// Outcome of a single-frame form check for a hold exercise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldVerdict {
    pub correct: bool,
    pub feedback: FeedbackCode,
    pub body_angle: f64,
    pub side: Side,
}

/// Front plank, judged on the left side of the body.
pub fn evaluate_plank(sample: &PoseSample, cfg: &ClassifierConfig) -> HoldVerdict {
    let shoulder = sample.joint(LEFT_SHOULDER);
    let elbow = sample.joint(LEFT_ELBOW);
    let hip = sample.joint(LEFT_HIP);
    let ankle = sample.joint(LEFT_ANKLE);

    let body_angle = angle_between(&shoulder, &hip, &ankle);
    let body_straight = body_angle > cfg.plank_body_min && body_angle < cfg.plank_body_max;

    let torso = incline_from_horizontal(&shoulder, &ankle);
    let torso_flat = torso < cfg.plank_torso_flat_max || torso > cfg.plank_torso_flat_min_reversed;

    let arm = incline_from_horizontal(&shoulder, &elbow);
    let arm_vertical = arm > cfg.plank_arm_min && arm < cfg.plank_arm_max;

    let correct = body_straight && torso_flat && arm_vertical;
    let feedback = if correct {
        FeedbackCode::Excellent
    } else if !torso_flat {
        FeedbackCode::PromptLower
    } else if !arm_vertical {
        FeedbackCode::TuckElbow
    } else if body_angle <= cfg.plank_body_min {
        FeedbackCode::RaiseHip
    } else {
        FeedbackCode::LowerHip
    };

    HoldVerdict {
        correct,
        feedback,
        body_angle,
        side: Side::Left,
    }
}

/// The side whose elbow is lower in frame carries the body. Ties go right.
pub fn weight_bearing_side(sample: &PoseSample) -> Side {
    if sample.joint(LEFT_ELBOW).y > sample.joint(RIGHT_ELBOW).y {
        Side::Left
    } else {
        Side::Right
    }
}

pub fn evaluate_side_plank(sample: &PoseSample, cfg: &ClassifierConfig) -> HoldVerdict {
    let side = weight_bearing_side(sample);
    let (shoulder, elbow, hip, ankle) = match side {
        Side::Left => (LEFT_SHOULDER, LEFT_ELBOW, LEFT_HIP, LEFT_ANKLE),
        Side::Right => (RIGHT_SHOULDER, RIGHT_ELBOW, RIGHT_HIP, RIGHT_ANKLE),
    };
    let shoulder = sample.joint(shoulder);
    let elbow = sample.joint(elbow);
    let hip = sample.joint(hip);
    let ankle = sample.joint(ankle);

    let body_angle = angle_between(&shoulder, &hip, &ankle);
    let body_straight =
        body_angle > cfg.side_plank_body_min && body_angle < cfg.side_plank_body_max;

    let elbow_stacked = (shoulder.x - elbow.x).abs() < cfg.side_plank_elbow_offset_max;

    let correct = body_straight && elbow_stacked;
    let feedback = if correct {
        FeedbackCode::Excellent
    } else if !elbow_stacked {
        FeedbackCode::TuckElbow
    } else if body_angle < cfg.side_plank_body_min {
        FeedbackCode::RaiseHip
    } else {
        FeedbackCode::StraightenBody
    };

    HoldVerdict {
        correct,
        feedback,
        body_angle,
        side,
    }
}
