// src/lib.rs
// Exercise rep counting from per-frame pose landmarks. The binary in
// main.rs replays recorded sessions through the same types.
pub mod classifier;
pub mod config;
pub mod data;
pub mod debounce;
pub mod error;
pub mod exercise;
pub mod mediapipe_bridge;
pub mod tracking;

pub use classifier::{
    ExerciseClassifier, SessionConfig, SessionEvent, SessionObserver, SessionState, Update,
};
pub use config::ClassifierConfig;
pub use error::ClassifierError;
pub use exercise::{ExerciseKind, FeedbackCode};
pub use tracking::{Landmark, PoseFrame, PoseSample};
