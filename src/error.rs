// src/error.rs
use thiserror::Error;

/// Failures reported by the exercise classifier.
///
/// All of them are recoverable: a rejected sample leaves the session state
/// exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),

    #[error("pose sample has {found} landmarks, at least {required} are needed")]
    InsufficientLandmarks { found: usize, required: usize },

    #[error("sample timestamp {timestamp_ms} ms is older than the last observed {last_observed_ms} ms")]
    NonMonotonicTimestamp {
        timestamp_ms: u64,
        last_observed_ms: u64,
    },
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
