//! # Error Module
//!
//! Errors surfaced by the detection core. None of them are fatal: a caller
//! either waits (`NotReady`), fixes its input (`InvalidConfig`), or treats the
//! condition as "no detection".

use thiserror::Error;

/// Errors returned by the pitch detection pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PitchError {
    /// The accumulator does not hold a full analysis window yet.
    #[error("sample window not ready: have {have} of {need} samples")]
    NotReady {
        /// Samples accumulated so far.
        have: usize,
        /// Samples required for one analysis window.
        need: usize,
    },

    /// A configuration value was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A tuning identifier could not be resolved against the note table.
    ///
    /// The parser only logs this; it is never returned from `parse_tuning`.
    #[error("invalid tuning identifier `{0}`")]
    InvalidTuningIdentifier(String),

    /// The audio source failed to open or run.
    #[error("audio source error: {0}")]
    Audio(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PitchError>;
