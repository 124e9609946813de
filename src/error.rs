//! Error type shared by the experiment modules
//!
//! The staircase itself is a pure state transition; everything here is either
//! a violated precondition, an I/O failure, or a subject abort.

use thiserror::Error;

/// Errors raised while configuring or running an experiment session
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("subject identifier must not be empty")]
    EmptySubjectId,

    #[error("no trial is pending a response")]
    NoPendingTrial,

    #[error("staircase already terminated")]
    StaircaseFinished,

    #[error("practice trials must be completed before the main run")]
    PracticeIncomplete,

    #[error("response window is closed")]
    ResponseWindowClosed,

    #[error("playback of stimulus {stimulus} failed: {reason}")]
    Playback { stimulus: u32, reason: String },

    #[error("session aborted by subject")]
    Aborted,

    #[error("malformed CSV at line {line}: {reason}")]
    MalformedCsv { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
