//! Pitch discrimination experiment with a two-down/one-up adaptive staircase
//!
//! Each trial plays three tones, two identical base tones and one odd tone
//! in the first or third interval. The subject names the odd interval and
//! the staircase moves the odd tone's pitch step toward the ~70.7% correct
//! point. The threshold estimate is the mean step over reversals 2..n.

pub mod cli;
pub mod config;
pub mod error;
pub mod presentation;
pub mod sequencer;
pub mod session;
pub mod staircase;

pub use config::ExperimentConfig;
pub use error::{ExperimentError, Result};
pub use session::{SessionOrchestrator, SessionSummary};
pub use staircase::{StaircaseController, StaircaseParams, StepOutcome};
