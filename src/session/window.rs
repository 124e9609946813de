//! Response window guard
//!
//! Opens after the stimulus sequence and its trailing gap have played,
//! closes the moment a response is accepted. Responses outside the window
//! are rejected.

use crate::error::{ExperimentError, Result};
use crate::sequencer::Interval;
use tokio::time::Instant;

/// Accepted forced-choice response
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Response {
    pub choice: Interval,
    /// Latency from window opening, rounded to whole milliseconds
    pub rt_ms: u64,
}

#[derive(Debug, Default)]
pub struct ResponseWindow {
    opened_at: Option<Instant>,
}

impl ResponseWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.opened_at = Some(Instant::now());
    }

    pub fn is_open(&self) -> bool {
        self.opened_at.is_some()
    }

    /// Accept a response and close the window
    pub fn accept(&mut self, choice: Interval) -> Result<Response> {
        let opened_at = self
            .opened_at
            .take()
            .ok_or(ExperimentError::ResponseWindowClosed)?;
        let rt_ms = (opened_at.elapsed().as_secs_f64() * 1000.0).round() as u64;
        Ok(Response { choice, rt_ms })
    }

    pub fn close(&mut self) {
        self.opened_at = None;
    }
}
