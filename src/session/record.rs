//! Per-trial records of the main run

use crate::error::{ExperimentError, Result};
use crate::sequencer::{Interval, TrialPlan};
use crate::session::window::Response;
use crate::staircase::StepOutcome;
use std::fmt;

/// Column names of the exported table, in order
pub const CSV_HEADER: [&str; 13] = [
    "subject_id",
    "trial",
    "stimulus_step",
    "odd_position",
    "correct_answer",
    "response",
    "correct",
    "rt_ms",
    "num_reversals_after",
    "step_before",
    "step_after",
    "step_size_used",
    "mean_reversal_so_far",
];

/// Non-empty, trimmed subject identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ExperimentError::EmptySubjectId);
        }
        Ok(SubjectId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One completed main-run trial. Never mutated after creation.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialRecord {
    pub subject_id: String,
    pub trial: u32,
    pub stimulus_step: u32,
    pub odd_position: Interval,
    pub correct_answer: Interval,
    pub response: Interval,
    pub correct: bool,
    pub rt_ms: u64,
    pub num_reversals_after: u32,
    pub step_before: u32,
    pub step_after: u32,
    pub step_size_used: u32,
    /// Blank until two reversals exist
    pub mean_reversal_so_far: Option<f64>,
}

impl TrialRecord {
    pub fn new(
        subject: &SubjectId,
        plan: &TrialPlan,
        response: &Response,
        outcome: &StepOutcome,
    ) -> Self {
        TrialRecord {
            subject_id: subject.as_str().to_string(),
            trial: outcome.trial,
            stimulus_step: outcome.step_before,
            odd_position: plan.odd_position,
            correct_answer: plan.odd_position,
            response: response.choice,
            correct: response.choice == plan.odd_position,
            rt_ms: response.rt_ms,
            num_reversals_after: outcome.reversal_count,
            step_before: outcome.step_before,
            step_after: outcome.step_after,
            step_size_used: outcome.step_size_used,
            mean_reversal_so_far: outcome.mean_reversal,
        }
    }

    /// Unescaped field values in `CSV_HEADER` order
    pub fn fields(&self) -> [String; 13] {
        [
            self.subject_id.clone(),
            self.trial.to_string(),
            self.stimulus_step.to_string(),
            self.odd_position.to_string(),
            self.correct_answer.to_string(),
            self.response.to_string(),
            if self.correct { "1" } else { "0" }.to_string(),
            self.rt_ms.to_string(),
            self.num_reversals_after.to_string(),
            self.step_before.to_string(),
            self.step_after.to_string(),
            self.step_size_used.to_string(),
            self.mean_reversal_so_far
                .map(|m| m.to_string())
                .unwrap_or_default(),
        ]
    }

    /// Rebuild a record from field values in `CSV_HEADER` order
    pub fn from_fields(fields: &[&str; 13], line: usize) -> Result<Self> {
        let malformed = |column: &str, value: &str| ExperimentError::MalformedCsv {
            line,
            reason: format!("bad {} value {:?}", column, value),
        };
        let int = |idx: usize| -> Result<u64> {
            fields[idx]
                .parse::<u64>()
                .map_err(|_| malformed(CSV_HEADER[idx], fields[idx]))
        };
        let small = |idx: usize| -> Result<u32> {
            let value = int(idx)?;
            u32::try_from(value).map_err(|_| malformed(CSV_HEADER[idx], fields[idx]))
        };
        let interval = |idx: usize| -> Result<Interval> {
            fields[idx]
                .parse::<u8>()
                .ok()
                .and_then(Interval::from_number)
                .ok_or_else(|| malformed(CSV_HEADER[idx], fields[idx]))
        };

        let correct = match fields[6] {
            "1" => true,
            "0" => false,
            other => return Err(malformed(CSV_HEADER[6], other)),
        };
        let mean_reversal_so_far = if fields[12].is_empty() {
            None
        } else {
            Some(
                fields[12]
                    .parse::<f64>()
                    .map_err(|_| malformed(CSV_HEADER[12], fields[12]))?,
            )
        };

        Ok(TrialRecord {
            subject_id: fields[0].to_string(),
            trial: small(1)?,
            stimulus_step: small(2)?,
            odd_position: interval(3)?,
            correct_answer: interval(4)?,
            response: interval(5)?,
            correct,
            rt_ms: int(7)?,
            num_reversals_after: small(8)?,
            step_before: small(9)?,
            step_after: small(10)?,
            step_size_used: small(11)?,
            mean_reversal_so_far,
        })
    }
}
