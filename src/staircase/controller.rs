//! Two-down/one-up transformed staircase
//!
//! Before the first reversal every response moves the step: easier (lower
//! step) on correct, harder on incorrect. From the first reversal on, a
//! single incorrect response raises the step and two consecutive correct
//! responses lower it. Step sizes come from a table indexed by the reversal
//! count, so the track gets finer as reversals accumulate.
//!
//! Two behaviours are kept literally from the established protocol:
//! - the step at the first reversal is left out of the threshold average;
//! - the consecutive-correct counter wraps to 0 when it reaches 2, and the
//!   remembered outcome only turns `Correct` once the two-down rule fires.

use crate::error::{ExperimentError, Result};
use crate::staircase::state::{Outcome, StaircaseState};
use tracing::{debug, info};

/// Lowest step the track may reach; step 1 is the base tone itself
pub const MIN_STEP: u32 = 2;

/// Fixed parameters of a main run
#[derive(Clone, Debug, PartialEq)]
pub struct StaircaseParams {
    pub starting_step: u32,
    pub num_steps: u32,
    pub max_trials: u32,
    pub target_reversals: u32,
    /// Step magnitude per reversal count; the last entry repeats
    pub step_sizes: Vec<u32>,
}

impl StaircaseParams {
    /// Step magnitude for the given reversal count
    pub fn step_size(&self, reversal_count: u32) -> u32 {
        let last = self.step_sizes.len().saturating_sub(1);
        let idx = (reversal_count as usize).min(last);
        self.step_sizes.get(idx).copied().unwrap_or(1)
    }
}

impl Default for StaircaseParams {
    fn default() -> Self {
        StaircaseParams {
            starting_step: 51,
            num_steps: 101,
            max_trials: 75,
            target_reversals: 7,
            step_sizes: vec![10, 5, 2, 1, 1, 1, 1, 1],
        }
    }
}

/// Result of feeding one response into the staircase
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    /// 1-based ordinal of the trial just completed
    pub trial: u32,
    pub step_before: u32,
    pub step_after: u32,
    /// Table step size in effect after reversal detection, even if the
    /// step did not move on this trial
    pub step_size_used: u32,
    pub reversal: bool,
    pub reversal_count: u32,
    pub mean_reversal: Option<f64>,
    pub terminated: bool,
}

/// Owns the StaircaseState of one main run
#[derive(Clone, Debug)]
pub struct StaircaseController {
    params: StaircaseParams,
    state: StaircaseState,
    pending: bool,
}

impl StaircaseController {
    pub fn new(params: StaircaseParams) -> Result<Self> {
        if params.step_sizes.is_empty() {
            return Err(ExperimentError::InvalidConfig(
                "step_sizes must not be empty".into(),
            ));
        }
        if params.num_steps < MIN_STEP || !(MIN_STEP..=params.num_steps).contains(&params.starting_step)
        {
            return Err(ExperimentError::InvalidConfig(format!(
                "starting_step {} outside [{}, {}]",
                params.starting_step, MIN_STEP, params.num_steps
            )));
        }
        let state = StaircaseState::new(params.starting_step);
        Ok(StaircaseController {
            params,
            state,
            pending: false,
        })
    }

    pub fn params(&self) -> &StaircaseParams {
        &self.params
    }

    pub fn state(&self) -> &StaircaseState {
        &self.state
    }

    pub fn current_step(&self) -> u32 {
        self.state.current_step
    }

    /// Trial cap or reversal target reached
    pub fn is_terminated(&self) -> bool {
        self.state.trial_index >= self.params.max_trials
            || self.state.reversal_count >= self.params.target_reversals
    }

    /// Mark a trial as presented and return the step to present
    pub fn begin_trial(&mut self) -> Result<u32> {
        if self.is_terminated() {
            return Err(ExperimentError::StaircaseFinished);
        }
        self.pending = true;
        Ok(self.state.current_step)
    }

    /// Apply the response of the pending trial
    pub fn advance(&mut self, was_correct: bool) -> Result<StepOutcome> {
        if self.is_terminated() {
            return Err(ExperimentError::StaircaseFinished);
        }
        if !self.pending {
            return Err(ExperimentError::NoPendingTrial);
        }
        self.pending = false;

        let outcome = Outcome::from(was_correct);
        let step_before = self.state.current_step;

        let (reversal, delta, step_size_used) = if self.state.reversal_count == 0 {
            self.transition_initial(outcome)
        } else {
            self.transition_two_down(outcome)
        };

        let next = (step_before as i64 + delta)
            .clamp(MIN_STEP as i64, self.params.num_steps as i64);
        self.state.current_step = next as u32;
        self.state.trial_index += 1;

        let result = StepOutcome {
            trial: self.state.trial_index,
            step_before,
            step_after: self.state.current_step,
            step_size_used,
            reversal,
            reversal_count: self.state.reversal_count,
            mean_reversal: self.state.mean_reversal(),
            terminated: self.is_terminated(),
        };

        debug!(
            trial = result.trial,
            correct = was_correct,
            step_before,
            step_after = result.step_after,
            step_size = step_size_used,
            "staircase advanced"
        );
        if reversal {
            info!(
                reversals = result.reversal_count,
                step = step_before,
                "reversal"
            );
        }

        Ok(result)
    }

    /// Threshold estimate: mean step over reversals 2..n
    pub fn threshold(&self) -> Option<f64> {
        self.state.mean_reversal()
    }

    fn record_reversal(&mut self) {
        self.state.reversal_count += 1;
        if self.state.reversal_count > 1 {
            self.state.reversal_step_sum += self.state.current_step as u64;
        }
    }

    /// Before the first reversal: every outcome moves the step
    fn transition_initial(&mut self, outcome: Outcome) -> (bool, i64, u32) {
        let reversal = matches!(self.state.last_outcome, Some(prev) if prev != outcome);
        if reversal {
            self.record_reversal();
        }

        let size = self.params.step_size(self.state.reversal_count);
        let delta = match outcome {
            Outcome::Correct => -(size as i64),
            Outcome::Incorrect => size as i64,
        };
        self.state.last_outcome = Some(outcome);
        (reversal, delta, size)
    }

    /// After the first reversal: two down, one up
    fn transition_two_down(&mut self, outcome: Outcome) -> (bool, i64, u32) {
        let second_correct = outcome == Outcome::Correct && self.state.consecutive_correct == 1;

        let reversal = match (self.state.last_outcome, outcome) {
            (Some(Outcome::Correct), Outcome::Incorrect) => true,
            (Some(Outcome::Incorrect), Outcome::Correct) => second_correct,
            _ => false,
        };
        if reversal {
            self.record_reversal();
        }

        let size = self.params.step_size(self.state.reversal_count);
        let delta = match outcome {
            Outcome::Incorrect => size as i64,
            Outcome::Correct if second_correct => -(size as i64),
            Outcome::Correct => 0,
        };

        match outcome {
            Outcome::Incorrect => {
                self.state.last_outcome = Some(Outcome::Incorrect);
                self.state.consecutive_correct = 0;
            }
            Outcome::Correct => {
                if second_correct {
                    self.state.last_outcome = Some(Outcome::Correct);
                }
                self.state.consecutive_correct = (self.state.consecutive_correct + 1) % 2;
            }
        }

        (reversal, delta, size)
    }
}
