//! Staircase state tracking
//!
//! Maintains:
//! - Current pitch step and completed trial count
//! - Reversal count and the running sum used for the threshold
//! - Previous outcome and the two-in-a-row counter

/// Outcome of a single forced-choice trial
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl From<bool> for Outcome {
    fn from(was_correct: bool) -> Self {
        if was_correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

/// Mutable state of one main run
#[derive(Clone, Debug, PartialEq)]
pub struct StaircaseState {
    /// Pitch-step index of the next odd stimulus, within [2, num_steps]
    pub current_step: u32,
    /// Completed main-run trials
    pub trial_index: u32,
    /// Reversals detected so far
    pub reversal_count: u32,
    /// Outcome the next reversal check compares against.
    /// After the first reversal it only becomes `Correct` once the
    /// two-down rule has fired.
    pub last_outcome: Option<Outcome>,
    /// Progress toward two consecutive correct responses (0 or 1)
    pub consecutive_correct: u8,
    /// Sum of pre-transition steps at every reversal except the first
    pub reversal_step_sum: u64,
}

impl StaircaseState {
    pub fn new(starting_step: u32) -> Self {
        StaircaseState {
            current_step: starting_step,
            trial_index: 0,
            reversal_count: 0,
            last_outcome: None,
            consecutive_correct: 0,
            reversal_step_sum: 0,
        }
    }

    /// Mean of the reversal steps counted so far (first reversal excluded)
    pub fn mean_reversal(&self) -> Option<f64> {
        if self.reversal_count > 1 {
            Some(self.reversal_step_sum as f64 / (self.reversal_count - 1) as f64)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state() {
        let state = StaircaseState::new(51);
        assert_eq!(state.current_step, 51);
        assert_eq!(state.last_outcome, None);
        assert_eq!(state.mean_reversal(), None);
    }

    #[test]
    fn test_mean_reversal_needs_two_reversals() {
        let mut state = StaircaseState::new(51);
        state.reversal_count = 1;
        assert_eq!(state.mean_reversal(), None);

        state.reversal_count = 3;
        state.reversal_step_sum = 25;
        assert_eq!(state.mean_reversal(), Some(12.5));
    }
}
