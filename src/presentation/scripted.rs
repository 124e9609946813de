//! Scripted presenter: a simulated subject for rehearsals and tests
//!
//! Answers each trial correctly or incorrectly according to a fixed script,
//! working out the odd interval from the stimuli it was asked to play. Time
//! passes through `tokio::time`, so a paused test clock makes runs exact.

use crate::error::{ExperimentError, Result};
use crate::presentation::{Presenter, SessionEvent};
use crate::sequencer::{Interval, StimulusId};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct ScriptedPresenter {
    answers: VecDeque<bool>,
    stimulus_ms: u64,
    response_ms: u64,
    hang_on: Option<StimulusId>,
    fail_on: Option<StimulusId>,
    played: Vec<StimulusId>,
    events: Vec<SessionEvent>,
}

impl ScriptedPresenter {
    /// `answers[i]` is whether the i-th response is correct; the subject
    /// aborts once the script runs out
    pub fn new(answers: Vec<bool>) -> Self {
        ScriptedPresenter {
            answers: answers.into(),
            stimulus_ms: 250,
            response_ms: 600,
            ..Default::default()
        }
    }

    pub fn with_stimulus_ms(mut self, ms: u64) -> Self {
        self.stimulus_ms = ms;
        self
    }

    pub fn with_response_ms(mut self, ms: u64) -> Self {
        self.response_ms = ms;
        self
    }

    /// Never signal completion for this stimulus
    pub fn hang_on(mut self, stimulus: StimulusId) -> Self {
        self.hang_on = Some(stimulus);
        self
    }

    /// Report a playback error for this stimulus
    pub fn fail_on(mut self, stimulus: StimulusId) -> Self {
        self.fail_on = Some(stimulus);
        self
    }

    pub fn played(&self) -> &[StimulusId] {
        &self.played
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn remaining_answers(&self) -> usize {
        self.answers.len()
    }

    /// Odd interval of the last three stimuli played
    fn odd_interval(&self) -> Option<Interval> {
        let n = self.played.len();
        if n < 3 {
            return None;
        }
        let trial = &self.played[n - 3..];
        if trial[0] != trial[1] {
            Some(Interval::First)
        } else {
            Some(Interval::Third)
        }
    }
}

impl Presenter for ScriptedPresenter {
    async fn play(&mut self, stimulus: StimulusId) -> Result<()> {
        self.played.push(stimulus);
        if self.hang_on == Some(stimulus) {
            std::future::pending::<()>().await;
        }
        if self.fail_on == Some(stimulus) {
            return Err(ExperimentError::Playback {
                stimulus: stimulus.0,
                reason: "scripted failure".into(),
            });
        }
        tokio::time::sleep(Duration::from_millis(self.stimulus_ms)).await;
        Ok(())
    }

    async fn await_choice(&mut self) -> Result<Option<Interval>> {
        let Some(correct) = self.answers.pop_front() else {
            return Ok(None);
        };
        let odd = self.odd_interval().ok_or(ExperimentError::NoPendingTrial)?;
        tokio::time::sleep(Duration::from_millis(self.response_ms)).await;
        let choice = match (correct, odd) {
            (true, odd) => odd,
            (false, Interval::First) => Interval::Third,
            (false, Interval::Third) => Interval::First,
        };
        Ok(Some(choice))
    }

    fn notify(&mut self, event: &SessionEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}
