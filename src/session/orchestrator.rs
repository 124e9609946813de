//! Session orchestration: practice run, then the staircase-controlled main run
//!
//! One trial is in flight at a time. Each trial plays its three stimuli,
//! opens the response window, waits for a choice and, in the main run,
//! feeds the outcome to the staircase and appends a record to the sink.

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};
use crate::presentation::{play_sequence, Presenter, RunKind, SessionEvent};
use crate::sequencer::{TrialPlan, TrialSequencer};
use crate::session::record::{SubjectId, TrialRecord};
use crate::session::sink::DataSink;
use crate::session::window::{Response, ResponseWindow};
use crate::staircase::StaircaseController;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{debug, info, warn};

/// Where the session is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Practice not yet completed
    Setup,
    /// Practice completed, main run may start
    Ready,
    Running,
    Complete,
    Aborted,
}

/// Result of a completed main run
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSummary {
    pub trials: u32,
    pub reversals: u32,
    /// Mean step over reversals 2..n; None with fewer than two reversals
    pub threshold: Option<f64>,
}

pub struct SessionOrchestrator<P: Presenter, S: DataSink, R: Rng = StdRng> {
    config: ExperimentConfig,
    subject: SubjectId,
    presenter: P,
    sink: S,
    sequencer: TrialSequencer<R>,
    phase: SessionPhase,
}

impl<P: Presenter, S: DataSink, R: Rng> SessionOrchestrator<P, S, R> {
    pub fn new(
        config: ExperimentConfig,
        subject: SubjectId,
        presenter: P,
        sink: S,
        sequencer: TrialSequencer<R>,
    ) -> Result<Self> {
        config.validate()?;
        let phase = if config.practice_trials == 0 {
            SessionPhase::Ready
        } else {
            SessionPhase::Setup
        };
        Ok(SessionOrchestrator {
            config,
            subject,
            presenter,
            sink,
            sequencer,
            phase,
        })
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_parts(self) -> (P, S) {
        (self.presenter, self.sink)
    }

    /// Practice, then the main run
    pub async fn run(&mut self) -> Result<SessionSummary> {
        if self.phase == SessionPhase::Setup {
            self.run_practice().await?;
        }
        self.run_main().await
    }

    /// Fixed-difficulty trials with feedback; produces no records
    pub async fn run_practice(&mut self) -> Result<()> {
        let trials = self.config.practice_trials;
        info!(subject = %self.subject, trials, "practice run started");
        self.presenter.notify(&SessionEvent::RunStarted {
            kind: RunKind::Practice,
            trials,
        })?;

        for trial in 1..=trials {
            let plan = self.sequencer.practice_trial();
            self.presenter.notify(&SessionEvent::TrialStarted {
                kind: RunKind::Practice,
                trial,
                trials,
            })?;
            let response = self.present(&plan).await?;
            let correct = response.choice == plan.odd_position;
            debug!(trial, correct, "practice response");
            self.presenter
                .notify(&SessionEvent::PracticeFeedback { correct })?;
            self.presenter
                .wait_ms(self.config.timing.post_response_ms)
                .await;
        }

        if self.phase == SessionPhase::Setup {
            self.phase = SessionPhase::Ready;
        }
        Ok(())
    }

    /// Staircase run until the trial cap or reversal target. Any failure
    /// discards the records collected so far.
    pub async fn run_main(&mut self) -> Result<SessionSummary> {
        if self.phase == SessionPhase::Setup {
            return Err(ExperimentError::PracticeIncomplete);
        }

        let mut staircase = StaircaseController::new(self.config.staircase_params())?;
        self.sequencer.prepare_main_run(self.config.max_trials);
        self.sink.discard();
        self.phase = SessionPhase::Running;
        info!(
            subject = %self.subject,
            start = staircase.current_step(),
            max_trials = self.config.max_trials,
            target_reversals = self.config.target_reversals,
            "main run started"
        );

        match self.main_loop(&mut staircase).await {
            Ok(()) => {}
            Err(err) => {
                warn!(error = %err, discarded = self.sink.records().len(), "main run aborted");
                self.sink.discard();
                self.phase = SessionPhase::Aborted;
                return Err(err);
            }
        }

        let state = staircase.state();
        let summary = SessionSummary {
            trials: state.trial_index,
            reversals: state.reversal_count,
            threshold: staircase.threshold(),
        };
        self.phase = SessionPhase::Complete;
        info!(
            trials = summary.trials,
            reversals = summary.reversals,
            threshold = ?summary.threshold,
            "main run complete"
        );
        self.presenter.notify(&SessionEvent::Finished {
            threshold: summary.threshold,
            reversals: summary.reversals,
        })?;
        Ok(summary)
    }

    async fn main_loop(&mut self, staircase: &mut StaircaseController) -> Result<()> {
        let trials = self.config.max_trials;
        self.presenter.notify(&SessionEvent::RunStarted {
            kind: RunKind::Main,
            trials,
        })?;

        while !staircase.is_terminated() {
            let index = staircase.state().trial_index;
            let step = staircase.begin_trial()?;
            let plan = self
                .sequencer
                .main_trial(index, step)
                .ok_or(ExperimentError::StaircaseFinished)?;
            self.presenter.notify(&SessionEvent::TrialStarted {
                kind: RunKind::Main,
                trial: index + 1,
                trials,
            })?;

            let response = self.present(&plan).await?;
            let outcome = staircase.advance(response.choice == plan.odd_position)?;
            self.sink
                .append(TrialRecord::new(&self.subject, &plan, &response, &outcome));
            self.presenter.notify(&SessionEvent::ResponseRecorded)?;
            self.presenter
                .wait_ms(self.config.timing.post_response_ms)
                .await;
        }
        Ok(())
    }

    /// Play one trial and collect the response
    async fn present(&mut self, plan: &TrialPlan) -> Result<Response> {
        self.presenter.notify(&SessionEvent::Playing)?;
        play_sequence(&mut self.presenter, plan.stimuli(), &self.config.timing).await;

        self.presenter.flush_input()?;
        let mut window = ResponseWindow::new();
        window.open();
        self.presenter.notify(&SessionEvent::AwaitingResponse)?;

        let choice = self
            .presenter
            .await_choice()
            .await?
            .ok_or(ExperimentError::Aborted)?;
        window.accept(choice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::presentation::ScriptedPresenter;
    use crate::sequencer::{Interval, StimulusId};
    use crate::session::sink::RecordTable;

    fn config(practice_trials: u32) -> ExperimentConfig {
        ExperimentConfig {
            practice_trials,
            seed: Some(42),
            timing: TimingConfig {
                inter_stimulus_ms: 500,
                post_sequence_ms: 500,
                post_response_ms: 1000,
                playback_timeout_ms: 3000,
            },
            ..ExperimentConfig::default()
        }
    }

    fn orchestrator(
        cfg: ExperimentConfig,
        presenter: ScriptedPresenter,
    ) -> SessionOrchestrator<ScriptedPresenter, RecordTable> {
        let sequencer = TrialSequencer::from_seed(cfg.seed, cfg.base_step, cfg.num_steps);
        SessionOrchestrator::new(
            cfg,
            SubjectId::new("s01").unwrap(),
            presenter,
            RecordTable::new(),
            sequencer,
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_main_run_requires_practice() {
        let mut session = orchestrator(config(2), ScriptedPresenter::new(vec![true; 10]));
        assert!(matches!(
            session.run_main().await,
            Err(ExperimentError::PracticeIncomplete)
        ));
        assert_eq!(session.phase(), SessionPhase::Setup);
    }

    #[tokio::test(start_paused = true)]
    async fn test_practice_uses_extreme_stimuli_and_records_nothing() {
        let mut session = orchestrator(config(3), ScriptedPresenter::new(vec![true, false, true]));
        session.run_practice().await.unwrap();

        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(session.sink().records().is_empty());
        let played = session.presenter().played();
        assert_eq!(played.len(), 9);
        assert!(played
            .iter()
            .all(|s| *s == StimulusId(1) || *s == StimulusId(101)));
        let feedback: Vec<_> = session
            .presenter()
            .events()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::PracticeFeedback { correct } => Some(*correct),
                _ => None,
            })
            .collect();
        assert_eq!(feedback, vec![true, false, true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_stops_at_trial_cap() {
        let cfg = ExperimentConfig {
            max_trials: 6,
            ..config(1)
        };
        // practice answer, then six correct main-run answers
        let mut session = orchestrator(cfg, ScriptedPresenter::new(vec![true; 7]));
        let summary = session.run().await.unwrap();

        assert_eq!(summary.trials, 6);
        assert_eq!(summary.reversals, 0);
        assert_eq!(summary.threshold, None);
        assert_eq!(session.phase(), SessionPhase::Complete);

        let records = session.sink().records();
        assert_eq!(records.len(), 6);
        let steps: Vec<u32> = records.iter().map(|r| r.step_before).collect();
        assert_eq!(steps, vec![51, 41, 31, 21, 11, 2]);
        assert!(records.iter().all(|r| r.correct));
        assert!(records.iter().all(|r| r.rt_ms == 600));
        assert_eq!(session.presenter().remaining_answers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_follow_presented_plan() {
        let cfg = ExperimentConfig {
            max_trials: 8,
            ..config(0)
        };
        let answers = vec![true, false, true, true, false, false, true, true];
        let mut session = orchestrator(cfg, ScriptedPresenter::new(answers.clone()));
        session.run_main().await.unwrap();

        let records = session.sink().records();
        let played = session.presenter().played();
        for (i, record) in records.iter().enumerate() {
            let trial = &played[i * 3..i * 3 + 3];
            let odd = match record.odd_position {
                Interval::First => trial[0],
                Interval::Third => trial[2],
            };
            assert_eq!(odd, StimulusId(record.stimulus_step));
            assert_eq!(record.correct, answers[i]);
            assert_eq!(record.correct, record.response == record.correct_answer);
            assert_eq!(record.trial, i as u32 + 1);
        }
        let third = records
            .iter()
            .filter(|r| r.odd_position == Interval::Third)
            .count();
        assert_eq!(third, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_discards_records() {
        let cfg = config(0);
        let mut session = orchestrator(cfg, ScriptedPresenter::new(vec![true, true, false]));
        let err = session.run().await.unwrap_err();

        assert!(matches!(err, ExperimentError::Aborted));
        assert_eq!(session.phase(), SessionPhase::Aborted);
        assert!(session.sink().records().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_failures_do_not_stall() {
        let cfg = ExperimentConfig {
            max_trials: 3,
            ..config(0)
        };
        let presenter = ScriptedPresenter::new(vec![true, true, true])
            .hang_on(StimulusId(1))
            .fail_on(StimulusId(41));
        let mut session = orchestrator(cfg, presenter);
        let summary = session.run().await.unwrap();
        assert_eq!(summary.trials, 3);
        assert_eq!(session.sink().records().len(), 3);
    }
}
