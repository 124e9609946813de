//! Presentation: stimulus playback and response capture
//!
//! # Components
//! - `Presenter`: capability the session drives (play, wait, await choice)
//! - `play_sequence`: three stimuli with fixed gaps and a per-stimulus
//!   timeout fallback
//! - `scripted.rs`: deterministic presenter answering from a script

pub mod scripted;

use crate::config::TimingConfig;
use crate::error::Result;
use crate::sequencer::{Interval, StimulusId};
use std::time::Duration;
use tracing::warn;

pub use scripted::ScriptedPresenter;

/// Which run a trial belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Practice,
    Main,
}

/// Progress notifications sent to the presenter
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    RunStarted { kind: RunKind, trials: u32 },
    TrialStarted { kind: RunKind, trial: u32, trials: u32 },
    Playing,
    AwaitingResponse,
    ResponseRecorded,
    PracticeFeedback { correct: bool },
    Finished { threshold: Option<f64>, reversals: u32 },
}

/// External playback and input capability.
///
/// `play` resolves when the stimulus has finished; callers bound it with a
/// timeout, so an implementation that never signals completion cannot
/// stall a session.
#[allow(async_fn_in_trait)]
pub trait Presenter {
    async fn play(&mut self, stimulus: StimulusId) -> Result<()>;

    async fn wait_ms(&mut self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Drop any input received before the response window opened
    fn flush_input(&mut self) -> Result<()> {
        Ok(())
    }

    /// Next choice from the subject; `None` when the subject aborts
    async fn await_choice(&mut self) -> Result<Option<Interval>>;

    fn notify(&mut self, _event: &SessionEvent) -> Result<()> {
        Ok(())
    }
}

/// Play three stimuli separated by the inter-stimulus gap, then wait the
/// post-sequence gap. Playback errors and missing completion signals are
/// logged and skipped.
pub async fn play_sequence<P: Presenter>(
    presenter: &mut P,
    stimuli: [StimulusId; 3],
    timing: &TimingConfig,
) {
    let fallback = Duration::from_millis(timing.playback_timeout_ms);
    for (idx, stimulus) in stimuli.into_iter().enumerate() {
        match tokio::time::timeout(fallback, presenter.play(stimulus)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%stimulus, error = %err, "playback failed, continuing"),
            Err(_) => warn!(
                %stimulus,
                timeout_ms = timing.playback_timeout_ms,
                "no playback completion signal, continuing"
            ),
        }
        if idx + 1 < stimuli.len() {
            presenter.wait_ms(timing.inter_stimulus_ms).await;
        }
    }
    presenter.wait_ms(timing.post_sequence_ms).await;
}
