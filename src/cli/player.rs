//! Terminal presenter: plays stimulus files through an external player
//! command and reads interval choices from the keyboard.
//!
//! Completion of a stimulus is the player process exiting. The session
//! bounds every `play` with a timeout, and the child is killed if that
//! timeout drops the wait.

use crate::cli::display::Display;
use crate::cli::input::InputHandler;
use crate::config::{ExperimentConfig, PlayerConfig};
use crate::error::{ExperimentError, Result};
use crate::presentation::{Presenter, SessionEvent};
use crate::sequencer::{Interval, StimulusId};
use crossterm::style::Color;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

pub struct TerminalPresenter {
    player: PlayerConfig,
    stimuli_dir: PathBuf,
    extension: String,
    input: InputHandler,
    display: Display,
}

impl TerminalPresenter {
    pub fn new(config: &ExperimentConfig, display: Display) -> Self {
        TerminalPresenter {
            player: config.player.clone(),
            stimuli_dir: config.stimuli_dir.clone(),
            extension: config.stimulus_extension.clone(),
            input: InputHandler::new(),
            display,
        }
    }

    /// `<stimuli_dir>/<id>.<extension>`
    pub fn stimulus_path(&self, stimulus: StimulusId) -> PathBuf {
        self.stimuli_dir
            .join(format!("{}.{}", stimulus, self.extension))
    }

    pub fn display(&self) -> &Display {
        &self.display
    }
}

impl Presenter for TerminalPresenter {
    async fn play(&mut self, stimulus: StimulusId) -> Result<()> {
        let path = self.stimulus_path(stimulus);
        if !path.exists() {
            return Err(ExperimentError::Playback {
                stimulus: stimulus.0,
                reason: format!("{} not found", path.display()),
            });
        }
        debug!(path = %path.display(), "playing stimulus");

        let status = Command::new(&self.player.program)
            .args(&self.player.args)
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|err| ExperimentError::Playback {
                stimulus: stimulus.0,
                reason: format!("{}: {}", self.player.program, err),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExperimentError::Playback {
                stimulus: stimulus.0,
                reason: format!("{} exited with {}", self.player.program, status),
            })
        }
    }

    fn flush_input(&mut self) -> Result<()> {
        let dropped = self.input.drain()?;
        if dropped > 0 {
            debug!(dropped, "discarded input received during playback");
        }
        Ok(())
    }

    async fn await_choice(&mut self) -> Result<Option<Interval>> {
        loop {
            if let Some(key) = self.input.try_read_key()? {
                if InputHandler::is_exit(&key) {
                    return Ok(None);
                }
                if let Some(choice) = InputHandler::key_to_choice(&key) {
                    return Ok(Some(choice));
                }
            }
            tokio::time::sleep(self.input.poll_interval()).await;
        }
    }

    fn notify(&mut self, event: &SessionEvent) -> Result<()> {
        match event {
            SessionEvent::RunStarted { .. } => {
                self.display.clear()?;
                self.display.show_help()?;
            }
            SessionEvent::TrialStarted { kind, trial, trials } => {
                self.display.show_progress(*kind, *trial, *trials)?;
                self.display.clear_feedback()?;
            }
            SessionEvent::Playing => {
                self.display.show_status("Playing tones...", Color::Yellow)?;
            }
            SessionEvent::AwaitingResponse => {
                self.display
                    .show_status("Which tone was different: 1st or 3rd?", Color::Cyan)?;
            }
            SessionEvent::ResponseRecorded => {
                self.display
                    .show_status("Response recorded. Preparing next trial...", Color::DarkGrey)?;
            }
            SessionEvent::PracticeFeedback { correct } => {
                self.display.show_feedback(*correct)?;
            }
            SessionEvent::Finished {
                threshold,
                reversals,
            } => {
                self.display.show_status("Test complete.", Color::Green)?;
                self.display.show_threshold(*threshold, *reversals)?;
            }
        }
        Ok(())
    }
}
