//! Experiment configuration
//!
//! Loaded from a JSON file; every field falls back to the standard protocol
//! (start at step 51 of 101, 75 trials, stop after 7 reversals).

use crate::error::{ExperimentError, Result};
use crate::staircase::StaircaseParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Gaps and timeouts around stimulus playback, in milliseconds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    #[serde(default = "TimingConfig::default_inter_stimulus_ms")]
    pub inter_stimulus_ms: u64,
    #[serde(default = "TimingConfig::default_post_sequence_ms")]
    pub post_sequence_ms: u64,
    #[serde(default = "TimingConfig::default_post_response_ms")]
    pub post_response_ms: u64,
    /// Upper bound on a single stimulus when no completion signal arrives
    #[serde(default = "TimingConfig::default_playback_timeout_ms")]
    pub playback_timeout_ms: u64,
}

impl TimingConfig {
    fn default_inter_stimulus_ms() -> u64 {
        500
    }
    fn default_post_sequence_ms() -> u64 {
        500
    }
    fn default_post_response_ms() -> u64 {
        1000
    }
    fn default_playback_timeout_ms() -> u64 {
        5000
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            inter_stimulus_ms: Self::default_inter_stimulus_ms(),
            post_sequence_ms: Self::default_post_sequence_ms(),
            post_response_ms: Self::default_post_response_ms(),
            playback_timeout_ms: Self::default_playback_timeout_ms(),
        }
    }
}

/// External command used to play one stimulus file (the path is appended)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayerConfig {
    #[serde(default = "PlayerConfig::default_program")]
    pub program: String,
    #[serde(default = "PlayerConfig::default_args")]
    pub args: Vec<String>,
}

impl PlayerConfig {
    fn default_program() -> String {
        "ffplay".to_string()
    }
    fn default_args() -> Vec<String> {
        ["-nodisp", "-autoexit", "-loglevel", "quiet"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            args: Self::default_args(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    #[serde(default = "ExperimentConfig::default_starting_step")]
    pub starting_step: u32,
    #[serde(default = "ExperimentConfig::default_max_trials")]
    pub max_trials: u32,
    #[serde(default = "ExperimentConfig::default_num_steps")]
    pub num_steps: u32,
    #[serde(default = "ExperimentConfig::default_target_reversals")]
    pub target_reversals: u32,
    #[serde(default = "ExperimentConfig::default_step_sizes")]
    pub step_sizes: Vec<u32>,
    #[serde(default = "ExperimentConfig::default_practice_trials")]
    pub practice_trials: u32,
    /// Stimulus used for both base tones
    #[serde(default = "ExperimentConfig::default_base_step")]
    pub base_step: u32,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default = "ExperimentConfig::default_stimuli_dir")]
    pub stimuli_dir: PathBuf,
    #[serde(default = "ExperimentConfig::default_stimulus_extension")]
    pub stimulus_extension: String,
    #[serde(default)]
    pub player: PlayerConfig,
    /// Fixed seed for interval-order shuffling; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ExperimentConfig {
    fn default_starting_step() -> u32 {
        51
    }
    fn default_max_trials() -> u32 {
        75
    }
    fn default_num_steps() -> u32 {
        101
    }
    fn default_target_reversals() -> u32 {
        7
    }
    fn default_step_sizes() -> Vec<u32> {
        vec![10, 5, 2, 1, 1, 1, 1, 1]
    }
    fn default_practice_trials() -> u32 {
        4
    }
    fn default_base_step() -> u32 {
        1
    }
    fn default_stimuli_dir() -> PathBuf {
        PathBuf::from("Stimuli")
    }
    fn default_stimulus_extension() -> String {
        "flac".to_string()
    }

    /// Load from `path`, or return defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: ExperimentConfig = serde_json::from_str(&content)?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.step_sizes.is_empty() {
            return Err(ExperimentError::InvalidConfig(
                "step_sizes must not be empty".into(),
            ));
        }
        if self.num_steps < 2 {
            return Err(ExperimentError::InvalidConfig(format!(
                "num_steps must be at least 2, got {}",
                self.num_steps
            )));
        }
        if !(2..=self.num_steps).contains(&self.starting_step) {
            return Err(ExperimentError::InvalidConfig(format!(
                "starting_step {} outside [2, {}]",
                self.starting_step, self.num_steps
            )));
        }
        if !(1..=self.num_steps).contains(&self.base_step) {
            return Err(ExperimentError::InvalidConfig(format!(
                "base_step {} outside [1, {}]",
                self.base_step, self.num_steps
            )));
        }
        if self.max_trials == 0 {
            return Err(ExperimentError::InvalidConfig(
                "max_trials must be positive".into(),
            ));
        }
        if self.target_reversals == 0 {
            return Err(ExperimentError::InvalidConfig(
                "target_reversals must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Staircase parameters for the main run
    pub fn staircase_params(&self) -> StaircaseParams {
        StaircaseParams {
            starting_step: self.starting_step,
            num_steps: self.num_steps,
            max_trials: self.max_trials,
            target_reversals: self.target_reversals,
            step_sizes: self.step_sizes.clone(),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            starting_step: Self::default_starting_step(),
            max_trials: Self::default_max_trials(),
            num_steps: Self::default_num_steps(),
            target_reversals: Self::default_target_reversals(),
            step_sizes: Self::default_step_sizes(),
            practice_trials: Self::default_practice_trials(),
            base_step: Self::default_base_step(),
            timing: TimingConfig::default(),
            stimuli_dir: Self::default_stimuli_dir(),
            stimulus_extension: Self::default_stimulus_extension(),
            player: PlayerConfig::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExperimentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.step_sizes, vec![10, 5, 2, 1, 1, 1, 1, 1]);
        assert_eq!(config.timing.inter_stimulus_ms, 500);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExperimentConfig::load_or_default(dir.path().join("none.json")).unwrap();
        assert_eq!(config, ExperimentConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"max_trials": 40, "timing": {{"post_response_ms": 250}}}}"#).unwrap();

        let config = ExperimentConfig::load_or_default(file.path()).unwrap();
        assert_eq!(config.max_trials, 40);
        assert_eq!(config.timing.post_response_ms, 250);
        assert_eq!(config.timing.inter_stimulus_ms, 500);
        assert_eq!(config.num_steps, 101);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ExperimentConfig::load_or_default(file.path()),
            Err(ExperimentError::Json(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExperimentConfig::default();
        config.step_sizes.clear();
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.starting_step = 1;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.starting_step = 102;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.max_trials = 0;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.target_reversals = 0;
        assert!(config.validate().is_err());
    }
}
