//! Golden-trace regression for the standard protocol:
//! start 51 of 101, 7 reversals, 75 trials, steps [10, 5, 2, 1, 1, 1, 1, 1].

use pitch_staircase::presentation::ScriptedPresenter;
use pitch_staircase::sequencer::TrialSequencer;
use pitch_staircase::session::{DataSink, RecordTable, SessionOrchestrator, SubjectId};
use pitch_staircase::{ExperimentConfig, StaircaseController, StaircaseParams};

const SCRIPT: &str = "CCCCICCCCICCICICCCCI";

/// (step_before, step_after, step_size_used, reversals_after)
const TRACE: [(u32, u32, u32, u32); 20] = [
    (51, 41, 10, 0),
    (41, 31, 10, 0),
    (31, 21, 10, 0),
    (21, 11, 10, 0),
    (11, 16, 5, 1),
    (16, 16, 5, 1),
    (16, 14, 2, 2),
    (14, 14, 2, 2),
    (14, 12, 2, 2),
    (12, 13, 1, 3),
    (13, 13, 1, 3),
    (13, 12, 1, 4),
    (12, 13, 1, 5),
    (13, 13, 1, 5),
    (13, 14, 1, 5),
    (14, 14, 1, 5),
    (14, 13, 1, 6),
    (13, 13, 1, 6),
    (13, 12, 1, 6),
    (12, 13, 1, 7),
];

fn script() -> Vec<bool> {
    SCRIPT.chars().map(|c| c == 'C').collect()
}

#[test]
fn staircase_reproduces_trace() {
    let mut ctrl = StaircaseController::new(StaircaseParams::default()).unwrap();

    for (i, (was_correct, expected)) in script().into_iter().zip(TRACE).enumerate() {
        assert!(!ctrl.is_terminated(), "terminated early at trial {}", i + 1);
        ctrl.begin_trial().unwrap();
        let out = ctrl.advance(was_correct).unwrap();
        assert_eq!(
            (out.step_before, out.step_after, out.step_size_used, out.reversal_count),
            expected,
            "trial {}",
            i + 1
        );
    }

    assert!(ctrl.is_terminated());
    assert_eq!(ctrl.state().reversal_count, 7);
    // reversals at steps 16, 12, 13, 12, 14, 12; the first (11) is excluded
    assert_eq!(ctrl.state().reversal_step_sum, 79);
    assert_eq!(ctrl.threshold(), Some(79.0 / 6.0));
}

#[tokio::test(start_paused = true)]
async fn session_export_matches_trace() {
    let config = ExperimentConfig {
        practice_trials: 0,
        seed: Some(2024),
        ..ExperimentConfig::default()
    };
    let mut answers = script();
    // extra answers must stay unused once the reversal target is reached
    answers.extend([true; 5]);

    let sequencer = TrialSequencer::from_seed(config.seed, config.base_step, config.num_steps);
    let mut session = SessionOrchestrator::new(
        config,
        SubjectId::new("Doe, Jane").unwrap(),
        ScriptedPresenter::new(answers),
        RecordTable::new(),
        sequencer,
    )
    .unwrap();

    let summary = session.run().await.unwrap();
    assert_eq!(summary.trials, 20);
    assert_eq!(summary.reversals, 7);
    assert_eq!(summary.threshold, Some(79.0 / 6.0));
    assert_eq!(session.presenter().remaining_answers(), 5);

    let csv = session.sink().to_csv();
    assert!(csv.lines().nth(1).unwrap().starts_with("\"Doe, Jane\",1,51,"));
    assert!(csv.ends_with(",12,13,1,13.166666666666666"));

    let parsed = RecordTable::from_csv(&csv).unwrap();
    assert_eq!(&parsed, session.sink());
    for (record, (before, after, size, reversals)) in parsed.records().iter().zip(TRACE) {
        assert_eq!(record.subject_id, "Doe, Jane");
        assert_eq!(record.stimulus_step, before);
        assert_eq!(record.step_before, before);
        assert_eq!(record.step_after, after);
        assert_eq!(record.step_size_used, size);
        assert_eq!(record.num_reversals_after, reversals);
        assert_eq!(record.mean_reversal_so_far.is_some(), reversals > 1);
    }
    assert_eq!(parsed.records()[6].mean_reversal_so_far, Some(16.0));
    assert_eq!(parsed.records()[11].mean_reversal_so_far, Some(41.0 / 3.0));
}

#[tokio::test(start_paused = true)]
async fn trial_cap_stops_before_reversal_target() {
    let config = ExperimentConfig {
        practice_trials: 0,
        max_trials: 10,
        seed: Some(9),
        ..ExperimentConfig::default()
    };
    let sequencer = TrialSequencer::from_seed(config.seed, config.base_step, config.num_steps);
    let mut session = SessionOrchestrator::new(
        config,
        SubjectId::new("s02").unwrap(),
        ScriptedPresenter::new(script()),
        RecordTable::new(),
        sequencer,
    )
    .unwrap();

    let summary = session.run().await.unwrap();
    assert_eq!(summary.trials, 10);
    assert_eq!(summary.reversals, 3);
    assert_eq!(summary.threshold, Some(14.0));

    let dir = tempfile::tempdir().unwrap();
    let path = session.sink().export_csv(dir.path(), "s02").unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "s02_pitch_discrimination.csv"
    );
    let text = std::fs::read_to_string(path).unwrap();
    assert_eq!(text.lines().count(), 11);
}
