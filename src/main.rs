//! Pitch Discrimination Test - adaptive two-down/one-up staircase
//!
//! Single-subject, single-session CLI. Plays stimulus files through an
//! external player and writes the trial table as CSV when the run ends.

use clap::Parser;
use pitch_staircase::cli::display::threshold_text;
use pitch_staircase::cli::{Display, InputHandler, TerminalPresenter};
use pitch_staircase::sequencer::TrialSequencer;
use pitch_staircase::session::{RecordTable, SessionOrchestrator, SubjectId};
use pitch_staircase::{ExperimentConfig, ExperimentError};
use std::error::Error;
use std::io::{self, BufRead};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "Pitch Discrimination Test")]
#[command(about = "Three-interval pitch discrimination with an adaptive staircase")]
struct Args {
    /// Subject identifier (used in the CSV and its file name)
    #[arg(short, long)]
    subject: String,

    /// Path to JSON config
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Directory for the exported CSV
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Seed for the interval order (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of practice trials (overrides config)
    #[arg(long)]
    practice_trials: Option<u32>,

    /// Trial cap of the main run (overrides config)
    #[arg(long)]
    max_trials: Option<u32>,

    /// Directory holding <step>.<ext> stimulus files (overrides config)
    #[arg(long)]
    stimuli: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn apply(&self, config: &mut ExperimentConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(n) = self.practice_trials {
            config.practice_trials = n;
        }
        if let Some(n) = self.max_trials {
            config.max_trials = n;
        }
        if let Some(dir) = &self.stimuli {
            config.stimuli_dir = dir.clone();
        }
    }
}

fn init_logging(debug: bool) {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if debug {
        if let Ok(d) = "pitch_staircase=debug".parse() {
            filter = filter.add_directive(d);
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn show_instructions(config: &ExperimentConfig) -> io::Result<()> {
    println!("Each trial plays three tones. Two are identical; the 1st or the 3rd differs in pitch.");
    println!("After the third tone, press 1 or 3 to name the different tone.");
    println!(
        "{} practice trials with feedback, then up to {} test trials.",
        config.practice_trials, config.max_trials
    );
    println!("Press ENTER to start.");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.debug);

    let subject = SubjectId::new(&args.subject)?;
    let mut config = ExperimentConfig::load_or_default(&args.config)?;
    args.apply(&mut config);
    config.validate()?;

    println!("Pitch Discrimination Test v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "Subject: {} | Steps: {} | Start: {} | Target reversals: {}",
        subject, config.num_steps, config.starting_step, config.target_reversals
    );
    show_instructions(&config)?;

    let sequencer = TrialSequencer::from_seed(config.seed, config.base_step, config.num_steps);
    let presenter = TerminalPresenter::new(&config, Display::new(subject.as_str()));
    let mut session = SessionOrchestrator::new(
        config,
        subject.clone(),
        presenter,
        RecordTable::new(),
        sequencer,
    )?;

    InputHandler::enable_raw_mode()?;
    let outcome = session.run().await;
    InputHandler::disable_raw_mode()?;

    let (presenter, records) = session.into_parts();
    drop(presenter);

    match outcome {
        Ok(summary) => {
            let path = records.export_csv(&args.out, subject.as_str())?;
            println!("\n{}", threshold_text(summary.threshold));
            println!(
                "Trials: {} | Reversals: {} | Saved: {}",
                summary.trials,
                summary.reversals,
                path.display()
            );
            Ok(())
        }
        Err(ExperimentError::Aborted) => {
            println!("\nSession aborted; no data was saved.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
