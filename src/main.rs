// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rep_tracker::classifier::{ExerciseClassifier, SessionConfig, SessionEvent};
use rep_tracker::config::ClassifierConfig;
use rep_tracker::data::{load_recording, replay_session};
use rep_tracker::exercise::{ExerciseKind, FeedbackCode};
use rep_tracker::mediapipe_bridge::ReplaySource;

/// Replays a recorded pose stream and counts exercise reps or hold time.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Exercise performed in the recording
    #[arg(short, long, value_enum, default_value_t = ExerciseKind::Squat)]
    exercise: ExerciseKind,

    /// Recorded landmarks (.csv, or JSON lines for anything else)
    #[arg(short, long)]
    input: PathBuf,

    /// Number of sets (defaults per exercise)
    #[arg(short, long)]
    sets: Option<u32>,

    /// Reps per set, or seconds per set for planks (defaults per exercise)
    #[arg(short, long)]
    target: Option<f64>,

    /// Ignore frames for this long after the first one
    #[arg(long, default_value_t = 3500)]
    countdown_ms: u64,

    /// Threshold overrides (JSON); defaults to the per-user config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let thresholds = ClassifierConfig::load_or_default(cli.config.as_deref());

    let mut session = SessionConfig::for_exercise(cli.exercise).with_countdown(cli.countdown_ms);
    if let Some(sets) = cli.sets {
        session.target_sets = sets;
    }
    if let Some(target) = cli.target {
        session.target = target;
    }

    let mut classifier = ExerciseClassifier::new(session, thresholds)
        .context("Cannot start session")?;

    let frames = load_recording(&cli.input)?;
    tracing::info!("Loaded {} frame(s) from {}", frames.len(), cli.input.display());
    let mut source = ReplaySource::new(frames);

    let mut last_feedback = FeedbackCode::Idle;
    let report = replay_session(&mut classifier, &mut source, |update| {
        for event in &update.events {
            match event {
                SessionEvent::RepCompleted { set, reps } => println!("* rep {} (set {})", reps, set),
                SessionEvent::SetCompleted { set } => println!("* set {} complete", set),
                SessionEvent::SessionFinished => println!("* session finished"),
            }
        }
        if update.state.feedback != last_feedback {
            last_feedback = update.state.feedback;
            println!("{}\n", update.state.scoreboard());
        }
    })?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.render_text());
    }
    Ok(())
}
