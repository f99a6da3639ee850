//! `snntrack` CLI: batch scenario runs, metrics, replay import/export.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sim::replay::{load_replay, save_replay, GroundTruthFrame, RecordedFrame, ReplayLog, TargetState};
use sim::scenarios::{Scenario, ScenarioKind};
use sim::sensor_sim::SensorSimulator;
use std::path::PathBuf;
use tracker_core::metrics::{GroundTruth, TrackingMetrics};
use tracker_core::pipeline::{Pipeline, PipelineConfig};
use tracker_core::track::TrackStatus;

/// Euclidean radius for matching tracks to ground truth in metrics (meters).
const METRICS_MATCH_RADIUS: f64 = 10.0;

#[derive(Parser)]
#[command(name = "snntrack", about = "Single-nearest-neighbor tracker CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario in batch mode and output metrics.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Load and replay a previously recorded scenario log.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            output,
            save_replay: save_path,
        } => run_scenario(scenario, seed, output.as_deref(), save_path.as_deref()),
        Commands::Replay { input, output } => run_replay(&input, output.as_deref()),
    }
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    output_path: Option<&std::path::Path>,
    replay_path: Option<&std::path::Path>,
) -> Result<()> {
    let mut scenario = Scenario::build(kind, seed);
    let mut sensor_sim = SensorSimulator::new(scenario.sensors.clone(), seed);
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let mut metrics = TrackingMetrics::default();

    println!(
        "Running scenario '{}' (seed={}, {} cycles @ {:.1}s)...",
        scenario.name, seed, scenario.cycles, scenario.dt
    );

    let start = std::time::Instant::now();
    let mut frames: Vec<RecordedFrame> = Vec::new();
    let mut gt_frames: Vec<GroundTruthFrame> = Vec::new();
    let mut time = 0.0;

    for _ in 0..scenario.cycles {
        // One association cycle per sensor frame: a track absorbs at most one
        // measurement per cycle, so sensors report one at a time.
        for sensor_idx in 0..scenario.sensors.len() {
            let measurements = sensor_sim.generate_for(sensor_idx, &scenario.targets, time);
            let summary = pipeline.process_cycle(&measurements, time)?;
            tracing::debug!(
                time,
                sensor = sensor_idx,
                matches = summary.matches.len(),
                births = summary.births,
                deletions = summary.deletions,
                "cycle complete"
            );

            if replay_path.is_some() {
                frames.push(RecordedFrame::record(time, &measurements, &scenario.sensors));
                gt_frames.push(ground_truth_frame(&scenario, time));
            }
        }

        accumulate_metrics(&mut metrics, &pipeline, &scenario, time);
        for target in &mut scenario.targets {
            target.step(scenario.dt);
        }
        time += scenario.dt;
    }

    let elapsed = start.elapsed();
    print_summary(&pipeline, &metrics, elapsed.as_secs_f64());

    if let Some(rpath) = replay_path {
        let log = ReplayLog {
            scenario: scenario.kind.clone(),
            name: scenario.name.clone(),
            seed,
            dt: scenario.dt,
            frames,
            ground_truth: gt_frames,
        };
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output_path {
        write_metrics(opath, &scenario.name, seed, &pipeline, &metrics, elapsed.as_secs_f64())?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn run_replay(input: &std::path::Path, output_path: Option<&std::path::Path>) -> Result<()> {
    let log = load_replay(input)?;
    println!("Replaying '{}' ({} frames)...", log.name, log.frames.len());

    // Reattach sensor handles from a freshly built scenario.
    let scenario = Scenario::build(log.scenario.clone(), log.seed);
    let mut pipeline = Pipeline::new(PipelineConfig::default());
    let mut metrics = TrackingMetrics::default();
    let start = std::time::Instant::now();

    for (frame, gt) in log.frames.iter().zip(&log.ground_truth) {
        let measurements = frame.to_measurements(&scenario.sensors);
        pipeline.process_cycle(&measurements, frame.time)?;

        let tracks: Vec<_> = pipeline.tracks.iter().map(|t| (t.id, t.state)).collect();
        let truths: Vec<GroundTruth> = gt
            .targets
            .iter()
            .map(|t| GroundTruth {
                target_id: t.id,
                time: gt.time,
                state: t.state,
            })
            .collect();
        metrics.accumulate(&tracks, &truths, METRICS_MATCH_RADIUS);
    }

    let elapsed = start.elapsed();
    print_summary(&pipeline, &metrics, elapsed.as_secs_f64());

    if let Some(opath) = output_path {
        write_metrics(opath, &log.name, log.seed, &pipeline, &metrics, elapsed.as_secs_f64())?;
    }

    Ok(())
}

fn accumulate_metrics(
    metrics: &mut TrackingMetrics,
    pipeline: &Pipeline,
    scenario: &Scenario,
    time: f64,
) {
    let tracks: Vec<_> = pipeline.tracks.iter().map(|t| (t.id, t.state)).collect();
    let truths: Vec<GroundTruth> = scenario
        .targets
        .iter()
        .filter(|t| t.is_active(time))
        .map(|t| GroundTruth {
            target_id: t.id,
            time,
            state: t.state,
        })
        .collect();
    metrics.accumulate(&tracks, &truths, METRICS_MATCH_RADIUS);
}

fn ground_truth_frame(scenario: &Scenario, time: f64) -> GroundTruthFrame {
    GroundTruthFrame {
        time,
        targets: scenario
            .targets
            .iter()
            .filter(|t| t.is_active(time))
            .map(|t| TargetState {
                id: t.id,
                state: t.state,
            })
            .collect(),
    }
}

fn print_summary(pipeline: &Pipeline, metrics: &TrackingMetrics, elapsed_s: f64) {
    let confirmed = pipeline
        .tracks
        .iter()
        .filter(|t| t.status == TrackStatus::Confirmed)
        .count();
    let tentative = pipeline
        .tracks
        .iter()
        .filter(|t| t.status == TrackStatus::Tentative)
        .count();
    println!(
        "Done: {} tracks alive ({} confirmed, {} tentative), elapsed={:.2}s",
        pipeline.tracks.len(),
        confirmed,
        tentative,
        elapsed_s
    );
    println!(
        "RMSE pos={:.2}m vel={:.2}m/s, precision={:.2}, recall={:.2}, id-switches={}",
        metrics.rmse_position(),
        metrics.rmse_velocity(),
        metrics.precision(),
        metrics.recall(),
        metrics.id_switches
    );
}

fn write_metrics(
    path: &std::path::Path,
    scenario: &str,
    seed: u64,
    pipeline: &Pipeline,
    metrics: &TrackingMetrics,
    elapsed_s: f64,
) -> Result<()> {
    let json = serde_json::json!({
        "scenario": scenario,
        "seed": seed,
        "elapsed_s": elapsed_s,
        "final_tracks": pipeline.tracks.len(),
        "rmse_position": metrics.rmse_position(),
        "rmse_velocity": metrics.rmse_velocity(),
        "precision": metrics.precision(),
        "recall": metrics.recall(),
        "id_switches": metrics.id_switches,
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    Ok(())
}
