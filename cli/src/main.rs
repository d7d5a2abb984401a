//! `headsup` CLI: scenario runs, replays, PNG frame dumps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hud_core::orientation::OrientationEstimator;
use hud_core::{EulerAngles, HudConfig, HudFrame, HudPipeline, RadarRenderer, SpeedThreshold};
use rayon::prelude::*;
use serde::Serialize;
use sim::replay::{load_replay, save_replay, ReplayLog};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "headsup", about = "Rider HUD radar overlay and head tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a named scenario, drive the HUD and report a summary.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// HUD configuration (JSON); defaults when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write every rendered frame as PNG into this directory
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        /// Also save the recorded replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
        /// Output the summary to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load and replay a previously recorded log.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        frames_dir: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// What a run reports.
#[derive(Debug, Default, Serialize)]
struct RunSummary {
    scenario: String,
    seed: u64,
    frames: usize,
    tracks_drawn: usize,
    samples_integrated: usize,
    samples_rejected: usize,
    mean_render_us: f64,
    max_render_us: u64,
    /// RMS attitude error against the simulated truth, (roll, pitch, yaw) in degrees
    attitude_rms_deg: Option<[f64; 3]>,
    final_attitude: Option<EulerAngles>,
    elapsed_s: f64,
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
            config,
            frames_dir,
            save_replay: replay_path,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            run_scenario(
                scenario,
                seed,
                &config,
                frames_dir.as_deref(),
                replay_path.as_deref(),
                output.as_deref(),
            )?;
        }
        Commands::Replay {
            input,
            config,
            frames_dir,
            output,
        } => {
            let config = load_config(config.as_deref())?;
            run_replay(&input, &config, frames_dir.as_deref(), output.as_deref())?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<HudConfig> {
    let config = match path {
        Some(p) => HudConfig::load(p)?,
        None => HudConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config: &HudConfig,
    frames_dir: Option<&Path>,
    replay_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind, seed);
    println!(
        "Running scenario '{}' (seed={}, duration={:.0}s)...",
        scenario.name, seed, scenario.duration
    );

    let start = Instant::now();
    let log = scenario.record();
    let mut pipeline = HudPipeline::new(config)?;
    let mut tracks = log.track_source();
    let mut imu = log.inertial_source();

    if let Some(dir) = frames_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut frames: Vec<HudFrame> = Vec::with_capacity(log.frames.len());
    while let Some(frame) = pipeline.poll(&mut tracks, &mut imu) {
        if let Some(dir) = frames_dir {
            write_frame(dir, frame.index as usize, &frame.canvas)?;
        }
        frames.push(frame);
    }

    let mut summary = summarize(&log, &frames);
    summary.elapsed_s = start.elapsed().as_secs_f64();
    print_summary(&summary);

    if let Some(rpath) = replay_path {
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }
    if let Some(opath) = output_path {
        write_summary(&summary, opath)?;
    }

    Ok(())
}

fn run_replay(
    input: &Path,
    config: &HudConfig,
    frames_dir: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let log = load_replay(input)?;
    println!(
        "Replaying '{}' ({} frames, {} samples)...",
        log.scenario_name,
        log.frames.len(),
        log.sample_count()
    );

    let start = Instant::now();

    // Attitude depends on every earlier sample: estimate sequentially.
    let mut estimator = OrientationEstimator::new(config.estimator)?;
    let stats: Vec<_> = log
        .frames
        .iter()
        .map(|f| {
            let s = estimator.integrate_all(&f.samples);
            (s, estimator.attitude().ok())
        })
        .collect();

    // Frames are independent once the attitude is known: render in parallel.
    let renderer = RadarRenderer::new(config.display.clone())?;
    let classifier = SpeedThreshold::default();
    let frames: Vec<HudFrame> = log
        .frames
        .par_iter()
        .zip(stats.par_iter())
        .enumerate()
        .map(|(index, (f, (s, attitude)))| {
            let t0 = Instant::now();
            let canvas = renderer.render(&f.tracks, &classifier);
            HudFrame {
                index: index as u64,
                canvas,
                attitude: *attitude,
                track_count: f.tracks.len(),
                samples_integrated: s.integrated,
                samples_rejected: s.rejected,
                render_time_us: t0.elapsed().as_micros() as u64,
            }
        })
        .collect();

    if let Some(dir) = frames_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        frames
            .par_iter()
            .try_for_each(|f| write_frame(dir, f.index as usize, &f.canvas))?;
    }

    let mut summary = summarize(&log, &frames);
    summary.elapsed_s = start.elapsed().as_secs_f64();
    print_summary(&summary);

    if let Some(opath) = output_path {
        write_summary(&summary, opath)?;
    }

    Ok(())
}

fn write_frame(dir: &Path, index: usize, canvas: &hud_core::RadarCanvas) -> Result<()> {
    let path = dir.join(format!("frame_{index:05}.png"));
    canvas
        .save_png(&path)
        .with_context(|| format!("writing {}", path.display()))
}

fn summarize(log: &ReplayLog, frames: &[HudFrame]) -> RunSummary {
    let n = frames.len();
    let total_render: u64 = frames.iter().map(|f| f.render_time_us).sum();

    let mut sq = [0.0f64; 3];
    let mut compared = 0usize;
    for (frame, recorded) in frames.iter().zip(&log.frames) {
        if let (Some(est), Some(truth)) = (frame.attitude, recorded.truth) {
            let (er, ep, ey) = est.to_degrees();
            let (tr, tp, ty) = truth.to_degrees();
            for (acc, e) in sq.iter_mut().zip([er - tr, ep - tp, wrap_deg(ey - ty)]) {
                *acc += e * e;
            }
            compared += 1;
        }
    }
    let attitude_rms_deg = (compared > 0).then(|| sq.map(|s| (s / compared as f64).sqrt()));
    if compared == 0 && n > 0 {
        warn!("no frame had both an estimate and a reference attitude");
    }

    RunSummary {
        scenario: log.scenario_name.clone(),
        seed: log.seed,
        frames: n,
        tracks_drawn: frames.iter().map(|f| f.track_count).sum(),
        samples_integrated: frames.iter().map(|f| f.samples_integrated).sum(),
        samples_rejected: frames.iter().map(|f| f.samples_rejected).sum(),
        mean_render_us: if n > 0 {
            total_render as f64 / n as f64
        } else {
            0.0
        },
        max_render_us: frames.iter().map(|f| f.render_time_us).max().unwrap_or(0),
        attitude_rms_deg,
        final_attitude: frames.last().and_then(|f| f.attitude),
        elapsed_s: 0.0,
    }
}

fn wrap_deg(d: f64) -> f64 {
    hud_core::projection::normalize_bearing_deg(d)
}

fn print_summary(s: &RunSummary) {
    println!(
        "Done: {} frames, {} tracks drawn, {} samples ({} rejected), elapsed={:.2}s",
        s.frames, s.tracks_drawn, s.samples_integrated, s.samples_rejected, s.elapsed_s
    );
    println!(
        "Render: mean {:.0} µs, max {} µs",
        s.mean_render_us, s.max_render_us
    );
    match (s.final_attitude, s.attitude_rms_deg) {
        (Some(a), Some([r, p, y])) => {
            println!("Attitude: {a} (rms error roll {r:.2}° pitch {p:.2}° yaw {y:.2}°)")
        }
        (Some(a), None) => println!("Attitude: {a}"),
        _ => println!("Attitude: not available"),
    }
    info!(frames = s.frames, scenario = %s.scenario, "run complete");
}

fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(summary)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Summary saved to {}", path.display());
    Ok(())
}
