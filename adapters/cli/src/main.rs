#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Holdout wave simulation.
//!
//! Units are killed at random to stand in for the combat collaborators, so
//! waves drain and advance on their own.

use std::{
    f32::consts::TAU,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glam::{Quat, Vec3};
use holdout_core::{Event, SpawnPoint};
use holdout_simulation::{Simulation, SimulationConfig};
use holdout_wave_curve::WaveCurve;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

const SPAWN_RING_RADIUS: f32 = 20.0;

/// Runs a headless Holdout wave simulation.
#[derive(Debug, Parser)]
#[command(name = "holdout", version)]
struct CliArgs {
    /// Number of players the wave budgets are computed for.
    #[arg(long, default_value_t = 1)]
    participants: u32,
    /// Simulated duration in seconds.
    #[arg(long, default_value_t = 120.0)]
    seconds: f64,
    /// Length of one simulation tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Seed for spawn point selection and the synthetic kill model.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,
    /// Probability that a live unit dies during any given tick.
    #[arg(long, default_value_t = 0.01)]
    kill_chance: f64,
    /// Number of spawn points placed on a ring around the origin.
    #[arg(long, default_value_t = 4)]
    spawn_points: u32,
    /// Seconds between a wave ending and the next one beginning.
    #[arg(long, default_value_t = 5.0)]
    transition: f64,
    /// Optional TOML file overriding the wave curve tuning.
    #[arg(long)]
    curve: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct RunSummary {
    spawned: u32,
    died: u32,
    waves_completed: u32,
    final_wave: u32,
}

/// Entry point for the Holdout command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = CliArgs::parse();
    let curve = load_curve(args.curve.as_deref())?;
    let summary = run(&args, curve)?;

    println!(
        "simulated {:.1}s: {} spawned, {} died, {} waves completed, now on wave {}",
        args.seconds, summary.spawned, summary.died, summary.waves_completed, summary.final_wave
    );
    Ok(())
}

fn load_curve(path: Option<&Path>) -> Result<WaveCurve> {
    let Some(path) = path else {
        return Ok(WaveCurve::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read wave curve {}", path.display()))?;
    WaveCurve::from_toml_str(&contents)
        .with_context(|| format!("failed to load wave curve {}", path.display()))
}

fn run(args: &CliArgs, curve: WaveCurve) -> Result<RunSummary> {
    if args.tick_ms == 0 {
        bail!("tick length must be positive");
    }
    if !args.seconds.is_finite() || args.seconds < 0.0 {
        bail!("simulated duration must be a non-negative number of seconds");
    }
    if !(0.0..=1.0).contains(&args.kill_chance) {
        bail!("kill chance must be within [0, 1], got {}", args.kill_chance);
    }
    if !args.transition.is_finite() || args.transition < 0.0 {
        bail!("transition must be a non-negative number of seconds");
    }

    let config = SimulationConfig::new(args.participants)
        .with_transition(Duration::from_secs_f64(args.transition))
        .with_seed(args.seed)
        .with_spawn_points(spawn_ring(args.spawn_points, SPAWN_RING_RADIUS));
    let mut simulation = Simulation::new(config, curve);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed.rotate_left(32));
    let mut summary = RunSummary::default();

    let dt = Duration::from_millis(args.tick_ms);
    let ticks = (args.seconds * 1_000.0 / args.tick_ms as f64).floor() as u64;
    tracing::info!(
        ticks,
        participants = args.participants,
        seed = args.seed,
        "starting simulation"
    );

    for _ in 0..ticks {
        for event in simulation.advance(dt) {
            record(&event, &mut summary);
        }
        for unit in simulation.live_units() {
            if rng.gen_bool(args.kill_chance) {
                for event in simulation.report_death(unit) {
                    record(&event, &mut summary);
                }
            }
        }
    }

    summary.final_wave = simulation.wave().get();
    Ok(summary)
}

fn spawn_ring(count: u32, radius: f32) -> Vec<SpawnPoint> {
    (0..count)
        .map(|index| {
            let angle = TAU * index as f32 / count as f32;
            let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);
            let facing = Quat::from_rotation_y(-angle - TAU / 4.0);
            SpawnPoint::new(position, facing)
        })
        .collect()
}

fn record(event: &Event, summary: &mut RunSummary) {
    match event {
        Event::TimeAdvanced { .. } => {}
        Event::UnitSpawned {
            unit,
            wave,
            position,
        } => {
            summary.spawned += 1;
            tracing::debug!(
                unit = unit.get(),
                wave = wave.get(),
                x = position.x,
                z = position.z,
                "unit spawned"
            );
        }
        Event::UnitDied { unit } => {
            summary.died += 1;
            tracing::debug!(unit = unit.get(), "unit died");
        }
        Event::SpawnPointUnavailable => tracing::warn!("no spawn point available"),
        Event::ConcurrentCapReached { wave } => {
            tracing::debug!(wave = wave.get(), "concurrent cap reached");
        }
        Event::TotalCapReached { wave } => tracing::debug!(wave = wave.get(), "total cap reached"),
        Event::WaveBegan { wave } => tracing::info!(wave = wave.get(), "wave began"),
        Event::WaveEnded { wave } => {
            summary.waves_completed += 1;
            tracing::info!(wave = wave.get(), "wave ended");
        }
    }
}
