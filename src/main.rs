/*
 * Aquarium Boids - Headless Runner
 *
 * Loads a YAML scenario (or the default opening scene: three schools in an
 * 80-unit tank), runs the flock for a number of frames on a simulated frame
 * clock and logs periodic statistics. The final position and heading of every
 * fish are printed so the run can be inspected or piped to a renderer.
 *
 * Logging is controlled with RUST_LOG, e.g. `RUST_LOG=aquarium_boids=debug`.
 */

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use aquarium_boids::{AgentKind, Flock, PopulationEntry, SimulationParams, UpdateMode};

#[derive(Parser, Debug)]
#[command(name = "aquarium-boids", about = "Run a bounded 3D fish flock without a window")]
struct Args {
    /// Scenario file; omitted fields keep their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Simulated frame duration in milliseconds. When given, frames feed the
    /// fixed timestep clock; otherwise every frame is exactly one step.
    #[arg(long)]
    frame_ms: Option<f64>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Replace the initial population, e.g. `--fish Piranha=4 --fish Sunfish=6`.
    #[arg(long = "fish", value_parser = parse_population)]
    fish: Vec<PopulationEntry>,

    /// Steer against a pre-frame snapshot instead of updating in place.
    #[arg(long)]
    snapshot: bool,

    /// Parallel steering (implies --snapshot).
    #[arg(long)]
    parallel: bool,

    /// Log statistics every N frames; 0 disables periodic reports.
    #[arg(long, default_value_t = 60)]
    report_every: u64,
}

fn parse_population(value: &str) -> Result<PopulationEntry, String> {
    let (kind, count) = value
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=COUNT, got `{value}`"))?;
    let kind: AgentKind = kind.parse().map_err(|e| format!("{e}"))?;
    let count = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid fish count `{count}`"))?;
    Ok(PopulationEntry { kind, count })
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}

// load here to keep main clean
fn load_params(args: &Args) -> Result<SimulationParams> {
    let mut params = match &args.config {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open scenario {}", path.display()))?;
            SimulationParams::from_yaml_reader(BufReader::new(file))
                .with_context(|| format!("failed to load scenario {}", path.display()))?
        }
        None => SimulationParams::default(),
    };

    if args.seed.is_some() {
        params.seed = args.seed;
    }
    if !args.fish.is_empty() {
        params.initial_population = args.fish.clone();
    }
    if args.snapshot || args.parallel {
        params.update_mode = UpdateMode::Snapshot;
    }
    if args.parallel {
        params.parallel = true;
    }

    params.validate()?;
    Ok(params)
}

fn frame_duration(ms: f64) -> Result<Duration> {
    match Duration::try_from_secs_f64(ms / 1000.0) {
        Ok(delta) if !delta.is_zero() => Ok(delta),
        Ok(_) => anyhow::bail!("frame duration must be positive, got {ms} ms"),
        Err(err) => anyhow::bail!("frame duration {ms} ms is not usable: {err}"),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let params = load_params(&args)?;

    let frame_time = args.frame_ms.map(frame_duration).transpose()?;
    let mut flock = Flock::from_params(params)?;
    let step = flock.clock().step_size();

    let mut pushes = 0;
    for frame in 1..=args.frames {
        let summary = match frame_time {
            Some(delta) => flock.advance_frame(delta),
            None => flock.tick(step),
        };
        pushes += summary.collision_pushes;

        if args.report_every > 0 && frame % args.report_every == 0 {
            let stats = flock.stats();
            info!(
                frame,
                steps = flock.steps(),
                agents = stats.agents,
                mean_speed = stats.mean_speed,
                max_speed = stats.max_speed,
                outside = stats.outside_volume,
                pushes,
                "flock report"
            );
            pushes = 0;
        }
    }

    for (handle, boid) in flock.iter() {
        let p = boid.position;
        let q = boid.heading;
        println!(
            "{handle:?}\t{}\t{:.3} {:.3} {:.3}\t{:.4} {:.4} {:.4} {:.4}",
            boid.kind, p.x, p.y, p.z, q.x, q.y, q.z, q.w
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_population_arguments() {
        let entry = parse_population("piranha=4").unwrap();
        assert_eq!(entry, PopulationEntry { kind: AgentKind::Piranha, count: 4 });
        assert!(parse_population("Piranha").is_err());
        assert!(parse_population("Shark=2").is_err());
        assert!(parse_population("Sunfish=-1").is_err());
    }

    #[test]
    fn frame_durations_must_be_usable() {
        assert!((frame_duration(20.0).unwrap().as_secs_f64() - 0.02).abs() < 1e-9);
        for ms in [0.0, -5.0, f64::NAN, 1.0e30] {
            assert!(frame_duration(ms).is_err(), "{ms}");
        }
    }

    #[test]
    fn cli_flags_override_defaults() {
        let args = Args::parse_from(["aquarium-boids", "--seed", "9", "--parallel", "--fish", "Sunfish=2"]);
        let params = load_params(&args).unwrap();
        assert_eq!(params.seed, Some(9));
        assert_eq!(params.update_mode, UpdateMode::Snapshot);
        assert!(params.parallel);
        assert_eq!(params.initial_population_size(), 2);
    }
}
