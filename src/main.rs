//! robot-simulator CLI
//!
//! Spawns the simulator, replays a drive script through the controller and prints the final
//! scene as ASCII.

use std::{fs, path::PathBuf, str::FromStr, thread, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use robot_simulator::{controller::ControlInput, Simulator, SimulatorConfig};

mod visualizer;

use visualizer::Visualizer;

const DEFAULT_SCENE: &str = include_str!("../data/simple_rectangle.json");

#[derive(Parser)]
#[command(name = "robot-simulator")]
#[command(about = "2D differential-drive robot simulator", long_about = None)]
struct Cli {
    /// Scene description (JSON). Defaults to the bundled scene.
    #[arg(long)]
    scene: Option<PathBuf>,
    /// Simulator configuration (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Drive step as EVENT=SECONDS, e.g. forward=2.5. Repeatable; replayed in order.
    #[arg(long = "drive", value_name = "EVENT=SECONDS")]
    drive: Vec<DriveStep>,
    /// Cells per simulation unit in the final render
    #[arg(long, default_value_t = 0.2)]
    render_scale: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct DriveStep {
    input: ControlInput,
    duration: Duration,
}

impl FromStr for DriveStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (input, seconds) = s
            .split_once('=')
            .ok_or_else(|| format!("expected EVENT=SECONDS, got '{s}'"))?;
        let seconds: f64 = seconds
            .trim()
            .parse()
            .map_err(|_| format!("invalid duration '{seconds}'"))?;
        let duration = Duration::try_from_secs_f64(seconds)
            .map_err(|_| format!("duration must be finite and non-negative, got {seconds}"))?;

        Ok(Self {
            input: input.trim().parse()?,
            duration,
        })
    }
}

fn default_drive() -> Vec<DriveStep> {
    [
        (ControlInput::Forward, 2.0),
        (ControlInput::TurnRight, 1.5),
        (ControlInput::Forward, 2.0),
        (ControlInput::Stop, 0.2),
    ]
    .into_iter()
    .map(|(input, seconds)| DriveStep {
        input,
        duration: Duration::from_secs_f64(seconds),
    })
    .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulatorConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => SimulatorConfig::default(),
    };
    let description = match &cli.scene {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?,
        None => DEFAULT_SCENE.to_owned(),
    };
    let drive = if cli.drive.is_empty() {
        default_drive()
    } else {
        cli.drive
    };

    let mut simulator =
        Simulator::spawn(&description, &config).context("failed to start the simulator")?;

    for step in &drive {
        let command = config.controls.apply(&simulator, step.input)?;
        log::info!(
            "{} ({}, {}) for {:.1}s",
            step.input,
            command.forward,
            command.turn,
            step.duration.as_secs_f64()
        );
        thread::sleep(step.duration);
        log::info!("odometry {}", simulator.read_odometry()?);
    }

    let (scene, pose) = simulator.read_scene_and_pose()?;
    let laser_hits = match (simulator.read_laser_scan()?, simulator.laser_config()) {
        (Some(scan), Some(laser)) => scan.endpoints(pose, &laser),
        _ => Vec::new(),
    };
    let elapsed = simulator.time_elapsed()?;
    simulator.stop();

    println!(
        "{}",
        Visualizer::new(cli.render_scale).render(&scene, pose, simulator.footprint(), &laser_hits)
    );
    println!("pose {pose} after {elapsed:.2}s simulated");

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("forward=2", ControlInput::Forward, 2.0)]
    #[case("left=0.5", ControlInput::TurnLeft, 0.5)]
    #[case(" stop = 0 ", ControlInput::Stop, 0.0)]
    fn test_parse_drive_step(
        #[case] text: &str,
        #[case] input: ControlInput,
        #[case] seconds: f64,
    ) {
        assert_eq!(
            text.parse::<DriveStep>(),
            Ok(DriveStep {
                input,
                duration: Duration::from_secs_f64(seconds)
            })
        );
    }

    #[rstest]
    #[case("forward")]
    #[case("forward=soon")]
    #[case("forward=-1")]
    #[case("fly=1")]
    fn test_parse_drive_step_invalid(#[case] text: &str) {
        assert!(text.parse::<DriveStep>().is_err());
    }

    #[test]
    fn test_bundled_scene_runs() {
        let mut simulator = Simulator::spawn(DEFAULT_SCENE, &SimulatorConfig::default()).unwrap();
        assert_eq!(simulator.read_odometry().unwrap().step, 0);
        simulator.stop();
    }

    #[test]
    fn test_cli_parses_repeated_drive() {
        let cli = Cli::parse_from([
            "robot-simulator",
            "--drive",
            "forward=1",
            "--drive",
            "right=0.5",
            "--render-scale",
            "0.5",
        ]);
        assert_eq!(cli.drive.len(), 2);
        assert_eq!(cli.drive[1].input, ControlInput::TurnRight);
        assert_eq!(cli.render_scale, 0.5);
    }
}
