//! Errors surfaced to callers of the simulator.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::domain::Pose;

/// The scene description could not be read or describes invalid geometry.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene description {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid scene description: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid obstacle {index}: {reason}")]
    InvalidObstacle { index: usize, reason: &'static str },
    #[error("scene bounds must be finite and non-empty")]
    InvalidBounds,
    #[error("start pose {0} is not finite")]
    InvalidStart(Pose),
    #[error("start pose {0} lies outside the scene bounds")]
    StartOutOfBounds(Pose),
    #[error("agent footprint at start pose {0} collides with the scene")]
    StartCollides(Pose),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("malformed scene")]
    MalformedScene(#[from] SceneError),
    #[error("command ({forward}, {turn}) is not finite")]
    InvalidCommand { forward: f64, turn: f64 },
    #[error("simulator is stopped")]
    Stopped,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn the step loop")]
    Spawn(#[source] io::Error),
}

/// A tick that could not complete. The step is discarded and no state changes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StepFault {
    #[error("kinematics produced a non-finite pose {0}")]
    NonFinitePose(Pose),
    #[error("odometry estimate is not finite")]
    NonFiniteOdometry,
    #[error("step panicked: {0}")]
    Panicked(String),
}
