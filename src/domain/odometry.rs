//! Odometry published to external readers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    noise::{self, ODOMETRY_STREAM},
    Angle, Pose, Position,
};

/// Pose estimate of one completed step. Step 0 is the snapshot taken before the first tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct OdometryData {
    pub step: u64,
    /// Simulated seconds integrated up to this step.
    pub sim_time: f64,
    pub pose: Pose,
}

impl OdometryData {
    pub fn is_finite(&self) -> bool {
        self.sim_time.is_finite() && self.pose.is_finite()
    }
}

impl fmt::Display for OdometryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} @ {:.3}s: {}", self.step, self.sim_time, self.pose)
    }
}

pub trait OdometryEstimator: Send {
    fn estimate(&self, true_pose: Pose, step: u64, sim_time: f64) -> OdometryData;
}

/// Echoes the true pose.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PerfectOdometry;

impl OdometryEstimator for PerfectOdometry {
    fn estimate(&self, true_pose: Pose, step: u64, sim_time: f64) -> OdometryData {
        OdometryData {
            step,
            sim_time,
            pose: true_pose,
        }
    }
}

/// Adds bounded uniform noise to the true pose. The noise of a step only depends on the seed and
/// the step index, so it never accumulates and is identical between runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoisyOdometry {
    seed: u64,
    position_noise: f64,
    heading_noise: f64,
}

impl NoisyOdometry {
    pub fn new(seed: u64, position_noise: f64, heading_noise: f64) -> Self {
        Self {
            seed,
            position_noise,
            heading_noise,
        }
    }
}

impl OdometryEstimator for NoisyOdometry {
    fn estimate(&self, true_pose: Pose, step: u64, sim_time: f64) -> OdometryData {
        let mut rng = noise::step_rng(self.seed, ODOMETRY_STREAM, step);
        let offset = Position::new(
            noise::symmetric(&mut rng, self.position_noise),
            noise::symmetric(&mut rng, self.position_noise),
        );
        let heading = noise::symmetric(&mut rng, self.heading_noise);

        OdometryData {
            step,
            sim_time,
            pose: Pose {
                position: true_pose.position + offset,
                heading: (true_pose.heading + Angle::new(heading)).normalized(),
            },
        }
    }
}

/// Configurable choice of estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum OdometryModel {
    #[default]
    Perfect,
    Uniform {
        seed: u64,
        #[serde(default)]
        position: f64,
        #[serde(default)]
        heading: f64,
    },
}

impl OdometryModel {
    pub fn is_valid(&self) -> bool {
        match *self {
            OdometryModel::Perfect => true,
            OdometryModel::Uniform {
                position, heading, ..
            } => position.is_finite() && heading.is_finite() && position >= 0.0 && heading >= 0.0,
        }
    }

    pub fn estimator(&self) -> Box<dyn OdometryEstimator> {
        match *self {
            OdometryModel::Perfect => Box::new(PerfectOdometry),
            OdometryModel::Uniform {
                seed,
                position,
                heading,
            } => Box::new(NoisyOdometry::new(seed, position, heading)),
        }
    }
}
