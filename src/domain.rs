//! The domain module encapsulates the simulation rules. It defines the `Scene` the agent moves in,
//! the kinematics proposing motion, the collision rules accepting or rejecting it, and the sensors
//! (odometry, laser) reporting on it.
//!
//! Nothing in here knows about threads: every function is a pure computation over immutable
//! inputs, which keeps runs reproducible.

mod basis;
mod collision;
mod kinematics;
mod laser;
mod noise;
mod odometry;
mod scene;

pub use basis::{Angle, ControlCommand, Pose, Position, Velocity};
pub use collision::{Aabb, CollisionResolver, Footprint, HasCollision, Resolution, Shape};
pub use kinematics::{DifferentialDrive, KinematicsModel};
pub use laser::{LaserConfig, LaserScan, LaserScanner};
pub use odometry::{NoisyOdometry, OdometryData, OdometryEstimator, OdometryModel, PerfectOdometry};
pub use scene::{Obstacle, ObstacleDescription, Scene, SceneDescription};
