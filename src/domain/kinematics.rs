//! Motion models turning a control command and elapsed time into a candidate pose.

use super::{Angle, ControlCommand, Pose, Position};

pub trait KinematicsModel: Send {
    /// Candidate pose after applying `command` for `dt` seconds. Must not depend on anything but
    /// its arguments.
    fn integrate(&self, pose: Pose, command: ControlCommand, dt: f64) -> Pose;
}

/// Unicycle model of a differential-drive robot, integrated with an explicit Euler step: the
/// forward rate moves the robot along its current heading, the turn rate rotates it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DifferentialDrive;

impl KinematicsModel for DifferentialDrive {
    fn integrate(&self, pose: Pose, command: ControlCommand, dt: f64) -> Pose {
        // Stalled ticks and the zero command leave the pose untouched.
        if !dt.is_finite() || dt <= 0.0 || command.is_zero() {
            return pose;
        }

        let displacement = pose.heading.unit_vector() * (command.forward * dt);

        Pose {
            position: pose.position + Position::from(displacement),
            heading: Angle::new(pose.heading.radians() + command.turn * dt).normalized(),
        }
    }
}
