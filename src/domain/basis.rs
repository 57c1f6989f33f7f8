//! Basic building blocks.

use std::{
    f64::consts::PI,
    fmt,
    ops::{Add, Sub},
};

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    x: f64,
    y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn distance(&self, position: Self) -> f64 {
        ((self.x - position.x).powi(2) + (self.y - position.y).powi(2)).sqrt()
    }

    pub fn rotate_vector(&self, angle: Angle) -> Position {
        (Rotation2::new(angle.0) * Vector2::from(*self)).into()
    }
}

impl From<Position> for Vector2<f64> {
    fn from(value: Position) -> Self {
        Vector2::new(value.x, value.y)
    }
}

impl From<Vector2<f64>> for Position {
    fn from(value: Vector2<f64>) -> Self {
        Position::new(value.x, value.y)
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Angle in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Angle(f64);

impl Angle {
    pub const fn new(radians: f64) -> Self {
        Self(radians)
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Wraps into `[-PI, PI)`. Angles already in range are returned bit-for-bit.
    pub fn normalized(self) -> Self {
        if (-PI..PI).contains(&self.0) {
            self
        } else {
            Self((self.0 + PI).rem_euclid(2.0 * PI) - PI)
        }
    }

    pub fn unit_vector(self) -> Vector2<f64> {
        Vector2::new(self.0.cos(), self.0.sin())
    }
}

impl Add for Angle {
    type Output = Angle;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl From<Angle> for f64 {
    fn from(value: Angle) -> Self {
        value.0
    }
}

/// Position and heading of the agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Pose {
    pub position: Position,
    #[serde(default)]
    pub heading: Angle,
}

impl Pose {
    pub const fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: Position::new(x, y),
            heading: Angle::new(heading),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.heading.0.is_finite()
    }

    /// Maps a point given in the agent frame into the world frame.
    pub fn transform(&self, local: Position) -> Position {
        self.position + local.rotate_vector(self.heading)
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.3}, {:.3}, {:.3})",
            self.position.x, self.position.y, self.heading.0
        )
    }
}

/// Linear and angular rate actually applied to the agent during the last step.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Velocity {
    pub linear: f64,
    pub angular: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity::new(0.0, 0.0);

    pub const fn new(linear: f64, angular: f64) -> Self {
        Self { linear, angular }
    }
}

/// Requested forward and turn rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ControlCommand {
    pub forward: f64,
    pub turn: f64,
}

impl ControlCommand {
    pub const ZERO: ControlCommand = ControlCommand::new(0.0, 0.0);

    pub const fn new(forward: f64, turn: f64) -> Self {
        Self { forward, turn }
    }

    pub fn is_finite(&self) -> bool {
        self.forward.is_finite() && self.turn.is_finite()
    }

    pub fn is_zero(&self) -> bool {
        self.forward == 0.0 && self.turn == 0.0
    }
}

impl From<ControlCommand> for Velocity {
    fn from(value: ControlCommand) -> Self {
        Velocity::new(value.forward, value.turn)
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::{assert_abs_diff_eq, AbsDiffEq};
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_position() {
        let position = Position::new(1.0, 2.0);
        assert_abs_diff_eq!(position.x(), 1.0);
        assert_abs_diff_eq!(position.y(), 2.0);
    }

    #[rstest]
    #[case::in_range(0.5, 0.5)]
    #[case::lower_edge(-PI, -PI)]
    #[case::upper_edge(PI, -PI)]
    #[case::full_turn(2.5 * PI, 0.5 * PI)]
    #[case::negative(-1.5 * PI, 0.5 * PI)]
    fn test_angle_normalized(#[case] radians: f64, #[case] expected: f64) {
        assert_abs_diff_eq!(
            Angle::new(radians).normalized(),
            Angle::new(expected),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_angle_normalized_keeps_bits_in_range() {
        let angle = Angle::new(0.1 + 0.2);
        assert_eq!(angle.normalized().radians().to_bits(), angle.radians().to_bits());
    }

    #[test]
    fn test_pose_transform() {
        let pose = Pose::new(1.0, 1.0, 0.5 * PI);
        assert_abs_diff_eq!(
            pose.transform(Position::new(2.0, 0.0)),
            Position::new(1.0, 3.0),
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case(ControlCommand::new(f64::NAN, 0.0), false)]
    #[case(ControlCommand::new(0.0, f64::INFINITY), false)]
    #[case(ControlCommand::new(-10.0, 0.5), true)]
    #[case(ControlCommand::ZERO, true)]
    fn test_control_command_is_finite(#[case] command: ControlCommand, #[case] expected: bool) {
        assert_eq!(command.is_finite(), expected);
    }

    #[test]
    fn test_pose_display() {
        insta::assert_snapshot!(Pose::new(50.0, 0.0, 0.5).to_string(), @"(50.000, 0.000, 0.500)");
    }

    impl AbsDiffEq for Position {
        type Epsilon = f64;

        fn default_epsilon() -> f64 {
            f64::EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
            f64::abs_diff_eq(&self.x, &other.x, epsilon)
                && f64::abs_diff_eq(&self.y, &other.y, epsilon)
        }
    }

    impl AbsDiffEq for Angle {
        type Epsilon = f64;

        fn default_epsilon() -> f64 {
            f64::EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
            f64::abs_diff_eq(&self.0, &other.0, epsilon)
        }
    }

    impl AbsDiffEq for Pose {
        type Epsilon = f64;

        fn default_epsilon() -> f64 {
            f64::EPSILON
        }

        fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
            Position::abs_diff_eq(&self.position, &other.position, epsilon)
                && Angle::abs_diff_eq(&self.heading, &other.heading, epsilon)
        }
    }
}
