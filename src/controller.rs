//! Controller steering the robot.
//!
//! Front-ends report discrete input events (a key press, a button, a scripted step). They are
//! turned into control commands with fixed rates and submitted to the simulator, where the latest
//! command wins.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{domain::ControlCommand, error::SimulatorError, simulator::SimulatorHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlInput {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
    Stop,
}

impl FromStr for ControlInput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forward" | "up" => Ok(ControlInput::Forward),
            "backward" | "down" => Ok(ControlInput::Backward),
            "left" => Ok(ControlInput::TurnLeft),
            "right" => Ok(ControlInput::TurnRight),
            "stop" => Ok(ControlInput::Stop),
            other => Err(format!("unknown control input '{other}'")),
        }
    }
}

impl fmt::Display for ControlInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlInput::Forward => "forward",
            ControlInput::Backward => "backward",
            ControlInput::TurnLeft => "left",
            ControlInput::TurnRight => "right",
            ControlInput::Stop => "stop",
        })
    }
}

/// Rates used for the discrete inputs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControlRates {
    pub forward: f64,
    pub turn: f64,
}

impl ControlRates {
    pub const fn new(forward: f64, turn: f64) -> Self {
        Self { forward, turn }
    }

    pub fn is_valid(&self) -> bool {
        self.forward.is_finite() && self.turn.is_finite()
    }

    /// Left turns use a negative rate, matching the screen convention where y grows downwards.
    pub fn command(&self, input: ControlInput) -> ControlCommand {
        match input {
            ControlInput::Forward => ControlCommand::new(self.forward, 0.0),
            ControlInput::Backward => ControlCommand::new(-self.forward, 0.0),
            ControlInput::TurnLeft => ControlCommand::new(0.0, -self.turn),
            ControlInput::TurnRight => ControlCommand::new(0.0, self.turn),
            ControlInput::Stop => ControlCommand::ZERO,
        }
    }

    pub fn apply(
        &self,
        simulator: &SimulatorHandle,
        input: ControlInput,
    ) -> Result<ControlCommand, SimulatorError> {
        let command = self.command(input);
        simulator.submit_control(command)?;
        Ok(command)
    }
}

impl Default for ControlRates {
    fn default() -> Self {
        Self::new(10.0, 0.5)
    }
}
