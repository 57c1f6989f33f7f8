//! A 2D robot simulator: a differential-drive agent moving through a static scene of obstacles,
//! stepped on its own thread and steered and observed from any other.

#[cfg(test)]
#[macro_use]
mod tests;

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod simulator;

pub use config::SimulatorConfig;
pub use error::{SimulatorError, StepFault};
pub use simulator::{Simulator, SimulatorHandle};
