//! Simulation of the agent in a scene with obstacles.
//!
//! Each tick integrates the latest command, rejects motion that would collide with the scene,
//! commits the new state and publishes odometry (and a laser scan, if enabled). Callers on other
//! threads interact with the running loop only through a [`SimulatorHandle`].

mod boundary;
mod engine;
mod observer;
mod runner;

pub use boundary::{Lifecycle, SimulatorHandle};
pub use engine::{AgentState, SimulationCore, StepReport, TickOutcome};
pub use observer::{LogObserver, NoopObserver, StepObserver};
pub use runner::Simulator;
