//! Runs a [`SimulationCore`] on its own thread.

use std::{
    ops::Deref,
    thread::{self, JoinHandle},
    time::Instant,
};

use crate::{
    config::{Schedule, SimulatorConfig},
    error::SimulatorError,
};

use super::{SimulationCore, SimulatorHandle};

/// A simulator whose step loop runs on a dedicated thread.
///
/// Derefs to [`SimulatorHandle`]. Stopping, explicitly or on drop, waits for the loop to finish
/// its current tick.
pub struct Simulator {
    handle: SimulatorHandle,
    worker: Option<JoinHandle<()>>,
}

impl Simulator {
    pub fn spawn(description: &str, config: &SimulatorConfig) -> Result<Self, SimulatorError> {
        let (core, _) = SimulationCore::new(description, config)?;
        Self::start(core, config.schedule)
    }

    /// Runs an already built core.
    pub fn start(core: SimulationCore, schedule: Schedule) -> Result<Self, SimulatorError> {
        let handle = core.handle();
        let worker = thread::Builder::new()
            .name("step-loop".into())
            .spawn(move || run_loop(core, schedule))
            .map_err(SimulatorError::Spawn)?;

        Ok(Self {
            handle,
            worker: Some(worker),
        })
    }

    pub fn handle(&self) -> SimulatorHandle {
        self.handle.clone()
    }

    /// Requests a shutdown and waits for the step loop to exit.
    pub fn stop(&mut self) {
        self.handle.stop();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("step loop panicked");
            }
        }
    }
}

impl Deref for Simulator {
    type Target = SimulatorHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(mut core: SimulationCore, schedule: Schedule) {
    let handle = core.handle();
    let period = schedule.period();
    let mut last = Instant::now();
    let mut next = last + period;

    loop {
        // Returns early on stop; the tick below then ends the loop.
        handle.wait_while_running(next);
        let now = Instant::now();
        // Late ticks do not try to catch up.
        next = (next + period).max(now);

        let dt = match schedule {
            Schedule::Fixed { .. } => period.as_secs_f64(),
            Schedule::RealTime { .. } => now.duration_since(last).as_secs_f64(),
        };
        last = now;

        match core.tick(dt) {
            Ok(_) => {}
            Err(SimulatorError::Stopped) => break,
            Err(error) => {
                log::error!("step loop failed: {error}");
                break;
            }
        }
    }

    log::debug!("step loop exited after {} steps", core.step_index());
}
