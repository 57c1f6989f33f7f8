//! State shared between the step loop and its callers.
//!
//! Every mutable value lives in its own single-value slot guarded by its own mutex, so readers
//! and the step loop only ever contend on one small copy at a time. The lifecycle and the pause
//! flag are plain atomics.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};

use crate::{
    domain::{ControlCommand, Footprint, LaserConfig, LaserScan, OdometryData, Pose, Scene},
    error::SimulatorError,
};

/// Guarded single value. Readers get a copy, writers replace the value as a whole.
#[derive(Debug, Default)]
pub(crate) struct Slot<T>(Mutex<T>);

impl<T: Clone> Slot<T> {
    pub fn new(value: T) -> Self {
        Self(Mutex::new(value))
    }

    pub fn get(&self) -> T {
        self.lock().clone()
    }

    pub fn set(&self, value: T) {
        *self.lock() = value;
    }

    // Values are only ever replaced whole, so a poisoned slot still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Lifecycle {
    Uninitialized = 0,
    Running = 1,
    ShuttingDown = 2,
    Stopped = 3,
}

impl From<u8> for Lifecycle {
    fn from(value: u8) -> Self {
        match value {
            0 => Lifecycle::Uninitialized,
            1 => Lifecycle::Running,
            2 => Lifecycle::ShuttingDown,
            _ => Lifecycle::Stopped,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Boundary {
    pub scene: Arc<Scene>,
    pub footprint: Footprint,
    pub laser_config: Option<LaserConfig>,
    pub command: Slot<ControlCommand>,
    pub odometry: Slot<OdometryData>,
    pub pose: Slot<Pose>,
    pub laser: Slot<Option<Arc<LaserScan>>>,
    lifecycle: AtomicU8,
    paused: AtomicBool,
    /// Wakes the step loop early when a stop is requested.
    stop_signal: (Mutex<()>, Condvar),
}

impl Boundary {
    pub fn new(
        scene: Arc<Scene>,
        footprint: Footprint,
        laser_config: Option<LaserConfig>,
        initial: OdometryData,
    ) -> Self {
        Self {
            pose: Slot::new(scene.start_pose()),
            scene,
            footprint,
            laser_config,
            command: Slot::new(ControlCommand::ZERO),
            odometry: Slot::new(initial),
            laser: Slot::new(None),
            lifecycle: AtomicU8::new(Lifecycle::Uninitialized as u8),
            paused: AtomicBool::new(false),
            stop_signal: (Mutex::new(()), Condvar::new()),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.load(Ordering::Acquire).into()
    }

    pub fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.store(lifecycle as u8, Ordering::Release);
    }

    /// Moves from `from` to `to`; returns false if the lifecycle was elsewhere.
    pub fn transition(&self, from: Lifecycle, to: Lifecycle) -> bool {
        self.lifecycle
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Blocks until `deadline` or until the lifecycle leaves `Running`, whichever comes first.
    pub fn wait_while_running(&self, deadline: Instant) {
        let (lock, condvar) = &self.stop_signal;
        let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        // The lifecycle is re-checked under the lock, so a stop between the check and the wait
        // still wakes us.
        while self.lifecycle() == Lifecycle::Running {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = condvar
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    fn notify_stop(&self) {
        let (lock, condvar) = &self.stop_signal;
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        condvar.notify_all();
    }
}

/// Cheap, cloneable access to a running simulator from any thread.
///
/// None of the operations waits for the step loop: each one copies or replaces a single value
/// under its own short lock.
#[derive(Clone, Debug)]
pub struct SimulatorHandle {
    boundary: Arc<Boundary>,
}

impl SimulatorHandle {
    pub(crate) fn new(boundary: Arc<Boundary>) -> Self {
        Self { boundary }
    }

    /// Replaces the pending command. Only the latest command submitted before a tick is applied,
    /// and it stays in effect until replaced.
    pub fn submit_control(&self, command: ControlCommand) -> Result<(), SimulatorError> {
        if self.boundary.lifecycle() >= Lifecycle::ShuttingDown {
            return Err(SimulatorError::Stopped);
        }
        if !command.is_finite() {
            log::warn!(
                "rejected command ({}, {}), keeping the previous one",
                command.forward,
                command.turn
            );
            return Err(SimulatorError::InvalidCommand {
                forward: command.forward,
                turn: command.turn,
            });
        }
        self.boundary.command.set(command);
        Ok(())
    }

    /// Latest published odometry, or the snapshot of the start pose before the first step.
    pub fn read_odometry(&self) -> Result<OdometryData, SimulatorError> {
        self.ensure_not_stopped()?;
        Ok(self.boundary.odometry.get())
    }

    /// Scene and true pose for drawing.
    pub fn read_scene_and_pose(&self) -> Result<(Arc<Scene>, Pose), SimulatorError> {
        self.ensure_not_stopped()?;
        Ok((Arc::clone(&self.boundary.scene), self.boundary.pose.get()))
    }

    /// Latest laser scan, if the laser is configured and a step has completed.
    pub fn read_laser_scan(&self) -> Result<Option<Arc<LaserScan>>, SimulatorError> {
        self.ensure_not_stopped()?;
        Ok(self.boundary.laser.get())
    }

    /// Simulated seconds up to the latest published step.
    pub fn time_elapsed(&self) -> Result<f64, SimulatorError> {
        self.read_odometry().map(|odometry| odometry.sim_time)
    }

    pub fn footprint(&self) -> Footprint {
        self.boundary.footprint
    }

    pub fn laser_config(&self) -> Option<LaserConfig> {
        self.boundary.laser_config
    }

    pub fn set_paused(&self, paused: bool) {
        self.boundary.paused.store(paused, Ordering::Relaxed);
    }

    /// Returns the new state.
    pub fn toggle_paused(&self) -> bool {
        !self.boundary.paused.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn is_paused(&self) -> bool {
        self.boundary.is_paused()
    }

    /// Requests a cooperative shutdown. The step loop finishes its current tick and stops at the
    /// next tick boundary.
    pub fn stop(&self) {
        if self
            .boundary
            .transition(Lifecycle::Running, Lifecycle::ShuttingDown)
        {
            log::info!("simulator shutting down");
            self.boundary.notify_stop();
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.boundary.lifecycle()
    }

    pub(crate) fn wait_while_running(&self, deadline: Instant) {
        self.boundary.wait_while_running(deadline);
    }

    fn ensure_not_stopped(&self) -> Result<(), SimulatorError> {
        match self.boundary.lifecycle() {
            Lifecycle::Stopped => Err(SimulatorError::Stopped),
            _ => Ok(()),
        }
    }
}
