//! The step engine: integrate, resolve collisions, commit, publish.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    config::SimulatorConfig,
    domain::{
        CollisionResolver, ControlCommand, DifferentialDrive, KinematicsModel, LaserScan,
        LaserScanner, OdometryData, OdometryEstimator, Pose, Resolution, Scene, SceneDescription,
        Velocity,
    },
    error::{SceneError, SimulatorError, StepFault},
};

use super::{
    boundary::{Boundary, Lifecycle},
    observer::{LogObserver, StepObserver},
    SimulatorHandle,
};

/// True state of the agent. Only the step engine ever mutates it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AgentState {
    pub pose: Pose,
    pub velocity: Velocity,
}

/// What a committed step did.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub command: ControlCommand,
    pub resolution: Resolution,
    pub odometry: OdometryData,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    Stepped(StepReport),
    /// The simulator is paused; nothing advanced.
    Paused,
    /// The tick was discarded; nothing advanced.
    Faulted(StepFault),
}

/// Everything a tick computes before anything is committed.
struct Proposal {
    state: AgentState,
    resolution: Resolution,
    odometry: OdometryData,
    scan: Option<LaserScan>,
}

/// Owns the agent state and advances it one tick at a time.
///
/// The core does not schedule itself: [`Simulator`](super::Simulator) drives it from a dedicated
/// thread, tests drive it directly with [`SimulationCore::tick`].
pub struct SimulationCore {
    boundary: Arc<Boundary>,
    state: AgentState,
    step: u64,
    sim_time: f64,
    kinematics: Box<dyn KinematicsModel>,
    resolver: CollisionResolver,
    estimator: Box<dyn OdometryEstimator>,
    laser: Option<LaserScanner>,
    observer: Box<dyn StepObserver>,
}

impl SimulationCore {
    /// Loads the scene description and builds a running core with its handle.
    pub fn new(
        description: &str,
        config: &SimulatorConfig,
    ) -> Result<(Self, SimulatorHandle), SimulatorError> {
        config.validate()?;
        let scene = Scene::load(description)?;
        Self::with_scene(scene, config)
    }

    pub fn from_description(
        description: SceneDescription,
        config: &SimulatorConfig,
    ) -> Result<(Self, SimulatorHandle), SimulatorError> {
        config.validate()?;
        let scene = Scene::from_description(description)?;
        Self::with_scene(scene, config)
    }

    fn with_scene(
        scene: Scene,
        config: &SimulatorConfig,
    ) -> Result<(Self, SimulatorHandle), SimulatorError> {
        let start = scene.start_pose();
        if !config.ghost_mode && scene.intersects(&config.footprint, start) {
            return Err(SceneError::StartCollides(start).into());
        }

        let estimator = config.odometry.estimator();
        let initial = estimator.estimate(start, 0, 0.0);
        let boundary = Arc::new(Boundary::new(
            Arc::new(scene),
            config.footprint,
            config.laser,
            initial,
        ));
        let resolver = if config.ghost_mode {
            CollisionResolver::ghost(config.footprint)
        } else {
            CollisionResolver::new(config.footprint)
        };

        let core = Self {
            boundary: Arc::clone(&boundary),
            state: AgentState {
                pose: start,
                velocity: Velocity::ZERO,
            },
            step: 0,
            sim_time: 0.0,
            kinematics: Box::new(DifferentialDrive),
            resolver,
            estimator,
            laser: config.laser.map(LaserScanner::new),
            observer: Box::new(LogObserver),
        };
        boundary.set_lifecycle(Lifecycle::Running);
        log::info!(
            "simulator running with {} obstacles, start {}",
            boundary.scene.obstacles().len(),
            start
        );

        Ok((core, SimulatorHandle::new(boundary)))
    }

    pub fn with_kinematics(mut self, kinematics: impl KinematicsModel + 'static) -> Self {
        self.kinematics = Box::new(kinematics);
        self
    }

    pub fn with_observer(mut self, observer: impl StepObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn handle(&self) -> SimulatorHandle {
        SimulatorHandle::new(Arc::clone(&self.boundary))
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Index of the last committed step.
    pub fn step_index(&self) -> u64 {
        self.step
    }

    /// Runs one tick of `dt` simulated seconds.
    ///
    /// Returns `Stopped` once a stop was requested; the lifecycle is then `Stopped`. A tick that
    /// faults leaves every piece of state untouched.
    pub fn tick(&mut self, dt: f64) -> Result<TickOutcome, SimulatorError> {
        match self.boundary.lifecycle() {
            Lifecycle::Running => {}
            Lifecycle::Stopped => return Err(SimulatorError::Stopped),
            Lifecycle::Uninitialized | Lifecycle::ShuttingDown => {
                self.boundary.set_lifecycle(Lifecycle::Stopped);
                log::info!("simulator stopped after {} steps", self.step);
                return Err(SimulatorError::Stopped);
            }
        }
        if self.boundary.is_paused() {
            return Ok(TickOutcome::Paused);
        }

        let command = self.boundary.command.get();
        let step = self.step + 1;
        match self.propose(command, dt, step) {
            Ok(proposal) => {
                let report = self.commit(command, step, proposal);
                self.observer.on_step(&report);
                Ok(TickOutcome::Stepped(report))
            }
            Err(fault) => {
                log::warn!("step {step} discarded: {fault}");
                self.observer.on_fault(step, &fault);
                Ok(TickOutcome::Faulted(fault))
            }
        }
    }

    fn propose(&self, command: ControlCommand, dt: f64, step: u64) -> Result<Proposal, StepFault> {
        let elapsed = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let sim_time = self.sim_time + elapsed;
        let previous = self.state.pose;
        let scene = &self.boundary.scene;

        let proposal = panic::catch_unwind(AssertUnwindSafe(|| {
            let candidate = self.kinematics.integrate(previous, command, dt);
            if !candidate.is_finite() {
                return Err(StepFault::NonFinitePose(candidate));
            }

            let resolution = self.resolver.resolve(scene, previous, candidate);
            let pose = resolution.pose();
            let velocity = match resolution {
                Resolution::Accepted(_) => command.into(),
                Resolution::Rejected(_) => Velocity::ZERO,
            };

            let odometry = self.estimator.estimate(pose, step, sim_time);
            if !odometry.is_finite() {
                return Err(StepFault::NonFiniteOdometry);
            }
            let scan = self.laser.map(|laser| laser.scan(scene, pose, step));

            Ok(Proposal {
                state: AgentState { pose, velocity },
                resolution,
                odometry,
                scan,
            })
        }));

        proposal.unwrap_or_else(|payload| Err(StepFault::Panicked(panic_message(payload))))
    }

    fn commit(&mut self, command: ControlCommand, step: u64, proposal: Proposal) -> StepReport {
        self.state = proposal.state;
        self.step = step;
        self.sim_time = proposal.odometry.sim_time;

        self.boundary.pose.set(proposal.state.pose);
        self.boundary.odometry.set(proposal.odometry);
        if let Some(scan) = proposal.scan {
            self.boundary.laser.set(Some(Arc::new(scan)));
        }

        StepReport {
            step,
            command,
            resolution: proposal.resolution,
            odometry: proposal.odometry,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
