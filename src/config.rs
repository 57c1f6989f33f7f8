//! Simulator configuration, loaded from TOML.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    controller::ControlRates,
    domain::{Footprint, LaserConfig, OdometryModel},
    error::ConfigError,
};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    pub schedule: Schedule,
    pub footprint: Footprint,
    pub odometry: OdometryModel,
    /// The laser is only simulated if configured.
    pub laser: Option<LaserConfig>,
    /// Skip collision checks entirely.
    pub ghost_mode: bool,
    pub controls: ControlRates,
}

impl SimulatorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schedule.period().is_zero() {
            return Err(ConfigError::Invalid("schedule period must be positive"));
        }
        if !self.footprint.is_valid() {
            return Err(ConfigError::Invalid("footprint dimensions must be positive"));
        }
        if !self.odometry.is_valid() {
            return Err(ConfigError::Invalid("odometry noise must be finite and non-negative"));
        }
        if self.laser.is_some_and(|laser| !laser.is_valid()) {
            return Err(ConfigError::Invalid(
                "laser needs two beams, an angle range and non-negative errors",
            ));
        }
        if !self.controls.is_valid() {
            return Err(ConfigError::Invalid("control rates must be finite"));
        }
        Ok(())
    }
}

/// How the step loop advances simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Schedule {
    /// Every tick integrates exactly one period, regardless of how late it runs.
    Fixed { period_ms: u64 },
    /// Every tick integrates the wall-clock time elapsed since the previous one.
    RealTime { period_ms: u64 },
}

impl Schedule {
    pub fn period(&self) -> Duration {
        match *self {
            Schedule::Fixed { period_ms } | Schedule::RealTime { period_ms } => {
                Duration::from_millis(period_ms)
            }
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::Fixed { period_ms: 10 }
    }
}
