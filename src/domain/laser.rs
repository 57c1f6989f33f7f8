//! Planar laser range finder mounted at the agent's center.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::{
    noise::{self, LASER_STREAM},
    Angle, Pose, Position, Scene,
};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaserConfig {
    /// Number of beams, spread evenly from `min_angle` to `max_angle` inclusive.
    pub count: usize,
    pub min_angle: f64,
    pub max_angle: f64,
    /// Hits at or beyond this distance are reported as missing.
    pub max_distance: f64,
    /// Angular noise as a fraction of the angular resolution.
    pub angle_error: f64,
    /// Absolute range noise.
    pub distance_error: f64,
    pub seed: u64,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            count: 181,
            min_angle: -FRAC_PI_2,
            max_angle: FRAC_PI_2,
            max_distance: 500.0,
            angle_error: 0.05,
            distance_error: 0.05,
            seed: 0,
        }
    }
}

impl LaserConfig {
    pub fn is_valid(&self) -> bool {
        self.count >= 2
            && self.min_angle.is_finite()
            && self.max_angle.is_finite()
            && self.min_angle < self.max_angle
            && self.max_distance.is_finite()
            && self.max_distance > 0.0
            && self.angle_error.is_finite()
            && self.angle_error >= 0.0
            && self.distance_error.is_finite()
            && self.distance_error >= 0.0
    }

    pub fn angular_resolution(&self) -> f64 {
        (self.max_angle - self.min_angle) / self.count as f64
    }

    /// Beam direction relative to the agent's heading.
    pub fn beam_angle(&self, beam: usize) -> Angle {
        let percentage = beam as f64 / (self.count - 1) as f64;
        Angle::new(self.min_angle + (self.max_angle - self.min_angle) * percentage)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LaserScan {
    pub step: u64,
    pub ranges: Vec<Option<f64>>,
}

impl LaserScan {
    /// World coordinates of all beam hits as seen from `pose`.
    pub fn endpoints(&self, pose: Pose, config: &LaserConfig) -> Vec<Position> {
        self.ranges
            .iter()
            .enumerate()
            .filter_map(|(beam, range)| {
                range.map(|r| {
                    let direction = (pose.heading + config.beam_angle(beam)).unit_vector();
                    pose.position + Position::from(direction * r)
                })
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaserScanner {
    config: LaserConfig,
}

impl LaserScanner {
    pub fn new(config: LaserConfig) -> Self {
        Self { config }
    }

    pub fn scan(&self, scene: &Scene, pose: Pose, step: u64) -> LaserScan {
        let mut rng = noise::step_rng(self.config.seed, LASER_STREAM, step);
        let angle_limit = self.config.angle_error * self.config.angular_resolution();

        let ranges = (0..self.config.count)
            .map(|beam| {
                let angle_noise = noise::symmetric(&mut rng, angle_limit);
                let angle = pose.heading + self.config.beam_angle(beam) + Angle::new(angle_noise);
                scene
                    .distance_to_next_obstacle(pose.position, angle)
                    .filter(|d| *d < self.config.max_distance)
                    .map(|d| d + noise::symmetric(&mut rng, self.config.distance_error))
            })
            .collect();

        LaserScan { step, ranges }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    fn exact() -> LaserConfig {
        LaserConfig {
            count: 5,
            angle_error: 0.0,
            distance_error: 0.0,
            ..LaserConfig::default()
        }
    }

    fn walled_scene() -> Scene {
        Scene::load(
            r#"{"bounds": {"min": {"x": -1000, "y": -1000}, "max": {"x": 1000, "y": 1000}},
                "obstacles": [{"type": "rectangle", "center": {"x": 60, "y": 0}, "width": 10, "height": 10}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_beam_angles() {
        let config = exact();
        assert_abs_diff_eq!(config.beam_angle(0).radians(), -FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(config.beam_angle(2).radians(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(config.beam_angle(4).radians(), FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_scan_without_noise() {
        let scan = LaserScanner::new(exact()).scan(&walled_scene(), Pose::default(), 3);

        assert_eq!(scan.step, 3);
        assert_eq!(scan.ranges.len(), 5);
        assert_abs_diff_eq!(scan.ranges[2].unwrap(), 55.0, epsilon = 1e-9);
        // Walls are beyond the maximum distance.
        assert_eq!(scan.ranges[0], None);
        assert_eq!(scan.ranges[4], None);
    }

    #[test]
    fn test_scan_noise_is_bounded_and_repeatable() {
        let config = LaserConfig {
            count: 181,
            ..LaserConfig::default()
        };
        let scanner = LaserScanner::new(config);
        let scan = scanner.scan(&walled_scene(), Pose::default(), 11);

        assert_eq!(scan, scanner.scan(&walled_scene(), Pose::default(), 11));
        assert_abs_diff_eq!(scan.ranges[90].unwrap(), 55.0, epsilon = 0.06);
    }

    #[test]
    fn test_scan_endpoints() {
        let config = exact();
        let pose = Pose::new(0.0, 0.0, 0.0);
        let scan = LaserScanner::new(config).scan(&walled_scene(), pose, 0);
        let endpoints = scan.endpoints(pose, &config);

        assert_eq!(endpoints.len(), 1);
        assert_abs_diff_eq!(endpoints[0].x(), 55.0, epsilon = 1e-9);
        assert_abs_diff_eq!(endpoints[0].y(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_config() {
        assert!(!LaserConfig {
            count: 1,
            ..LaserConfig::default()
        }
        .is_valid());
        assert!(!LaserConfig {
            distance_error: -1.0,
            ..LaserConfig::default()
        }
        .is_valid());
        assert!(LaserConfig::default().is_valid());
    }
}
