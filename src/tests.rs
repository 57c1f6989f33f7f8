//! Test utils.

use crate::domain::{ObstacleDescription, Position, Scene, SceneDescription, Shape};

macro_rules! assert_pose_eq {
    ($left:expr, $right:expr) => {
        approx::assert_abs_diff_eq!($left, $right, epsilon = 1e-9)
    };
}

pub fn rectangle(x: f64, y: f64, x_length: f64, y_length: f64) -> Shape {
    Shape::Rectangle {
        position: Position::new(x, y),
        x_length,
        y_length,
    }
}

/// Unbounded scene starting at the origin.
pub fn scene_with(shapes: Vec<Shape>) -> Scene {
    Scene::from_description(SceneDescription {
        obstacles: shapes.iter().map(ObstacleDescription::from).collect(),
        ..SceneDescription::default()
    })
    .unwrap()
}

/// A single 10x10 block whose near face is at x = 55, right of the origin.
pub fn scenario_scene() -> Scene {
    scene_with(vec![rectangle(60.0, 0.0, 10.0, 10.0)])
}

pub fn scenario_description() -> String {
    serde_json::to_string(&scenario_scene().description()).unwrap()
}
