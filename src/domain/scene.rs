//! Static scene with obstacles.
//!
//! A scene is loaded once from a JSON description and never changes afterwards, so it is shared
//! between threads behind an `Arc` without any locking.

use std::{borrow::Cow, f64::consts::TAU, fs, path::Path};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{collision::edges, Aabb, Angle, Footprint, HasCollision, Pose, Position, Shape};
use crate::error::SceneError;

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    obstacles: Vec<Obstacle>,
    bounds: Option<Aabb>,
    start: Pose,
}

impl Scene {
    /// Parses and validates a JSON scene description.
    pub fn load(description: &str) -> Result<Self, SceneError> {
        Self::from_description(serde_json::from_str(description)?)
    }

    pub fn read(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let description = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::load(&description)
    }

    pub fn from_description(description: SceneDescription) -> Result<Self, SceneError> {
        let bounds = match description.bounds {
            Some(bounds) => {
                let valid = bounds.min.is_finite()
                    && bounds.max.is_finite()
                    && bounds.width() > 0.0
                    && bounds.height() > 0.0;
                if !valid {
                    return Err(SceneError::InvalidBounds);
                }
                Some(bounds)
            }
            None => None,
        };

        let start = description.start;
        if !start.is_finite() {
            return Err(SceneError::InvalidStart(start));
        }
        if bounds.is_some_and(|b| !b.contains_point(start.position)) {
            return Err(SceneError::StartOutOfBounds(start));
        }

        let obstacles = description
            .obstacles
            .into_iter()
            .enumerate()
            .map(|(index, o)| {
                Obstacle::try_from(o)
                    .map_err(|reason| SceneError::InvalidObstacle { index, reason })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            obstacles,
            bounds,
            start: Pose {
                heading: start.heading.normalized(),
                ..start
            },
        })
    }

    /// Description that loads back into an identical scene.
    pub fn description(&self) -> SceneDescription {
        SceneDescription {
            bounds: self.bounds,
            start: self.start,
            obstacles: self
                .obstacles
                .iter()
                .map(|o| ObstacleDescription::from(&o.shape))
                .collect(),
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    pub fn start_pose(&self) -> Pose {
        self.start
    }

    /// Area worth drawing: the bounds, or the box around all obstacles and the start position for
    /// unbounded scenes.
    pub fn extent(&self) -> Aabb {
        self.bounds.unwrap_or_else(|| {
            self.obstacles
                .iter()
                .map(|o| o.shape.bounding_box())
                .fold(
                    Aabb::new(self.start.position, self.start.position),
                    |a, b| a.union(&b),
                )
        })
    }

    /// Returns true if the footprint placed at `pose` overlaps an obstacle or leaves the bounds.
    pub fn intersects(&self, footprint: &Footprint, pose: Pose) -> bool {
        let shape = footprint.at(pose);
        !self.contains(&shape) || self.has_collision(&shape)
    }

    pub fn has_collision(&self, object: &dyn HasCollision) -> bool {
        self.obstacles.iter().any(|o| o.has_collision(object))
    }

    pub fn contains(&self, shape: &Shape) -> bool {
        self.bounds
            .map_or(true, |bounds| bounds.contains(&shape.bounding_box()))
    }

    /// Distance along a ray to the closest obstacle or bounds edge.
    pub fn distance_to_next_obstacle(&self, position: Position, angle: Angle) -> Option<f64> {
        let direction = angle.unit_vector();
        let bounds = self.bounds.map(|b| Shape::Rectangle {
            position: Position::new(
                b.min.x() + b.width() / 2.0,
                b.min.y() + b.height() / 2.0,
            ),
            x_length: b.width(),
            y_length: b.height(),
        });

        self.obstacles
            .iter()
            .map(|o| &o.shape)
            .chain(bounds.as_ref())
            .filter_map(|shape| ray_distance(shape, position, direction))
            .min_by(|a, b| a.total_cmp(b))
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct Obstacle {
    shape: Shape,
}

impl Obstacle {
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl HasCollision for Obstacle {
    fn shape(&self) -> Cow<'_, Shape> {
        Cow::Borrowed(&self.shape)
    }
}

impl TryFrom<ObstacleDescription> for Obstacle {
    type Error = &'static str;

    fn try_from(value: ObstacleDescription) -> Result<Self, Self::Error> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let shape = match value {
            ObstacleDescription::Rectangle {
                center,
                width,
                height,
            } => {
                if !center.is_finite() || !positive(width) || !positive(height) {
                    return Err("rectangle needs a finite center and positive size");
                }
                Shape::Rectangle {
                    position: center,
                    x_length: width,
                    y_length: height,
                }
            }
            ObstacleDescription::Circle { center, radius } => {
                if !center.is_finite() || !positive(radius) {
                    return Err("circle needs a finite center and positive radius");
                }
                Shape::Circle {
                    position: center,
                    radius,
                }
            }
            ObstacleDescription::Polygon { mut vertices } => {
                if vertices.len() < 3 {
                    return Err("polygon needs at least three vertices");
                }
                if !vertices.iter().all(Position::is_finite) {
                    return Err("polygon vertices must be finite");
                }
                if edges(&vertices).any(|(a, b)| a == b) {
                    return Err("polygon repeats a vertex");
                }
                let area = signed_area(&vertices);
                if area.abs() <= f64::EPSILON {
                    return Err("polygon is degenerate");
                }
                if area < 0.0 {
                    vertices.reverse();
                }
                if !is_convex(&vertices) {
                    return Err("polygon is not convex");
                }
                Shape::Polygon { vertices }
            }
        };
        Ok(Self { shape })
    }
}

/// Serialized form of a scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Aabb>,
    #[serde(default)]
    pub start: Pose,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDescription>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObstacleDescription {
    Rectangle {
        center: Position,
        width: f64,
        height: f64,
    },
    Circle {
        center: Position,
        radius: f64,
    },
    Polygon {
        vertices: Vec<Position>,
    },
}

impl From<&Shape> for ObstacleDescription {
    fn from(value: &Shape) -> Self {
        match value {
            Shape::Rectangle {
                position,
                x_length,
                y_length,
            } => ObstacleDescription::Rectangle {
                center: *position,
                width: *x_length,
                height: *y_length,
            },
            Shape::Circle { position, radius } => ObstacleDescription::Circle {
                center: *position,
                radius: *radius,
            },
            Shape::Polygon { vertices } => ObstacleDescription::Polygon {
                vertices: vertices.clone(),
            },
        }
    }
}

fn signed_area(vertices: &[Position]) -> f64 {
    edges(vertices)
        .map(|(a, b)| a.x() * b.y() - b.x() * a.y())
        .sum::<f64>()
        / 2.0
}

/// Every turn is a strict left turn and the turns add up to exactly one revolution, so the
/// polygon is convex, simple and free of collinear vertices.
fn is_convex(vertices: &[Position]) -> bool {
    let mut winding = 0.0;
    for ((a, b), (_, c)) in edges(vertices).zip(edges(vertices).cycle().skip(1)) {
        let incoming = Vector2::from(b - a);
        let outgoing = Vector2::from(c - b);
        let turn = incoming.perp(&outgoing);
        if turn <= 0.0 {
            return false;
        }
        winding += turn.atan2(incoming.dot(&outgoing));
    }
    (winding - TAU).abs() < 1e-6
}

fn ray_distance(shape: &Shape, origin: Position, direction: Vector2<f64>) -> Option<f64> {
    match shape {
        Shape::Circle { position, radius } => {
            let oc = Vector2::from(origin - *position);
            let b = oc.dot(&direction);
            let discriminant = b * b - (oc.norm_squared() - radius * radius);
            if discriminant < 0.0 {
                return None;
            }
            let root = discriminant.sqrt();
            [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
        }
        _ => shape.polygon_vertices().and_then(|vertices| {
            edges(&vertices)
                .filter_map(|(a, b)| ray_segment_distance(origin, direction, a, b))
                .min_by(|a, b| a.total_cmp(b))
        }),
    }
}

fn ray_segment_distance(
    origin: Position,
    direction: Vector2<f64>,
    a: Position,
    b: Position,
) -> Option<f64> {
    let segment = Vector2::from(b - a);
    let denominator = direction.perp(&segment);
    if denominator.abs() < f64::EPSILON {
        // Parallel
        return None;
    }
    let to_start = Vector2::from(a - origin);
    let t = to_start.perp(&segment) / denominator;
    let u = to_start.perp(&direction) / denominator;
    (t >= 0.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::tests::{rectangle, scenario_scene, scene_with};

    const SIMPLE_RECTANGLE: &str = include_str!("../../data/simple_rectangle.json");

    #[test]
    fn test_scene_load() {
        let scene = Scene::load(SIMPLE_RECTANGLE).unwrap();
        assert_eq!(scene.obstacles().len(), 4);
        assert_eq!(
            scene.bounds(),
            Some(Aabb::new(
                Position::new(-200.0, -200.0),
                Position::new(200.0, 200.0)
            ))
        );
        assert_eq!(scene.start_pose(), Pose::new(-150.0, -150.0, 0.0));
    }

    #[test]
    fn test_scene_description_round_trip() {
        let scene = Scene::load(SIMPLE_RECTANGLE).unwrap();
        let json = serde_json::to_string(&scene.description()).unwrap();
        assert_eq!(Scene::load(&json).unwrap(), scene);
    }

    #[test]
    fn test_scene_normalizes_clockwise_polygon() {
        let scene = Scene::load(
            r#"{"obstacles": [{"type": "polygon", "vertices": [
                {"x": 0.0, "y": 0.0}, {"x": 0.0, "y": 1.0}, {"x": 1.0, "y": 0.0}]}]}"#,
        )
        .unwrap();
        assert_eq!(
            scene.obstacles()[0].shape(),
            &Shape::Polygon {
                vertices: vec![
                    Position::new(1.0, 0.0),
                    Position::new(0.0, 1.0),
                    Position::new(0.0, 0.0),
                ]
            }
        );
    }

    #[rstest]
    #[case::not_json("obstacles")]
    #[case::unknown_field(r#"{"walls": []}"#)]
    #[case::unknown_shape(r#"{"obstacles": [{"type": "star"}]}"#)]
    fn test_scene_load_parse_error(#[case] description: &str) {
        assert!(matches!(
            Scene::load(description),
            Err(SceneError::Parse(_))
        ));
    }

    #[rstest]
    #[case::negative_width(
        r#"{"obstacles": [{"type": "rectangle", "center": {"x": 0, "y": 0}, "width": -1, "height": 1}]}"#
    )]
    #[case::zero_radius(
        r#"{"obstacles": [{"type": "circle", "center": {"x": 0, "y": 0}, "radius": 0}]}"#
    )]
    #[case::two_vertices(
        r#"{"obstacles": [{"type": "polygon", "vertices": [{"x": 0, "y": 0}, {"x": 1, "y": 0}]}]}"#
    )]
    #[case::collinear(
        r#"{"obstacles": [{"type": "polygon", "vertices": [{"x": 0, "y": 0}, {"x": 1, "y": 0}, {"x": 2, "y": 0}]}]}"#
    )]
    #[case::concave(
        r#"{"obstacles": [{"type": "polygon", "vertices": [
            {"x": 0, "y": 0}, {"x": 4, "y": 0}, {"x": 4, "y": 4}, {"x": 2, "y": 1}, {"x": 0, "y": 4}]}]}"#
    )]
    #[case::repeated_vertex(
        r#"{"obstacles": [{"type": "polygon", "vertices": [
            {"x": 10, "y": -5}, {"x": 10, "y": -5}, {"x": 20, "y": -5}, {"x": 20, "y": 5}, {"x": 10, "y": 5}]}]}"#
    )]
    #[case::collinear_vertex(
        r#"{"obstacles": [{"type": "polygon", "vertices": [
            {"x": 0, "y": 0}, {"x": 2, "y": 0}, {"x": 4, "y": 0}, {"x": 4, "y": 4}, {"x": 0, "y": 4}]}]}"#
    )]
    #[case::self_intersecting(
        r#"{"obstacles": [{"type": "polygon", "vertices": [
            {"x": 0.0, "y": 10.0}, {"x": -5.8779, "y": -8.0902}, {"x": 9.5106, "y": 3.0902},
            {"x": -9.5106, "y": 3.0902}, {"x": 5.8779, "y": -8.0902}]}]}"#
    )]
    fn test_scene_load_invalid_obstacle(#[case] description: &str) {
        assert!(matches!(
            Scene::load(description),
            Err(SceneError::InvalidObstacle { index: 0, .. })
        ));
    }

    #[rstest]
    #[case::inverted_bounds(
        r#"{"bounds": {"min": {"x": 1, "y": 0}, "max": {"x": 0, "y": 1}}}"#
    )]
    #[case::start_outside(
        r#"{"bounds": {"min": {"x": 0, "y": 0}, "max": {"x": 1, "y": 1}},
            "start": {"position": {"x": 5, "y": 5}}}"#
    )]
    fn test_scene_load_invalid_layout(#[case] description: &str) {
        assert!(matches!(
            Scene::load(description),
            Err(SceneError::InvalidBounds | SceneError::StartOutOfBounds(_))
        ));
    }

    #[rstest]
    #[case::centred(Pose::new(15.0, 0.0, 0.0), true)]
    #[case::rotated(Pose::new(15.0, 0.0, 0.7), true)]
    #[case::corner_overlap(Pose::new(8.5, -5.5, 0.0), true)]
    #[case::clear(Pose::new(0.0, 0.0, 0.0), false)]
    #[case::touching_face(Pose::new(8.0, 0.0, 0.0), false)]
    fn test_scene_intersects_polygon_with_rectangle_footprint(
        #[case] pose: Pose,
        #[case] expected: bool,
    ) {
        let scene = Scene::load(
            r#"{"obstacles": [{"type": "polygon", "vertices": [
                {"x": 10, "y": -5}, {"x": 20, "y": -5}, {"x": 20, "y": 5}, {"x": 10, "y": 5}]}]}"#,
        )
        .unwrap();
        let footprint = Footprint::Rectangle {
            length: 4.0,
            width: 2.0,
        };

        assert_eq!(scene.intersects(&footprint, pose), expected);
    }

    #[test]
    fn test_scene_read_bundled_file() {
        let scene = Scene::read("data/simple_rectangle.json").unwrap();
        assert_eq!(scene, Scene::load(SIMPLE_RECTANGLE).unwrap());
    }

    #[test]
    fn test_scene_read_missing_file() {
        assert!(matches!(
            Scene::read("does/not/exist.json"),
            Err(SceneError::Read { .. })
        ));
    }

    #[rstest]
    #[case::free(Pose::new(50.0, 0.0, 0.0), false)]
    #[case::inside_obstacle(Pose::new(60.0, 0.0, 0.0), true)]
    #[case::grazing_obstacle(Pose::new(53.5, 0.0, 0.0), true)]
    #[case::beside_obstacle(Pose::new(60.0, 8.0, 0.0), false)]
    fn test_scene_intersects(#[case] pose: Pose, #[case] expected: bool) {
        let footprint = Footprint::Circle { radius: 2.0 };
        assert_eq!(scenario_scene().intersects(&footprint, pose), expected);
    }

    #[rstest]
    #[case::inside(Pose::new(0.0, 0.0, 0.0), false)]
    #[case::leaving(Pose::new(9.5, 0.0, 0.0), true)]
    #[case::outside(Pose::new(20.0, 0.0, 0.0), true)]
    fn test_scene_intersects_bounds(#[case] pose: Pose, #[case] expected: bool) {
        let scene = Scene::load(
            r#"{"bounds": {"min": {"x": -10, "y": -10}, "max": {"x": 10, "y": 10}}}"#,
        )
        .unwrap();
        let footprint = Footprint::Circle { radius: 1.0 };
        assert_eq!(scene.intersects(&footprint, pose), expected);
    }

    #[test]
    fn test_scene_extent_without_bounds() {
        let scene = scene_with(vec![
            rectangle(5.0, 5.0, 2.0, 2.0),
            rectangle(-5.0, 0.0, 2.0, 4.0),
        ]);
        assert_eq!(
            scene.extent(),
            Aabb::new(Position::new(-6.0, -2.0), Position::new(6.0, 6.0))
        );
    }

    #[rstest]
    #[case::rectangle_ahead(Angle::new(0.0), Some(55.0))]
    #[case::bounds_behind(Angle::new(PI), Some(100.0))]
    #[case::bounds_above(Angle::new(0.5 * PI), Some(100.0))]
    fn test_scene_distance_to_next_obstacle(#[case] angle: Angle, #[case] expected: Option<f64>) {
        let scene = Scene::load(
            r#"{"bounds": {"min": {"x": -100, "y": -100}, "max": {"x": 100, "y": 100}},
                "obstacles": [{"type": "rectangle", "center": {"x": 60, "y": 0}, "width": 10, "height": 10}]}"#,
        )
        .unwrap();
        let distance = scene.distance_to_next_obstacle(Position::new(0.0, 0.0), angle);
        assert_abs_diff_eq!(distance.unwrap(), expected.unwrap(), epsilon = 1e-9);
    }

    #[test]
    fn test_scene_distance_to_circle() {
        let scene = Scene::load(
            r#"{"obstacles": [{"type": "circle", "center": {"x": 10, "y": 0}, "radius": 2}]}"#,
        )
        .unwrap();
        assert_abs_diff_eq!(
            scene
                .distance_to_next_obstacle(Position::new(0.0, 0.0), Angle::new(0.0))
                .unwrap(),
            8.0,
            epsilon = 1e-12
        );
        assert_eq!(
            scene.distance_to_next_obstacle(Position::new(0.0, 0.0), Angle::new(PI)),
            None
        );
    }
}
