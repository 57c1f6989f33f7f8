//! Collision detection based on basic shapes.

use std::borrow::Cow;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{Pose, Position, Scene};

pub trait HasCollision {
    fn has_collision(&self, other: &dyn HasCollision) -> bool {
        self.shape().has_intersection(&other.shape())
    }

    fn shape(&self) -> Cow<'_, Shape>;
}

/// Shape in world coordinates. Polygons are convex and wound counter-clockwise.
#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum Shape {
    Rectangle {
        position: Position,
        x_length: f64,
        y_length: f64,
    },
    Circle {
        position: Position,
        radius: f64,
    },
    Polygon {
        vertices: Vec<Position>,
    },
}

impl Shape {
    /// Returns true if the interiors overlap. Touching shapes do not intersect.
    pub fn has_intersection(&self, other: &Shape) -> bool {
        if !self.bounding_box().overlaps(&other.bounding_box()) {
            return false;
        }
        match (self, other) {
            (
                Shape::Circle { position, radius },
                Shape::Circle {
                    position: other_position,
                    radius: other_radius,
                },
            ) => position.distance(*other_position) < radius + other_radius,
            (Shape::Circle { position, radius }, Shape::Rectangle { .. })
            | (Shape::Rectangle { .. }, Shape::Circle { position, radius }) => {
                let Aabb { min, max } = if let Shape::Rectangle { .. } = self {
                    self.bounding_box()
                } else {
                    other.bounding_box()
                };
                let closest = Position::new(
                    position.x().clamp(min.x(), max.x()),
                    position.y().clamp(min.y(), max.y()),
                );
                position.distance(closest) < *radius
            }
            (Shape::Circle { position, radius }, Shape::Polygon { vertices })
            | (Shape::Polygon { vertices }, Shape::Circle { position, radius }) => {
                polygon_contains(vertices, *position)
                    || edges(vertices).any(|(a, b)| distance_to_segment(*position, a, b) < *radius)
            }
            (Shape::Rectangle { .. }, Shape::Rectangle { .. }) => {
                // Bounding boxes are the rectangles themselves.
                true
            }
            _ => {
                let (Some(vertices), Some(other_vertices)) =
                    (self.polygon_vertices(), other.polygon_vertices())
                else {
                    return false;
                };
                !has_separating_axis(&vertices, &other_vertices)
                    && !has_separating_axis(&other_vertices, &vertices)
            }
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, point: Position) -> bool {
        match self {
            Shape::Circle { position, radius } => position.distance(point) <= *radius,
            Shape::Rectangle { .. } => self.bounding_box().contains_point(point),
            Shape::Polygon { vertices } => polygon_contains(vertices, point),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        match self {
            Shape::Rectangle {
                position,
                x_length,
                y_length,
            } => Aabb::new(
                Position::new(position.x() - x_length / 2.0, position.y() - y_length / 2.0),
                Position::new(position.x() + x_length / 2.0, position.y() + y_length / 2.0),
            ),
            Shape::Circle { position, radius } => Aabb::new(
                Position::new(position.x() - radius, position.y() - radius),
                Position::new(position.x() + radius, position.y() + radius),
            ),
            Shape::Polygon { vertices } => vertices
                .iter()
                .map(|v| Aabb::new(*v, *v))
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default(),
        }
    }

    /// Corners of rectangles and polygons, counter-clockwise. Circles have none.
    pub fn polygon_vertices(&self) -> Option<Cow<'_, [Position]>> {
        match self {
            Shape::Rectangle { .. } => {
                let Aabb { min, max } = self.bounding_box();
                Some(Cow::Owned(vec![
                    min,
                    Position::new(max.x(), min.y()),
                    max,
                    Position::new(min.x(), max.y()),
                ]))
            }
            Shape::Circle { .. } => None,
            Shape::Polygon { vertices } => Some(Cow::Borrowed(vertices)),
        }
    }
}

impl HasCollision for Shape {
    fn shape(&self) -> Cow<'_, Shape> {
        Cow::Borrowed(self)
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Position,
    pub max: Position,
}

impl Aabb {
    pub const fn new(min: Position, max: Position) -> Self {
        Self { min, max }
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x() < other.max.x()
            && other.min.x() < self.max.x()
            && self.min.y() < other.max.y()
            && other.min.y() < self.max.y()
    }

    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.x() >= self.min.x()
            && other.max.x() <= self.max.x()
            && other.min.y() >= self.min.y()
            && other.max.y() <= self.max.y()
    }

    pub fn contains_point(&self, point: Position) -> bool {
        self.contains(&Aabb::new(point, point))
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(
            Position::new(self.min.x().min(other.min.x()), self.min.y().min(other.min.y())),
            Position::new(self.max.x().max(other.max.x()), self.max.y().max(other.max.y())),
        )
    }

    pub fn width(&self) -> f64 {
        self.max.x() - self.min.x()
    }

    pub fn height(&self) -> f64 {
        self.max.y() - self.min.y()
    }
}

/// Outline of the agent in its own frame. The front faces the positive x-axis.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Footprint {
    Circle { radius: f64 },
    Rectangle { length: f64, width: f64 },
}

impl Footprint {
    pub fn at(&self, pose: Pose) -> Shape {
        match *self {
            Footprint::Circle { radius } => Shape::Circle {
                position: pose.position,
                radius,
            },
            Footprint::Rectangle { length, width } => {
                let (hl, hw) = (length / 2.0, width / 2.0);
                Shape::Polygon {
                    vertices: [(-hl, -hw), (hl, -hw), (hl, hw), (-hl, hw)]
                        .into_iter()
                        .map(|(x, y)| pose.transform(Position::new(x, y)))
                        .collect(),
                }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        match *self {
            Footprint::Circle { radius } => radius.is_finite() && radius > 0.0,
            Footprint::Rectangle { length, width } => {
                length.is_finite() && width.is_finite() && length > 0.0 && width > 0.0
            }
        }
    }
}

impl Default for Footprint {
    fn default() -> Self {
        Footprint::Circle { radius: 2.5 }
    }
}

/// Outcome of checking a candidate pose against the scene.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum Resolution {
    Accepted(Pose),
    Rejected(Pose),
}

impl Resolution {
    pub fn pose(&self) -> Pose {
        match *self {
            Resolution::Accepted(pose) | Resolution::Rejected(pose) => pose,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Resolution::Accepted(_))
    }
}

/// Rejects whole motions whose footprint would overlap the scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResolver {
    footprint: Footprint,
    ghost: bool,
}

impl CollisionResolver {
    pub fn new(footprint: Footprint) -> Self {
        Self {
            footprint,
            ghost: false,
        }
    }

    /// Accepts every candidate.
    pub fn ghost(footprint: Footprint) -> Self {
        Self {
            footprint,
            ghost: true,
        }
    }

    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    pub fn resolve(&self, scene: &Scene, previous: Pose, candidate: Pose) -> Resolution {
        if candidate == previous {
            return Resolution::Accepted(previous);
        }
        if self.ghost || !scene.intersects(&self.footprint, candidate) {
            Resolution::Accepted(candidate)
        } else {
            Resolution::Rejected(previous)
        }
    }
}

pub(crate) fn edges(
    vertices: &[Position],
) -> impl Iterator<Item = (Position, Position)> + Clone + '_ {
    vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(a, b)| (*a, *b))
}

fn has_separating_axis(vertices: &[Position], other: &[Position]) -> bool {
    edges(vertices)
        .map(|(a, b)| {
            let edge = Vector2::from(b - a);
            Vector2::new(-edge.y, edge.x)
        })
        // Zero-length edges have no normal.
        .filter(|axis| axis.norm_squared() > 0.0)
        .any(|axis| {
            let (min, max) = project(vertices, &axis);
            let (other_min, other_max) = project(other, &axis);
            max <= other_min || other_max <= min
        })
}

fn project(vertices: &[Position], axis: &Vector2<f64>) -> (f64, f64) {
    vertices
        .iter()
        .map(|v| axis.dot(&Vector2::from(*v)))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
            (min.min(p), max.max(p))
        })
}

fn polygon_contains(vertices: &[Position], point: Position) -> bool {
    edges(vertices).all(|(a, b)| {
        Vector2::from(b - a).perp(&Vector2::from(point - a)) >= 0.0
    })
}

fn distance_to_segment(point: Position, a: Position, b: Position) -> f64 {
    let ab = Vector2::from(b - a);
    let ap = Vector2::from(point - a);
    let length_squared = ab.norm_squared();
    if length_squared == 0.0 {
        return ap.norm();
    }
    let t = (ap.dot(&ab) / length_squared).clamp(0.0, 1.0);
    (ap - ab * t).norm()
}
