//! Common types used throughout rust_swarm_nav

use nalgebra::Vector2;
use serde::Deserialize;

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "(f64, f64)")]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

/// Planar velocity command in world units per second
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    pub vx: f64,
    pub vy: f64,
}

impl VelocityCommand {
    pub fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    pub fn zero() -> Self {
        Self { vx: 0.0, vy: 0.0 }
    }

    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.vx, self.vy)
    }
}

impl From<Vector2<f64>> for VelocityCommand {
    fn from(v: Vector2<f64>) -> Self {
        Self { vx: v[0], vy: v[1] }
    }
}

/// Rescale `v` onto `max_speed` when it is longer, keeping its direction
///
/// A vector with a non-finite component is treated as zero. The length is
/// taken after dividing by the largest component, so huge finite inputs do
/// not overflow into a zero result.
pub fn clamp_speed(v: Vector2<f64>, max_speed: f64) -> Vector2<f64> {
    if !(v.x.is_finite() && v.y.is_finite()) {
        return Vector2::zeros();
    }
    let scale = v.x.abs().max(v.y.abs());
    if scale == 0.0 {
        return v;
    }
    let dir = v / scale;
    let dir_norm = dir.norm();
    if scale * dir_norm > max_speed {
        dir * (max_speed / dir_norm)
    } else {
        v
    }
}

/// Path represented as a sequence of 2D points
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<Point2D>,
}

impl Path2D {
    pub fn from_points(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.points.get(index).copied()
    }

    pub fn total_length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        self.points.windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }
}

/// Grid cell index for graph-based planners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridNode {
    pub x: i32,
    pub y: i32,
}

impl GridNode {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }

    /// Euclidean distance measured in cells
    pub fn distance(&self, other: &GridNode) -> f64 {
        (self.x as f64 - other.x as f64).hypot(self.y as f64 - other.y as f64)
    }

    /// True when the two cells touch under 8-connectivity
    pub fn is_adjacent(&self, other: &GridNode) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}
