//! Static occupancy grid built from rectangle and circle primitives
//!
//! Cells are addressed by `GridNode { x, y }` with `0 <= x < width` and
//! `0 <= y < height`. A cell's world position is its origin corner,
//! `(x * resolution, y * resolution)`.
//!
//! Obstacle insertion never fails: shapes are clipped to the grid, and
//! non-finite coordinates or a negative radius leave the map untouched.
//! Once a cell is marked it stays occupied.

use itertools::iproduct;
use nalgebra as na;
use serde::Deserialize;

use crate::common::{GridNode, NavError, NavResult, Point2D};

/// Grid dimensions and cell size
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Number of cells along x
    pub width: usize,
    /// Number of cells along y
    pub height: usize,
    /// World units per cell
    pub resolution: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 40,
            resolution: 1.0,
        }
    }
}

/// Axis-aligned rectangle in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RectObstacle {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl RectObstacle {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }
}

/// Disc in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CircleObstacle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl CircleObstacle {
    pub fn new(cx: f64, cy: f64, r: f64) -> Self {
        Self { cx, cy, r }
    }
}

#[derive(Debug, Clone)]
pub struct OccupancyMap {
    width: usize,
    height: usize,
    resolution: f64,
    occupancy: na::DMatrix<bool>,
    rects: Vec<RectObstacle>,
    circles: Vec<CircleObstacle>,
}

impl OccupancyMap {
    pub fn new(config: MapConfig) -> NavResult<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(NavError::InvalidParameter(format!(
                "grid dimensions must be non-zero, got {}x{}",
                config.width, config.height
            )));
        }
        if !(config.resolution.is_finite() && config.resolution > 0.0) {
            return Err(NavError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                config.resolution
            )));
        }
        Ok(Self {
            width: config.width,
            height: config.height,
            resolution: config.resolution,
            occupancy: na::DMatrix::from_element(config.width, config.height, false),
            rects: Vec::new(),
            circles: Vec::new(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Rectangles in insertion order
    pub fn rects(&self) -> &[RectObstacle] {
        &self.rects
    }

    /// Circles in insertion order
    pub fn circles(&self) -> &[CircleObstacle] {
        &self.circles
    }

    /// World extent of the grid as `(x_max, y_max)`
    pub fn world_extent(&self) -> (f64, f64) {
        (
            self.width as f64 * self.resolution,
            self.height as f64 * self.resolution,
        )
    }

    /// Mark every cell covered by the rectangle (inclusive, floor rounded)
    pub fn add_rect(&mut self, x_min: f64, y_min: f64, x_max: f64, y_max: f64) {
        if ![x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) {
            return;
        }
        self.rects.push(RectObstacle::new(x_min, y_min, x_max, y_max));

        let Some((ix_min, ix_max)) = self.clip_span(x_min, x_max, self.width) else {
            return;
        };
        let Some((iy_min, iy_max)) = self.clip_span(y_min, y_max, self.height) else {
            return;
        };
        for (ix, iy) in iproduct!(ix_min..=ix_max, iy_min..=iy_max) {
            self.occupancy[(ix, iy)] = true;
        }
    }

    /// Mark every cell whose origin lies within `r` of the center
    pub fn add_circle(&mut self, cx: f64, cy: f64, r: f64) {
        if ![cx, cy, r].iter().all(|v| v.is_finite()) || r < 0.0 {
            return;
        }
        self.circles.push(CircleObstacle::new(cx, cy, r));

        let Some((ix_min, ix_max)) = self.clip_span(cx - r, cx + r, self.width) else {
            return;
        };
        let Some((iy_min, iy_max)) = self.clip_span(cy - r, cy + r, self.height) else {
            return;
        };
        let r2 = r * r;
        for (ix, iy) in iproduct!(ix_min..=ix_max, iy_min..=iy_max) {
            let x = ix as f64 * self.resolution;
            let y = iy as f64 * self.resolution;
            if (x - cx).powi(2) + (y - cy).powi(2) <= r2 {
                self.occupancy[(ix, iy)] = true;
            }
        }
    }

    pub fn add_rect_obstacle(&mut self, rect: &RectObstacle) {
        self.add_rect(rect.x_min, rect.y_min, rect.x_max, rect.y_max);
    }

    pub fn add_circle_obstacle(&mut self, circle: &CircleObstacle) {
        self.add_circle(circle.cx, circle.cy, circle.r);
    }

    /// Nearest cell to a world position, clamped into the grid
    ///
    /// Ties round to the even index.
    pub fn world_to_index(&self, pos: Point2D) -> GridNode {
        GridNode::new(
            Self::round_clamped(pos.x / self.resolution, self.width),
            Self::round_clamped(pos.y / self.resolution, self.height),
        )
    }

    /// Origin corner of a cell
    pub fn index_to_world(&self, idx: GridNode) -> Point2D {
        Point2D::new(
            idx.x as f64 * self.resolution,
            idx.y as f64 * self.resolution,
        )
    }

    pub fn contains_index(&self, idx: GridNode) -> bool {
        idx.x >= 0 && idx.y >= 0 && (idx.x as usize) < self.width && (idx.y as usize) < self.height
    }

    /// Cells outside the grid count as occupied
    pub fn is_occupied_index(&self, idx: GridNode) -> bool {
        if !self.contains_index(idx) {
            return true;
        }
        self.occupancy[(idx.x as usize, idx.y as usize)]
    }

    pub fn is_occupied_pos(&self, pos: Point2D) -> bool {
        self.is_occupied_index(self.world_to_index(pos))
    }

    pub fn occupied_count(&self) -> usize {
        self.occupancy.iter().filter(|&&cell| cell).count()
    }

    /// Inclusive index span covered by `[lo, hi]`, or `None` once clipped away
    fn clip_span(&self, lo: f64, hi: f64, dim: usize) -> Option<(usize, usize)> {
        let i_lo = ((lo / self.resolution).floor() as i64).max(0);
        let i_hi = ((hi / self.resolution).floor() as i64).min(dim as i64 - 1);
        if i_lo > i_hi {
            return None;
        }
        Some((i_lo as usize, i_hi as usize))
    }

    fn round_clamped(value: f64, dim: usize) -> i32 {
        let i = value.round_ties_even() as i64;
        i.clamp(0, dim as i64 - 1) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_map(width: usize, height: usize, resolution: f64) -> OccupancyMap {
        OccupancyMap::new(MapConfig { width, height, resolution }).unwrap()
    }

    #[test]
    fn test_invalid_map_config() {
        assert!(OccupancyMap::new(MapConfig { width: 0, height: 5, resolution: 1.0 }).is_err());
        assert!(OccupancyMap::new(MapConfig { width: 5, height: 5, resolution: 0.0 }).is_err());
        assert!(OccupancyMap::new(MapConfig { width: 5, height: 5, resolution: f64::NAN }).is_err());
    }

    #[test]
    fn test_rect_marks_exactly_covered_cells() {
        let mut map = empty_map(20, 20, 1.0);
        map.add_rect(2.0, 3.0, 5.5, 6.2);

        for x in 0..20 {
            for y in 0..20 {
                let inside = (2..=5).contains(&x) && (3..=6).contains(&y);
                assert_eq!(map.is_occupied_index(GridNode::new(x, y)), inside, "cell ({}, {})", x, y);
            }
        }
        assert_eq!(map.occupied_count(), 4 * 4);
        assert_eq!(map.rects().len(), 1);
    }

    #[test]
    fn test_rect_is_clipped_to_grid() {
        let mut map = empty_map(10, 10, 1.0);
        map.add_rect(-5.0, -5.0, 1.0, 100.0);
        assert_eq!(map.occupied_count(), 2 * 10);
        assert!(map.is_occupied_index(GridNode::new(0, 9)));
        assert!(!map.is_occupied_index(GridNode::new(2, 0)));
    }

    #[test]
    fn test_rect_outside_or_degenerate_is_noop() {
        let mut map = empty_map(10, 10, 1.0);
        map.add_rect(20.0, 20.0, 30.0, 30.0);
        map.add_rect(-8.0, 2.0, -3.0, 4.0);
        map.add_rect(6.0, 6.0, 4.0, 8.0);
        map.add_rect(f64::NAN, 0.0, 3.0, 3.0);
        assert_eq!(map.occupied_count(), 0);
    }

    #[test]
    fn test_circle_uses_cell_origin_inclusive() {
        let mut map = empty_map(20, 20, 1.0);
        map.add_circle(10.0, 10.0, 2.0);

        for x in 0..20 {
            for y in 0..20 {
                let d2 = ((x - 10) * (x - 10) + (y - 10) * (y - 10)) as f64;
                assert_eq!(map.is_occupied_index(GridNode::new(x, y)), d2 <= 4.0, "cell ({}, {})", x, y);
            }
        }
        // boundary cells at exactly r are included
        assert!(map.is_occupied_index(GridNode::new(12, 10)));
        assert!(map.is_occupied_index(GridNode::new(10, 8)));
        assert_eq!(map.occupied_count(), 13);
    }

    #[test]
    fn test_circle_with_resolution() {
        let mut map = empty_map(20, 20, 0.5);
        map.add_circle(5.0, 5.0, 1.0);
        assert!(map.is_occupied_index(GridNode::new(10, 10)));
        assert!(map.is_occupied_index(GridNode::new(12, 10)));
        assert!(!map.is_occupied_index(GridNode::new(13, 10)));
        assert!(!map.is_occupied_index(GridNode::new(12, 12)));
    }

    #[test]
    fn test_negative_radius_is_noop() {
        let mut map = empty_map(10, 10, 1.0);
        map.add_circle(5.0, 5.0, -1.0);
        map.add_circle(5.0, f64::INFINITY, 1.0);
        assert_eq!(map.occupied_count(), 0);
        assert!(map.circles().is_empty());
    }

    #[test]
    fn test_world_to_index_rounds_and_clamps() {
        let map = empty_map(10, 8, 1.0);
        assert_eq!(map.world_to_index(Point2D::new(2.4, 2.6)), GridNode::new(2, 3));
        assert_eq!(map.world_to_index(Point2D::new(2.5, 3.5)), GridNode::new(2, 4));
        assert_eq!(map.world_to_index(Point2D::new(-3.0, 100.0)), GridNode::new(0, 7));
        assert_eq!(map.world_to_index(Point2D::new(f64::NAN, 1.0e300)), GridNode::new(0, 7));
    }

    #[test]
    fn test_index_to_world_returns_origin_corner() {
        let map = empty_map(10, 10, 0.5);
        assert_eq!(map.index_to_world(GridNode::new(3, 4)), Point2D::new(1.5, 2.0));
        assert_eq!(map.world_to_index(Point2D::new(1.5, 2.0)), GridNode::new(3, 4));
    }

    #[test]
    fn test_query_by_position() {
        let mut map = empty_map(10, 10, 1.0);
        map.add_rect(4.0, 4.0, 4.0, 4.0);
        assert!(map.is_occupied_pos(Point2D::new(4.2, 3.8)));
        assert!(!map.is_occupied_pos(Point2D::new(5.2, 4.0)));
        assert!(map.is_occupied_index(GridNode::new(-1, 0)));
        assert!(map.is_occupied_index(GridNode::new(10, 0)));
    }
}
