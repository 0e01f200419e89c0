//! Point-mass agent driven by planar velocity commands
//!
//! Position is integrated with forward Euler; the commanded vector is
//! rescaled onto `max_speed` when it is longer. Every call to `advance`
//! appends the resulting position to the trajectory, moving or not.

use nalgebra::Vector2;

use crate::common::{clamp_speed, Point2D};

/// Below this speed the heading is held
const HEADING_SPEED_THRESHOLD: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct Agent {
    position: Vector2<f64>,
    yaw: f64,
    max_speed: f64,
    history: Vec<Point2D>,
}

impl Agent {
    pub fn new(x: f64, y: f64, yaw: f64, max_speed: f64) -> Self {
        Agent {
            position: Vector2::new(x, y),
            yaw,
            max_speed: max_speed.max(0.0),
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> Point2D {
        Point2D::from(self.position)
    }

    pub fn yaw(&self) -> f64 {
        self.yaw
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Positions visited after each state update, oldest first
    pub fn history(&self) -> &[Point2D] {
        &self.history
    }

    /// Integrate one step of the commanded velocity
    ///
    /// A non-finite command is applied as zero velocity.
    pub fn advance(&mut self, vx: f64, vy: f64, dt: f64) {
        let v = clamp_speed(Vector2::new(vx, vy), self.max_speed);

        self.position += v * dt;
        if v.norm() > HEADING_SPEED_THRESHOLD {
            self.yaw = v.y.atan2(v.x);
        }
        self.history.push(self.position());
    }

    /// Overwrite the position with an externally reported one
    pub fn sync_position(&mut self, position: Point2D) {
        self.position = position.to_vector();
        self.history.push(position);
    }
}
