//! PID velocity controller with inter-agent repulsion
//!
//! The PID output is used directly as a velocity, not a force. Each
//! neighbor inside `repulsion_radius` pushes the agent away with a
//! strength falling linearly from `repulsion_gain` at contact to zero at
//! the radius; the pushes are summed on top of the PID term and the
//! total is clamped to `max_speed`. A total that is no longer finite
//! comes out as a zero command.
//!
//! The integral term accumulates without any anti-windup clamp, so a
//! persistent tracking error keeps growing its contribution.

use nalgebra::Vector2;
use serde::Deserialize;

use crate::common::{clamp_speed, Controller, NavError, NavResult, Point2D, VelocityCommand};

/// Neighbors closer than this give no usable direction and are skipped
const MIN_NEIGHBOR_DISTANCE: f64 = 1e-6;

/// Gains and limits for [`VelocityController`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VelocityControllerConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Control period [s]
    pub dt: f64,
    /// Output speed limit
    pub max_speed: f64,
    /// Repulsion strength at zero distance
    pub repulsion_gain: f64,
    /// Neighbors at or beyond this distance are ignored
    pub repulsion_radius: f64,
}

impl Default for VelocityControllerConfig {
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            dt: 0.1,
            max_speed: 3.0,
            repulsion_gain: 1.2,
            repulsion_radius: 4.0,
        }
    }
}

impl VelocityControllerConfig {
    pub fn validate(&self) -> NavResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(NavError::InvalidParameter(format!("controller dt must be positive, got {}", self.dt)));
        }
        if self.max_speed.is_nan() || self.max_speed < 0.0 {
            return Err(NavError::InvalidParameter(format!("max_speed must be >= 0, got {}", self.max_speed)));
        }
        if self.repulsion_radius.is_nan() || self.repulsion_radius < 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "repulsion_radius must be >= 0, got {}",
                self.repulsion_radius
            )));
        }
        Ok(())
    }
}

/// Per-agent controller; keeps integral and previous-error memory across calls
#[derive(Debug, Clone)]
pub struct VelocityController {
    config: VelocityControllerConfig,
    integral: Vector2<f64>,
    prev_error: Option<Vector2<f64>>,
}

impl VelocityController {
    pub fn new(config: VelocityControllerConfig) -> NavResult<Self> {
        config.validate()?;
        Ok(VelocityController {
            config,
            integral: Vector2::zeros(),
            prev_error: None,
        })
    }

    pub fn config(&self) -> &VelocityControllerConfig {
        &self.config
    }

    /// Accumulated `error * dt`
    pub fn integral(&self) -> Vector2<f64> {
        self.integral
    }

    /// Error seen on the previous call, `None` before the first call
    pub fn previous_error(&self) -> Option<Vector2<f64>> {
        self.prev_error
    }

    fn repulsion(&self, position: &Vector2<f64>, neighbors: &[Point2D]) -> Vector2<f64> {
        let radius = self.config.repulsion_radius;
        let mut push = Vector2::zeros();
        if radius <= 0.0 {
            return push;
        }
        for neighbor in neighbors {
            let diff = position - neighbor.to_vector();
            let dist = diff.norm();
            if dist < MIN_NEIGHBOR_DISTANCE || dist >= radius {
                continue;
            }
            let strength = self.config.repulsion_gain * (radius - dist) / radius;
            push += diff / dist * strength;
        }
        push
    }
}

impl Controller for VelocityController {
    fn compute(&mut self, position: Point2D, target: Point2D, neighbors: &[Point2D]) -> VelocityCommand {
        let pos = position.to_vector();
        let error = target.to_vector() - pos;
        let dt = self.config.dt;

        self.integral += error * dt;
        let derivative = match self.prev_error {
            Some(prev) => (error - prev) / dt,
            None => Vector2::zeros(),
        };
        self.prev_error = Some(error);

        let mut u = self.config.kp * error + self.config.ki * self.integral + self.config.kd * derivative;
        u += self.repulsion(&pos, neighbors);

        VelocityCommand::from(clamp_speed(u, self.config.max_speed))
    }

    fn reset(&mut self) {
        self.integral = Vector2::zeros();
        self.prev_error = None;
    }
}
