//! Common traits defining interfaces for planners and controllers

use crate::common::error::NavResult;
use crate::common::types::*;

/// Trait for path planning algorithms
pub trait PathPlanner {
    /// Plan a path from start to goal
    ///
    /// A missing route is reported as `NavError::NoPath`.
    fn plan(&self, start: Point2D, goal: Point2D) -> NavResult<Path2D>;
}

/// Trait for per-agent velocity controllers
pub trait Controller {
    /// Compute a velocity command steering `position` toward `target`
    /// while reacting to the given neighbor positions.
    fn compute(&mut self, position: Point2D, target: Point2D, neighbors: &[Point2D]) -> VelocityCommand;

    /// Reset controller state
    fn reset(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::{NavError, NoPathReason};

    // Test that traits compile correctly
    struct DummyPlanner;

    impl PathPlanner for DummyPlanner {
        fn plan(&self, start: Point2D, goal: Point2D) -> NavResult<Path2D> {
            if start == goal {
                Ok(Path2D::from_points(vec![start]))
            } else {
                Err(NavError::NoPath(NoPathReason::Unreachable))
            }
        }
    }

    #[test]
    fn test_path_planner_trait() {
        let planner = DummyPlanner;
        assert!(planner.plan(Point2D::origin(), Point2D::origin()).is_ok());
        let err = planner.plan(Point2D::origin(), Point2D::new(1.0, 1.0)).unwrap_err();
        assert!(err.is_no_path());
    }
}
