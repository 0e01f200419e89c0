//! rust_swarm_nav - multi-agent navigation on a 2D occupancy grid
//!
//! Each agent gets an A* plan over a shared occupancy grid, then a PID
//! velocity controller with short-range repulsion steers it waypoint by
//! waypoint while a fixed-step loop integrates all agents together.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod agent;
pub mod control;
pub mod simulation;

// Re-export common types for convenience
pub use common::{GridNode, Path2D, Point2D, VelocityCommand};
pub use common::{Controller, PathPlanner};
pub use common::{NavError, NavResult, NoPathReason};
