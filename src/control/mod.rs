//! Control algorithms module
//!
//! Per-agent velocity control for the multi-agent simulation.

pub mod velocity_controller;

pub use velocity_controller::*;
