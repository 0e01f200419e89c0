//! Common types, traits, and error definitions for rust_swarm_nav
//!
//! This module provides the foundational building blocks shared by
//! the map, planner, controller, and simulation modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
