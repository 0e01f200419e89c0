// Mapping module

pub mod occupancy_map;
pub mod random_obstacles;

pub use occupancy_map::*;
pub use random_obstacles::*;
