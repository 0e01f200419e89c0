// Agent kinematics module

pub mod point_mass;

pub use point_mass::*;
