// Path Planning algorithms module

pub mod a_star;

pub use a_star::*;
