//! Fixed-step multi-agent simulation

pub mod observer;
pub mod scenario;
pub mod sim_loop;
pub mod transport;

pub use observer::*;
pub use scenario::*;
pub use sim_loop::*;
pub use transport::*;
