//! Utility modules for rust_swarm_nav

pub mod visualization;

pub use visualization::{colors, render_snapshot, save_png, FrameRecorder, RecorderConfig};
