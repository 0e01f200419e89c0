//! Visualization utilities for rust_swarm_nav
//!
//! Renders simulation snapshots with gnuplot, either as a numbered frame
//! sequence written while the loop runs or as one overview plot at the end.

use std::fs;
use std::path::{Path, PathBuf};

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::{NavError, NavResult, Point2D};
use crate::simulation::{RunSummary, SimulationObserver, SimulationSnapshot};

/// Color palette for consistent styling
pub mod colors {
    pub const OBSTACLE: &str = "#B22222";
    pub const START: &str = "#0000FF";
    pub const GOAL: &str = "#DAA520";
    pub const TARGET: &str = "#000000";

    /// Cycled per agent for plans, trajectories, and markers
    pub const AGENTS: [&str; 6] = ["#00CED1", "#FF00FF", "#FFA500", "#008000", "#800080", "#000080"];

    pub fn agent(index: usize) -> &'static str {
        AGENTS[index % AGENTS.len()]
    }
}

const CIRCLE_SEGMENTS: usize = 48;

/// Frame output settings for [`FrameRecorder`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub enabled: bool,
    pub frames_dir: PathBuf,
    /// Write one frame every this many ticks
    pub every_n_frames: usize,
    /// Stop the run after this many frames; `None` for no limit
    pub max_frames: Option<usize>,
    pub width: u32,
    pub height: u32,
    /// Overview plot written when the run ends
    pub summary_path: Option<PathBuf>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            frames_dir: PathBuf::from("frames"),
            every_n_frames: 10,
            max_frames: None,
            width: 1000,
            height: 700,
            summary_path: Some(PathBuf::from("img/multi_agent_sim.png")),
        }
    }
}

fn rect_outline(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> (Vec<f64>, Vec<f64>) {
    (
        vec![x_min, x_max, x_max, x_min, x_min],
        vec![y_min, y_min, y_max, y_max, y_min],
    )
}

fn circle_outline(cx: f64, cy: f64, r: f64) -> (Vec<f64>, Vec<f64>) {
    (0..=CIRCLE_SEGMENTS)
        .map(|k| {
            let a = 2.0 * std::f64::consts::PI * k as f64 / CIRCLE_SEGMENTS as f64;
            (cx + r * a.cos(), cy + r * a.sin())
        })
        .unzip()
}

fn xy(points: &[Point2D]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.x, p.y)).unzip()
}

/// Draw one snapshot into a fresh figure
pub fn render_snapshot(snapshot: &SimulationSnapshot<'_>, title: &str) -> Figure {
    let mut fg = Figure::new();
    let map = snapshot.map;
    let (x_max, y_max) = map.world_extent();
    let axes = fg.axes2d();

    for (k, rect) in map.rects().iter().enumerate() {
        let (ox, oy) = rect_outline(rect.x_min, rect.y_min, rect.x_max, rect.y_max);
        let caption = if k == 0 { "Obstacles" } else { "" };
        axes.lines(&ox, &oy, &[Caption(caption), Color(colors::OBSTACLE), LineWidth(2.0)]);
    }
    for (k, circle) in map.circles().iter().enumerate() {
        let (ox, oy) = circle_outline(circle.cx, circle.cy, circle.r);
        let caption = if k == 0 && map.rects().is_empty() { "Obstacles" } else { "" };
        axes.lines(&ox, &oy, &[Caption(caption), Color(colors::OBSTACLE), LineWidth(2.0)]);
    }

    for (i, view) in snapshot.agents.iter().enumerate() {
        let color = colors::agent(i);
        let label = format!("agent_{}", i + 1);

        if let Some(plan) = view.plan {
            let (px, py) = xy(&plan.points);
            axes.lines(&px, &py, &[Caption(""), Color(color), LineWidth(1.0)]);
            if let (Some(start), Some(goal)) = (plan.points.first(), plan.points.last()) {
                axes.points(&[start.x], &[start.y], &[Caption(""), Color(colors::START), PointSymbol('O'), PointSize(1.2)]);
                axes.points(&[goal.x], &[goal.y], &[Caption(""), Color(colors::GOAL), PointSymbol('*'), PointSize(2.0)]);
            }
            if let Some(target) = plan.get(view.cursor) {
                axes.points(&[target.x], &[target.y], &[Caption(""), Color(colors::TARGET), PointSymbol('x'), PointSize(1.0)]);
            }
        }

        if view.history.len() > 1 {
            let (hx, hy) = xy(view.history);
            axes.lines(&hx, &hy, &[Caption(""), Color(color), LineWidth(2.0)]);
        }
        axes.points(
            &[view.position.x],
            &[view.position.y],
            &[Caption(label.as_str()), Color(color), PointSymbol('O'), PointSize(1.5)],
        );
    }

    axes.set_title(title, &[])
        .set_x_label("X [m]", &[])
        .set_y_label("Y [m]", &[])
        .set_x_range(AutoOption::Fix(0.0), AutoOption::Fix(x_max))
        .set_y_range(AutoOption::Fix(0.0), AutoOption::Fix(y_max))
        .set_aspect_ratio(AutoOption::Fix(1.0));
    fg
}

/// Save a figure as PNG, creating the parent directory if needed
pub fn save_png(fg: &mut Figure, path: &Path, width: u32, height: u32) -> NavResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fg.save_to_png(path, width, height)
        .map_err(|e| NavError::Visualization(e.to_string()))
}

/// Observer writing every n-th snapshot as `frame_NNNN.png`
pub struct FrameRecorder {
    config: RecorderConfig,
    ticks_seen: usize,
    frames_written: usize,
}

impl FrameRecorder {
    pub fn new(config: RecorderConfig) -> NavResult<Self> {
        if config.every_n_frames == 0 {
            return Err(NavError::InvalidParameter("every_n_frames must be >= 1".to_string()));
        }
        fs::create_dir_all(&config.frames_dir)?;
        Ok(Self { config, ticks_seen: 0, frames_written: 0 })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn frame_path(&self, frame: usize) -> PathBuf {
        self.config.frames_dir.join(format!("frame_{:04}.png", frame))
    }
}

impl SimulationObserver for FrameRecorder {
    fn on_tick(&mut self, snapshot: &SimulationSnapshot<'_>) {
        if self.should_stop() {
            return;
        }
        self.ticks_seen += 1;
        if (self.ticks_seen - 1) % self.config.every_n_frames != 0 {
            return;
        }
        let path = self.frame_path(self.frames_written);
        let mut fg = render_snapshot(snapshot, &format!("Multi-agent simulation, step {}", snapshot.step));
        match save_png(&mut fg, &path, self.config.width, self.config.height) {
            Ok(()) => debug!(path = %path.display(), "wrote frame"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write frame"),
        }
        // failed frames still count toward the limit
        self.frames_written += 1;
    }

    fn should_stop(&self) -> bool {
        self.config.max_frames.map_or(false, |max| self.frames_written >= max)
    }

    fn finish(&mut self, snapshot: &SimulationSnapshot<'_>, summary: &RunSummary) {
        let Some(path) = self.config.summary_path.clone() else {
            return;
        };
        let title = format!(
            "Multi-agent simulation: {:?} after {} steps",
            summary.outcome, summary.steps
        );
        let mut fg = render_snapshot(snapshot, &title);
        if let Err(e) = save_png(&mut fg, &path, self.config.width, self.config.height) {
            warn!(path = %path.display(), error = %e, "failed to write summary plot");
        }
    }
}
