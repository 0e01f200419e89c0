//! Read-only per-tick view of the simulation for rendering and recording

use crate::common::{Path2D, Point2D};
use crate::mapping::OccupancyMap;

/// One agent as seen by an observer
#[derive(Debug, Clone, Copy)]
pub struct AgentView<'a> {
    pub position: Point2D,
    pub yaw: f64,
    pub history: &'a [Point2D],
    pub plan: Option<&'a Path2D>,
    /// Index of the waypoint currently steered toward
    pub cursor: usize,
    pub done: bool,
}

#[derive(Debug, Clone)]
pub struct SimulationSnapshot<'a> {
    pub step: usize,
    pub map: &'a OccupancyMap,
    pub agents: Vec<AgentView<'a>>,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    AllArrived,
    StepBudgetExhausted,
    StoppedByObserver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks executed
    pub steps: usize,
    pub outcome: RunOutcome,
    /// Per agent: plan exhausted. Idle agents (no plan) report false.
    pub arrived: Vec<bool>,
}

impl RunSummary {
    pub fn arrived_count(&self) -> usize {
        self.arrived.iter().filter(|&&a| a).count()
    }
}

/// Consumer of per-tick snapshots
pub trait SimulationObserver {
    fn on_tick(&mut self, snapshot: &SimulationSnapshot<'_>);

    /// Checked after every tick; `true` ends the run
    fn should_stop(&self) -> bool {
        false
    }

    fn finish(&mut self, _snapshot: &SimulationSnapshot<'_>, _summary: &RunSummary) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl SimulationObserver for NullObserver {
    fn on_tick(&mut self, _snapshot: &SimulationSnapshot<'_>) {}
}
