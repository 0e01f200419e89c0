//! Fixed-timestep multi-agent simulation loop
//!
//! Each tick walks the agents in index order. An agent with waypoints left
//! first checks whether it is inside `arrival_radius` of its current
//! waypoint and, if so, moves its cursor one step (finishing when the
//! cursor runs off the end of its plan). It then asks its controller for a
//! velocity toward the current waypoint given the other agents' positions,
//! hands the command to the transport, and either integrates it or adopts
//! the pose the transport reports.
//!
//! With `NeighborMode::Snapshot` all positions are copied before the first
//! controller call of the tick, so every agent reacts to the same state.
//! `NeighborMode::Sequential` reads positions live, letting later agents
//! see neighbors already moved this tick.

use serde::Deserialize;
use tracing::{debug, info};

use crate::agent::Agent;
use crate::common::{Controller, NavError, NavResult, Path2D, Point2D};
use crate::control::VelocityController;
use crate::mapping::OccupancyMap;

use super::observer::{AgentView, RunOutcome, RunSummary, SimulationObserver, SimulationSnapshot};
use super::transport::{LocalIntegration, MotionTransport};

/// Source of neighbor positions for controller calls within a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborMode {
    /// Positions frozen at tick start
    #[default]
    Snapshot,
    /// Positions as currently held, including moves made earlier this tick
    Sequential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Integration step [s]
    pub dt: f64,
    /// Tick budget for one run
    pub max_steps: usize,
    /// Distance under which the current waypoint counts as reached
    pub arrival_radius: f64,
    pub neighbor_mode: NeighborMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            max_steps: 4000,
            arrival_radius: 0.8,
            neighbor_mode: NeighborMode::Snapshot,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> NavResult<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(NavError::InvalidParameter(format!("simulation dt must be positive, got {}", self.dt)));
        }
        if self.arrival_radius.is_nan() || self.arrival_radius < 0.0 {
            return Err(NavError::InvalidParameter(format!(
                "arrival_radius must be >= 0, got {}",
                self.arrival_radius
            )));
        }
        Ok(())
    }
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStatus {
    /// At least one agent still had waypoints at the start of the tick
    Running,
    AllArrived,
}

enum Progress {
    Idle,
    Finished,
    Steer(Point2D),
}

struct AgentSlot<C> {
    agent: Agent,
    plan: Option<Path2D>,
    cursor: usize,
    controller: C,
}

impl<C> AgentSlot<C> {
    fn is_active(&self) -> bool {
        self.plan.as_ref().map_or(false, |p| self.cursor < p.len())
    }

    fn has_arrived(&self) -> bool {
        self.plan.as_ref().map_or(false, |p| self.cursor >= p.len())
    }

    fn progress(&mut self, arrival_radius: f64) -> Progress {
        let Some(plan) = self.plan.as_ref() else {
            return Progress::Idle;
        };
        let Some(mut target) = plan.get(self.cursor) else {
            return Progress::Idle;
        };
        if self.agent.position().distance(&target) < arrival_radius {
            self.cursor += 1;
            match plan.get(self.cursor) {
                Some(next) => target = next,
                None => return Progress::Finished,
            }
        }
        Progress::Steer(target)
    }
}

pub struct Simulation<'m, C = VelocityController> {
    map: &'m OccupancyMap,
    config: SimulationConfig,
    slots: Vec<AgentSlot<C>>,
    step: usize,
}

impl<'m, C: Controller> Simulation<'m, C> {
    pub fn new(map: &'m OccupancyMap, config: SimulationConfig) -> NavResult<Self> {
        config.validate()?;
        Ok(Simulation { map, config, slots: Vec::new(), step: 0 })
    }

    /// Register an agent with its precomputed plan; `None` leaves it idle
    pub fn add_agent(&mut self, agent: Agent, plan: Option<Path2D>, controller: C) -> usize {
        self.slots.push(AgentSlot { agent, plan, cursor: 0, controller });
        self.slots.len() - 1
    }

    pub fn map(&self) -> &'m OccupancyMap {
        self.map
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ticks executed so far
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.slots.get(index).map(|s| &s.agent)
    }

    pub fn plan(&self, index: usize) -> Option<&Path2D> {
        self.slots.get(index).and_then(|s| s.plan.as_ref())
    }

    pub fn cursor(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(|s| s.cursor)
    }

    pub fn controller(&self, index: usize) -> Option<&C> {
        self.slots.get(index).map(|s| &s.controller)
    }

    pub fn controller_mut(&mut self, index: usize) -> Option<&mut C> {
        self.slots.get_mut(index).map(|s| &mut s.controller)
    }

    /// No agent has waypoints left
    pub fn is_finished(&self) -> bool {
        !self.slots.iter().any(|s| s.is_active())
    }

    pub fn positions(&self) -> Vec<Point2D> {
        self.slots.iter().map(|s| s.agent.position()).collect()
    }

    pub fn arrived(&self) -> Vec<bool> {
        self.slots.iter().map(|s| s.has_arrived()).collect()
    }

    pub fn snapshot(&self) -> SimulationSnapshot<'_> {
        SimulationSnapshot {
            step: self.step,
            map: self.map,
            agents: self
                .slots
                .iter()
                .map(|s| AgentView {
                    position: s.agent.position(),
                    yaw: s.agent.yaw(),
                    history: s.agent.history(),
                    plan: s.plan.as_ref(),
                    cursor: s.cursor,
                    done: !s.is_active(),
                })
                .collect(),
        }
    }

    /// Advance every agent one tick with local integration
    pub fn tick(&mut self) -> TickStatus {
        self.tick_with(&mut LocalIntegration)
    }

    pub fn tick_with<T: MotionTransport + ?Sized>(&mut self, transport: &mut T) -> TickStatus {
        let frozen = match self.config.neighbor_mode {
            NeighborMode::Snapshot => Some(self.positions()),
            NeighborMode::Sequential => None,
        };
        let dt = self.config.dt;
        let mut any_active = false;

        for i in 0..self.slots.len() {
            if !self.slots[i].is_active() {
                continue;
            }
            any_active = true;

            let target = match self.slots[i].progress(self.config.arrival_radius) {
                Progress::Steer(target) => target,
                Progress::Finished => {
                    info!(agent = i, step = self.step, "agent reached its goal");
                    continue;
                }
                Progress::Idle => continue,
            };

            let neighbors: Vec<Point2D> = match &frozen {
                Some(positions) => others(positions.iter().copied(), i),
                None => others(self.slots.iter().map(|s| s.agent.position()), i),
            };

            let slot = &mut self.slots[i];
            let cmd = slot.controller.compute(slot.agent.position(), target, &neighbors);
            transport.publish(i, cmd);
            match transport.reported_pose(i) {
                Some(pose) => slot.agent.sync_position(pose),
                None => slot.agent.advance(cmd.vx, cmd.vy, dt),
            }
        }

        self.step += 1;
        if any_active {
            TickStatus::Running
        } else {
            TickStatus::AllArrived
        }
    }

    /// Run until every agent is done, the budget runs out, or the observer stops it
    pub fn run<O: SimulationObserver + ?Sized>(&mut self, observer: &mut O) -> RunSummary {
        self.run_with(observer, &mut LocalIntegration)
    }

    pub fn run_with<O, T>(&mut self, observer: &mut O, transport: &mut T) -> RunSummary
    where
        O: SimulationObserver + ?Sized,
        T: MotionTransport + ?Sized,
    {
        let mut outcome = RunOutcome::StepBudgetExhausted;
        for _ in 0..self.config.max_steps {
            let status = self.tick_with(transport);
            observer.on_tick(&self.snapshot());

            if status == TickStatus::AllArrived {
                outcome = RunOutcome::AllArrived;
                break;
            }
            if observer.should_stop() {
                outcome = RunOutcome::StoppedByObserver;
                break;
            }
        }

        let summary = RunSummary {
            steps: self.step,
            outcome,
            arrived: self.arrived(),
        };
        info!(steps = summary.steps, outcome = ?summary.outcome, arrived = summary.arrived_count(), "simulation finished");
        debug!(positions = ?self.positions(), "final positions");
        observer.finish(&self.snapshot(), &summary);
        summary
    }
}

fn others(positions: impl Iterator<Item = Point2D>, skip: usize) -> Vec<Point2D> {
    positions
        .enumerate()
        .filter(|&(j, _)| j != skip)
        .map(|(_, p)| p)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PathPlanner, VelocityCommand};
    use crate::control::VelocityControllerConfig;
    use crate::mapping::MapConfig;
    use crate::path_planning::AStarPlanner;
    use crate::simulation::observer::NullObserver;
    use crate::simulation::transport::RecordingTransport;

    fn open_map() -> OccupancyMap {
        OccupancyMap::new(MapConfig { width: 40, height: 30, resolution: 1.0 }).unwrap()
    }

    fn pd_controller() -> VelocityController {
        VelocityController::new(VelocityControllerConfig {
            kp: 1.2,
            ki: 0.0,
            kd: 0.25,
            dt: 0.1,
            max_speed: 3.5,
            ..Default::default()
        })
        .unwrap()
    }

    /// Records neighbor lists seen on each call
    #[derive(Default)]
    struct ProbeController {
        seen: Vec<Vec<Point2D>>,
        velocity: (f64, f64),
    }

    impl Controller for ProbeController {
        fn compute(&mut self, _position: Point2D, _target: Point2D, neighbors: &[Point2D]) -> VelocityCommand {
            self.seen.push(neighbors.to_vec());
            VelocityCommand::new(self.velocity.0, self.velocity.1)
        }

        fn reset(&mut self) {
            self.seen.clear();
        }
    }

    struct StopAfter {
        ticks: usize,
        seen: usize,
    }

    impl SimulationObserver for StopAfter {
        fn on_tick(&mut self, _snapshot: &SimulationSnapshot<'_>) {
            self.seen += 1;
        }

        fn should_stop(&self) -> bool {
            self.seen >= self.ticks
        }
    }

    /// Reports a fixed pose instead of letting the loop integrate
    struct PinnedPose(Point2D);

    impl MotionTransport for PinnedPose {
        fn publish(&mut self, _agent: usize, _cmd: VelocityCommand) {}

        fn reported_pose(&mut self, _agent: usize) -> Option<Point2D> {
            Some(self.0)
        }
    }

    fn far_plan() -> Path2D {
        Path2D::from_points(vec![Point2D::new(30.0, 20.0)])
    }

    #[test]
    fn test_invalid_config_rejected() {
        let map = open_map();
        let bad = SimulationConfig { dt: -0.1, ..Default::default() };
        assert!(Simulation::<VelocityController>::new(&map, bad).is_err());
    }

    #[test]
    fn test_single_agent_reaches_goal() {
        let map = open_map();
        let planner = AStarPlanner::new(&map);
        let plan = planner.plan(Point2D::new(2.0, 2.0), Point2D::new(20.0, 12.0)).unwrap();

        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        sim.add_agent(Agent::new(2.0, 2.0, 0.0, 4.0), Some(plan), pd_controller());
        let summary = sim.run(&mut NullObserver);

        assert_eq!(summary.outcome, RunOutcome::AllArrived);
        assert_eq!(summary.arrived, vec![true]);
        let end = sim.agent(0).unwrap().position();
        assert!(end.distance(&Point2D::new(20.0, 12.0)) < 0.8);
        // one tick to notice the last waypoint, one more to report completion
        assert_eq!(sim.agent(0).unwrap().history().len() + 2, summary.steps);
    }

    #[test]
    fn test_idle_agent_does_not_block_termination() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        let plan = Path2D::from_points(vec![Point2D::new(1.0, 0.0)]);
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 4.0), Some(plan), pd_controller());
        sim.add_agent(Agent::new(10.0, 10.0, 0.0, 4.0), None, pd_controller());

        let summary = sim.run(&mut NullObserver);
        assert_eq!(summary.outcome, RunOutcome::AllArrived);
        assert_eq!(summary.arrived, vec![true, false]);
        assert!(sim.agent(1).unwrap().history().is_empty());
        assert_eq!(sim.agent(1).unwrap().position(), Point2D::new(10.0, 10.0));
    }

    #[test]
    fn test_step_budget_exhausted() {
        let map = open_map();
        let config = SimulationConfig { max_steps: 5, ..Default::default() };
        let mut sim = Simulation::new(&map, config).unwrap();
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 1.0), Some(far_plan()), pd_controller());

        let summary = sim.run(&mut NullObserver);
        assert_eq!(summary.outcome, RunOutcome::StepBudgetExhausted);
        assert_eq!(summary.steps, 5);
        assert_eq!(summary.arrived, vec![false]);
    }

    #[test]
    fn test_observer_stop_is_honored() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 1.0), Some(far_plan()), pd_controller());

        let mut observer = StopAfter { ticks: 3, seen: 0 };
        let summary = sim.run(&mut observer);
        assert_eq!(summary.outcome, RunOutcome::StoppedByObserver);
        assert_eq!(summary.steps, 3);
    }

    #[test]
    fn test_cursor_advances_once_per_tick() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        // first two waypoints both inside the arrival radius of the start
        let plan = Path2D::from_points(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.1, 0.0),
            Point2D::new(10.0, 0.0),
        ]);
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 0.0), Some(plan), ProbeController::default());

        sim.tick();
        assert_eq!(sim.cursor(0), Some(1));
        sim.tick();
        assert_eq!(sim.cursor(0), Some(2));
        sim.tick();
        assert_eq!(sim.cursor(0), Some(2));
    }

    #[test]
    fn test_snapshot_mode_reads_tick_start_positions() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        let mover = ProbeController { velocity: (1.0, 0.0), ..Default::default() };
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 5.0), Some(far_plan()), mover);
        sim.add_agent(Agent::new(5.0, 5.0, 0.0, 5.0), Some(far_plan()), ProbeController::default());

        sim.tick();
        let seen_by_second = &sim.controller(1).unwrap().seen[0];
        assert_eq!(seen_by_second, &vec![Point2D::new(0.0, 0.0)]);
    }

    #[test]
    fn test_sequential_mode_sees_same_tick_updates() {
        let map = open_map();
        let config = SimulationConfig { neighbor_mode: NeighborMode::Sequential, ..Default::default() };
        let mut sim = Simulation::new(&map, config).unwrap();
        let mover = ProbeController { velocity: (1.0, 0.0), ..Default::default() };
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 5.0), Some(far_plan()), mover);
        sim.add_agent(Agent::new(5.0, 5.0, 0.0, 5.0), Some(far_plan()), ProbeController::default());

        sim.tick();
        let seen_by_second = &sim.controller(1).unwrap().seen[0];
        assert!((seen_by_second[0].x - 0.1).abs() < 1e-12);
        let seen_by_first = &sim.controller(0).unwrap().seen[0];
        assert_eq!(seen_by_first, &vec![Point2D::new(5.0, 5.0)]);
    }

    #[test]
    fn test_transport_receives_commands_and_can_override_pose() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig { max_steps: 4, ..Default::default() }).unwrap();
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 4.0), Some(far_plan()), pd_controller());

        let mut recorder = RecordingTransport::new();
        sim.run_with(&mut NullObserver, &mut recorder);
        assert_eq!(recorder.commands(0).len(), 4);
        assert!(recorder.commands(0).iter().all(|c| c.speed() <= 3.5 + 1e-9));

        let mut pinned = PinnedPose(Point2D::new(7.0, 7.0));
        sim.tick_with(&mut pinned);
        assert_eq!(sim.agent(0).unwrap().position(), Point2D::new(7.0, 7.0));
        assert_eq!(sim.agent(0).unwrap().history().len(), 5);
    }

    #[test]
    fn test_snapshot_exposes_plans_and_cursor() {
        let map = open_map();
        let mut sim = Simulation::new(&map, SimulationConfig::default()).unwrap();
        sim.add_agent(Agent::new(0.0, 0.0, 0.0, 4.0), Some(far_plan()), pd_controller());
        sim.add_agent(Agent::new(3.0, 3.0, 0.0, 4.0), None, pd_controller());
        sim.tick();

        let snap = sim.snapshot();
        assert_eq!(snap.step, 1);
        assert_eq!(snap.agents.len(), 2);
        assert_eq!(snap.agents[0].history.len(), 1);
        assert!(snap.agents[0].plan.is_some());
        assert!(!snap.agents[0].done);
        assert!(snap.agents[1].plan.is_none());
        assert!(snap.agents[1].done);
    }
}
