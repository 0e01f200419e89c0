//! Scenario description loaded from TOML
//!
//! A scenario bundles everything one run needs: the grid, its obstacles,
//! the agents with their start and goal, the controller gains shared by
//! every agent, the loop settings, and frame recording options.

use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::common::{NavResult, PathPlanner, Point2D};
use crate::control::{VelocityController, VelocityControllerConfig};
use crate::mapping::{add_random_obstacles, CircleObstacle, MapConfig, OccupancyMap, RandomObstacleConfig, RectObstacle};
use crate::path_planning::AStarPlanner;
use crate::utils::RecorderConfig;

use super::sim_loop::{Simulation, SimulationConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AgentSpec {
    pub start: Point2D,
    pub goal: Point2D,
    #[serde(default)]
    pub yaw: f64,
    #[serde(default = "default_agent_speed")]
    pub max_speed: f64,
}

fn default_agent_speed() -> f64 {
    4.0
}

impl AgentSpec {
    pub fn new(start: Point2D, goal: Point2D) -> Self {
        Self { start, goal, yaw: 0.0, max_speed: default_agent_speed() }
    }
}

/// One run's inputs
///
/// A section missing from a scenario file takes its own `Default`: no
/// obstacles, no agents, and default map, controller, loop and recorder
/// settings. `Scenario::default()` is the built-in three-agent run.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub rects: Vec<RectObstacle>,
    #[serde(default)]
    pub circles: Vec<CircleObstacle>,
    #[serde(default)]
    pub random_obstacles: Option<RandomObstacleConfig>,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub controller: VelocityControllerConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            map: MapConfig { width: 80, height: 50, resolution: 1.0 },
            rects: vec![
                RectObstacle::new(10.0, 5.0, 16.0, 22.0),
                RectObstacle::new(28.0, 10.0, 34.0, 30.0),
                RectObstacle::new(42.0, 2.0, 48.0, 20.0),
                RectObstacle::new(60.0, 35.0, 72.0, 45.0),
            ],
            circles: vec![
                CircleObstacle::new(22.0, 36.0, 3.0),
                CircleObstacle::new(50.0, 12.0, 4.0),
            ],
            random_obstacles: None,
            agents: vec![
                AgentSpec::new(Point2D::new(2.0, 2.0), Point2D::new(75.0, 45.0)),
                AgentSpec::new(Point2D::new(5.0, 8.0), Point2D::new(72.0, 8.0)),
                AgentSpec::new(Point2D::new(8.0, 40.0), Point2D::new(65.0, 28.0)),
            ],
            controller: VelocityControllerConfig {
                kp: 1.2,
                ki: 0.0,
                kd: 0.25,
                dt: 0.1,
                max_speed: 3.5,
                ..Default::default()
            },
            simulation: SimulationConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

impl Scenario {
    pub fn from_toml_str(text: &str) -> NavResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> NavResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let scenario = Self::from_toml_str(&text)?;
        info!(path = %path.as_ref().display(), agents = scenario.agents.len(), "loaded scenario");
        Ok(scenario)
    }

    /// Build the occupancy map with the listed and random obstacles
    pub fn build_map(&self) -> NavResult<OccupancyMap> {
        let mut map = OccupancyMap::new(self.map.clone())?;
        for rect in &self.rects {
            map.add_rect_obstacle(rect);
        }
        for circle in &self.circles {
            map.add_circle_obstacle(circle);
        }
        if let Some(random) = &self.random_obstacles {
            let mut rng = StdRng::seed_from_u64(random.seed);
            add_random_obstacles(&mut map, random, &mut rng);
        }
        info!(
            width = map.width(),
            height = map.height(),
            occupied = map.occupied_count(),
            "built occupancy map"
        );
        Ok(map)
    }

    /// Plan every agent on `map` and register it with a fresh controller
    ///
    /// An agent whose plan fails is kept idle.
    pub fn build_simulation<'m>(&self, map: &'m OccupancyMap) -> NavResult<Simulation<'m>> {
        let mut sim = Simulation::new(map, self.simulation.clone())?;
        let planner = AStarPlanner::new(map);

        for (i, spec) in self.agents.iter().enumerate() {
            let plan = match planner.plan(spec.start, spec.goal) {
                Ok(path) => {
                    info!(agent = i, waypoints = path.len(), length = path.total_length(), "planned path");
                    Some(path)
                }
                Err(e) => {
                    warn!(agent = i, start = ?spec.start, goal = ?spec.goal, error = %e, "no path for agent");
                    None
                }
            };
            let agent = Agent::new(spec.start.x, spec.start.y, spec.yaw, spec.max_speed);
            sim.add_agent(agent, plan, VelocityController::new(self.controller.clone())?);
        }
        Ok(sim)
    }
}
