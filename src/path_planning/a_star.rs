//! A* path planning on an occupancy grid
//!
//! The search runs over an 8-connected grid where an axis move costs 1.0
//! and a diagonal move costs sqrt(2) (cells measured in index units). The
//! heuristic is the Euclidean cell distance to the goal, so the returned
//! path is optimal under that cost model.
//!
//! The open set is a binary heap with lazy deletion: an improved cost
//! pushes a fresh entry and the stale one is skipped when it surfaces
//! behind an already-finalized node. Entries with equal priority pop in
//! unspecified order, so two optimal paths of equal cost may be returned
//! on different builds; the cost never differs.
//!
//! Diagonal moves are allowed even when both orthogonal corner cells are
//! occupied, which lets a path slip between two diagonally touching
//! obstacles.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap};

use ordered_float::OrderedFloat;
use tracing::debug;

use crate::common::{GridNode, NavError, NavResult, NoPathReason, Path2D, PathPlanner, Point2D};
use crate::mapping::OccupancyMap;

/// Open-set entry ordered as a min-heap on `priority`
#[derive(Debug)]
struct OpenEntry {
    priority: OrderedFloat<f64>,
    cost: f64,
    node: GridNode,
    parent: Option<GridNode>,
}

impl Eq for OpenEntry {}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other.priority.cmp(&self.priority)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Grid A* planner borrowing a read-only occupancy map
///
/// Holds no state between calls; `plan` is idempotent.
pub struct AStarPlanner<'m> {
    map: &'m OccupancyMap,
    motion: [(i32, i32, f64); 8],
}

impl<'m> AStarPlanner<'m> {
    pub fn new(map: &'m OccupancyMap) -> Self {
        AStarPlanner { map, motion: Self::get_motion_model() }
    }

    /// Get reference to the map being searched
    pub fn map(&self) -> &'m OccupancyMap {
        self.map
    }

    /// In-grid neighbors of `node` with their step cost
    pub fn neighbors(&self, node: GridNode) -> impl Iterator<Item = (GridNode, f64)> + '_ {
        self.motion
            .iter()
            .map(move |&(dx, dy, cost)| (node.offset(dx, dy), cost))
            .filter(move |(n, _)| self.map.contains_index(*n))
    }

    fn calc_heuristic(n1: GridNode, n2: GridNode) -> f64 {
        n1.distance(&n2)
    }

    fn get_motion_model() -> [(i32, i32, f64); 8] {
        // dx, dy, cost
        [
            (-1, 0, 1.0),
            (1, 0, 1.0),
            (0, -1, 1.0),
            (0, 1, 1.0),
            (-1, -1, std::f64::consts::SQRT_2),
            (1, 1, std::f64::consts::SQRT_2),
            (1, -1, std::f64::consts::SQRT_2),
            (-1, 1, std::f64::consts::SQRT_2),
        ]
    }

    fn build_path(&self, goal: GridNode, came_from: &HashMap<GridNode, Option<GridNode>>) -> Path2D {
        let mut points = Vec::new();
        let mut current = Some(goal);

        while let Some(node) = current {
            points.push(self.map.index_to_world(node));
            current = came_from.get(&node).copied().flatten();
        }

        points.reverse();
        Path2D::from_points(points)
    }
}

impl PathPlanner for AStarPlanner<'_> {
    fn plan(&self, start: Point2D, goal: Point2D) -> NavResult<Path2D> {
        let start_idx = self.map.world_to_index(start);
        let goal_idx = self.map.world_to_index(goal);

        if self.map.is_occupied_index(goal_idx) {
            debug!(?goal, "goal inside obstacle");
            return Err(NavError::NoPath(NoPathReason::GoalOccupied));
        }

        let mut open_set = BinaryHeap::new();
        // finalized nodes and the parent they were reached from
        let mut came_from: HashMap<GridNode, Option<GridNode>> = HashMap::new();
        let mut cost_so_far: HashMap<GridNode, f64> = HashMap::new();

        cost_so_far.insert(start_idx, 0.0);
        open_set.push(OpenEntry {
            priority: OrderedFloat(Self::calc_heuristic(start_idx, goal_idx)),
            cost: 0.0,
            node: start_idx,
            parent: None,
        });

        let mut expansions = 0usize;
        while let Some(current) = open_set.pop() {
            match came_from.entry(current.node) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(current.parent);
                }
            }
            expansions += 1;

            if current.node == goal_idx {
                debug!(expansions, open = open_set.len(), cost = current.cost, "found goal");
                return Ok(self.build_path(current.node, &came_from));
            }

            for (next, step_cost) in self.neighbors(current.node) {
                if self.map.is_occupied_index(next) {
                    continue;
                }
                let new_cost = current.cost + step_cost;
                let improved = cost_so_far.get(&next).map_or(true, |&c| new_cost < c);
                if improved {
                    cost_so_far.insert(next, new_cost);
                    open_set.push(OpenEntry {
                        priority: OrderedFloat(new_cost + Self::calc_heuristic(next, goal_idx)),
                        cost: new_cost,
                        node: next,
                        parent: Some(current.node),
                    });
                }
            }
        }

        debug!(expansions, "open set exhausted");
        Err(NavError::NoPath(NoPathReason::Unreachable))
    }
}
