//! # Pathfinding
//!
//! A* shortest-path queries over the walkable, occupancy-aware grid. Paths
//! are recomputed per query; enemies never cache routes across turns where
//! occupancy may have changed.

use crate::config::DIAGONAL_COST;
use crate::utils::math::octile_distance;
use crate::world::{GameMap, Position};
use crate::{DelveError, DelveResult};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Movement rules for a pathfinding query.
///
/// Defaults to 8-connected movement with diagonal steps costing sqrt(2),
/// matching how enemies move in the game. Use [`MovementConfig::four_way`]
/// for strictly orthogonal movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementConfig {
    /// Whether diagonal steps are allowed.
    pub diagonal: bool,
}

impl MovementConfig {
    /// 8-connected movement: diagonal steps allowed at sqrt(2) cost.
    pub fn eight_way() -> Self {
        Self { diagonal: true }
    }

    /// 4-connected movement: orthogonal steps only.
    pub fn four_way() -> Self {
        Self { diagonal: false }
    }

    fn heuristic(&self, a: Position, b: Position) -> f64 {
        if self.diagonal {
            octile_distance(a, b)
        } else {
            a.manhattan_distance(b) as f64
        }
    }

    fn neighbors(&self, pos: Position) -> Vec<Position> {
        if self.diagonal {
            pos.adjacent_positions()
        } else {
            pos.cardinal_adjacent_positions()
        }
    }

    fn step_cost(&self, from: Position, to: Position) -> f64 {
        if from.x != to.x && from.y != to.y {
            DIAGONAL_COST
        } else {
            1.0
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self::eight_way()
    }
}

/// Frontier node ordered for a min-heap on f-score, ties broken toward the
/// lower h-score so the search prefers nodes closer to the goal.
#[derive(Debug, Clone)]
struct PathNode {
    position: Position,
    f_score: f64,
    h_score: f64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.h_score == other.h_score
    }
}

impl Eq for PathNode {}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior in BinaryHeap
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                other
                    .h_score
                    .partial_cmp(&self.h_score)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

/// Computes a shortest walkable route from `start` to `goal`.
///
/// The returned path runs from `start` to `goal` inclusive, each step
/// adjacent to the last. `find_path(s, s)` returns `[s]`. An unreachable
/// goal yields an **empty vector** — "no path" is an expected result, not an
/// error. Out-of-bounds endpoints are a caller contract violation and return
/// [`DelveError::OutOfBounds`].
///
/// Neighbor expansion honors current occupancy: a tile occupied by another
/// entity is not passable, except the goal tile itself (so an enemy can path
/// to the player's square).
///
/// # Examples
///
/// ```
/// use delve::{find_path, GameMap, MovementConfig, Position, Tile};
///
/// let mut map = GameMap::new(10, 3, 0);
/// for x in 1..9 {
///     map.set_tile(Position::new(x, 1), Tile::floor()).unwrap();
/// }
///
/// let path = find_path(
///     &map,
///     Position::new(1, 1),
///     Position::new(8, 1),
///     &MovementConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(path.first(), Some(&Position::new(1, 1)));
/// assert_eq!(path.last(), Some(&Position::new(8, 1)));
/// ```
pub fn find_path(
    map: &GameMap,
    start: Position,
    goal: Position,
    movement: &MovementConfig,
) -> DelveResult<Vec<Position>> {
    if !map.in_bounds(start) {
        return Err(DelveError::OutOfBounds {
            x: start.x,
            y: start.y,
        });
    }
    if !map.in_bounds(goal) {
        return Err(DelveError::OutOfBounds {
            x: goal.x,
            y: goal.y,
        });
    }
    if start == goal {
        return Ok(vec![start]);
    }
    if !map.is_walkable(goal) {
        return Ok(Vec::new());
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, f64> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();

    let h = movement.heuristic(start, goal);
    g_score.insert(start, 0.0);
    open_set.push(PathNode {
        position: start,
        f_score: h,
        h_score: h,
    });

    while let Some(node) = open_set.pop() {
        let current = node.position;
        if !closed.insert(current) {
            continue;
        }

        if current == goal {
            return Ok(reconstruct_path(&came_from, start, goal));
        }

        let current_g = g_score[&current];
        for neighbor in movement.neighbors(current) {
            if closed.contains(&neighbor) || !map.is_walkable(neighbor) {
                continue;
            }
            // Paths reflect current occupancy, not just static terrain. The
            // goal tile is exempt so entities can path to each other.
            if neighbor != goal && map.occupant_at(neighbor).is_some() {
                continue;
            }

            let tentative = current_g + movement.step_cost(current, neighbor);
            if tentative < *g_score.get(&neighbor).unwrap_or(&f64::INFINITY) {
                came_from.insert(neighbor, current);
                g_score.insert(neighbor, tentative);
                let h = movement.heuristic(neighbor, goal);
                open_set.push(PathNode {
                    position: neighbor,
                    f_score: tentative + h,
                    h_score: h,
                });
            }
        }
    }

    // Open set exhausted without reaching the goal
    Ok(Vec::new())
}

fn reconstruct_path(
    came_from: &HashMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        current = came_from[&current];
        path.push(current);
    }
    path.reverse();
    path
}
