//! # Field of View
//!
//! Recursive shadow casting over 8 octants. Produces the set of tiles visible
//! from an observer's position within a radius, and feeds the map's monotonic
//! explored set for fog-of-war rendering.

use crate::world::{GameMap, Position};
use crate::{DelveError, DelveResult};
use std::collections::HashSet;

/// Field-of-view query configuration.
///
/// The visible area is circular: the radius test uses squared Euclidean
/// distance, not Manhattan. Walls block visibility beyond themselves but are
/// themselves visible. The origin tile is always included.
///
/// # Examples
///
/// ```
/// use delve::{FieldOfView, GameMap, Position, Tile};
///
/// let mut map = GameMap::new(11, 11, 0);
/// for y in 1..10 {
///     for x in 1..10 {
///         map.set_tile(Position::new(x, y), Tile::floor()).unwrap();
///     }
/// }
///
/// let origin = Position::new(5, 5);
/// let visible = FieldOfView::new(4).compute(&mut map, origin).unwrap();
/// assert!(visible.contains(&origin));
/// ```
#[derive(Debug, Clone)]
pub struct FieldOfView {
    radius: i32,
    entities_block_sight: bool,
}

/// Octant coordinate transforms: (col, row) in scan space to (dx, dy) in map
/// space, one entry per octant.
const OCTANTS: [(i32, i32, i32, i32); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

impl FieldOfView {
    /// Creates a query for the given sight radius.
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            entities_block_sight: false,
        }
    }

    /// Whether entities standing on tiles block sightlines, as walls do.
    /// Defaults to `false`: enemies are transparent and only terrain occludes.
    pub fn entities_block_sight(mut self, block: bool) -> Self {
        self.entities_block_sight = block;
        self
    }

    /// Computes the set of tiles visible from `origin`.
    ///
    /// Every visible tile is also marked in the map's explored set. An
    /// out-of-bounds origin is a caller contract violation and returns an
    /// error rather than an empty set.
    pub fn compute(&self, map: &mut GameMap, origin: Position) -> DelveResult<HashSet<Position>> {
        if !map.in_bounds(origin) {
            return Err(DelveError::OutOfBounds {
                x: origin.x,
                y: origin.y,
            });
        }

        let mut visible = HashSet::new();
        visible.insert(origin);
        map.mark_explored(origin);

        for octant in 0..8 {
            self.cast_light(map, &mut visible, origin, 1, 1.0, 0.0, octant);
        }

        Ok(visible)
    }

    /// Scans one octant outward row by row, narrowing the visible slope
    /// window as opaque tiles are encountered.
    #[allow(clippy::too_many_arguments)]
    fn cast_light(
        &self,
        map: &mut GameMap,
        visible: &mut HashSet<Position>,
        origin: Position,
        row: i32,
        mut start_slope: f64,
        end_slope: f64,
        octant: usize,
    ) {
        if start_slope < end_slope {
            return;
        }

        let radius_sq = (self.radius as i64) * (self.radius as i64);
        let mut next_start_slope = start_slope;

        for j in row..=self.radius {
            let mut blocked = false;
            let dy = -j;

            for dx in -j..=0 {
                let pos = transform(origin, dx, dy, octant);

                let left_slope = (dx as f64 - 0.5) / (dy as f64 + 0.5);
                let right_slope = (dx as f64 + 0.5) / (dy as f64 - 0.5);

                if start_slope < right_slope {
                    continue;
                }
                if end_slope > left_slope {
                    break;
                }

                let distance_sq = (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64);
                if distance_sq <= radius_sq && map.in_bounds(pos) {
                    visible.insert(pos);
                    map.mark_explored(pos);
                }

                let opaque = self.blocks_sight(map, pos);
                if blocked {
                    if opaque {
                        next_start_slope = right_slope;
                    } else {
                        blocked = false;
                        start_slope = next_start_slope;
                    }
                } else if opaque && j < self.radius {
                    blocked = true;
                    self.cast_light(map, visible, origin, j + 1, start_slope, left_slope, octant);
                    next_start_slope = right_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }

    fn blocks_sight(&self, map: &GameMap, pos: Position) -> bool {
        if map.is_opaque(pos) {
            return true;
        }
        self.entities_block_sight && map.occupant_at(pos).is_some()
    }
}

/// Transforms scan-space (col, row) offsets into a map position for an octant.
fn transform(origin: Position, col: i32, row: i32, octant: usize) -> Position {
    let (xx, xy, yx, yy) = OCTANTS[octant];
    Position::new(
        origin.x + col * xx + row * xy,
        origin.y + col * yx + row * yy,
    )
}

/// Convenience wrapper matching the renderer-facing query interface.
pub fn compute_fov(
    map: &mut GameMap,
    origin: Position,
    radius: i32,
) -> DelveResult<HashSet<Position>> {
    FieldOfView::new(radius).compute(map, origin)
}
