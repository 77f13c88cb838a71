//! # Map Model
//!
//! The grid of tiles plus the room and connection bookkeeping layered over it.
//! The map exclusively owns every tile; rooms and connections are metadata
//! views over regions of the grid.

use crate::generation::{Connection, Room};
use crate::world::{EntityId, Position, Tile, TileType};
use crate::{DelveError, DelveResult};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// The game map for a single dungeon floor.
///
/// Built by the generation pipeline, then treated as read-mostly by the game
/// loop: pathfinding and FOV only read terrain, per-turn entity movement
/// writes tile occupancy, and the `explored` set only ever grows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMap {
    /// Grid width in tiles, fixed at construction.
    pub width: u32,
    /// Grid height in tiles, fixed at construction.
    pub height: u32,
    /// Row-major tile grid: `tiles[y][x]`.
    pub tiles: Vec<Vec<Tile>>,
    /// Rooms carved into the grid, in carve order.
    pub rooms: Vec<Room>,
    /// Region links recorded by the corridor connector.
    pub connections: Vec<Connection>,
    /// Where the player enters this floor.
    pub player_spawn: Position,
    /// Stairs back up, if placed.
    pub stairs_up: Option<Position>,
    /// Stairs down to the next floor, if placed.
    pub stairs_down: Option<Position>,
    /// Seed this floor was generated from, kept for regeneration on reload.
    pub seed: u64,
    // Tiles the player has ever seen. Monotonic: only mark_explored writes it.
    explored: HashSet<Position>,
}

impl GameMap {
    /// Creates a map of the given dimensions filled with wall tiles.
    pub fn new(width: u32, height: u32, seed: u64) -> Self {
        let tiles = (0..height)
            .map(|_| (0..width).map(|_| Tile::wall()).collect())
            .collect();
        Self {
            width,
            height,
            tiles,
            rooms: Vec::new(),
            connections: Vec::new(),
            player_spawn: Position::origin(),
            stairs_up: None,
            stairs_down: None,
            seed,
            explored: HashSet::new(),
        }
    }

    /// Checks whether a position lies inside the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Gets the tile at a position, or `None` if out of bounds.
    pub fn get_tile(&self, pos: Position) -> Option<&Tile> {
        if self.in_bounds(pos) {
            Some(&self.tiles[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// Gets a mutable tile reference, or `None` if out of bounds.
    pub fn get_tile_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if self.in_bounds(pos) {
            Some(&mut self.tiles[pos.y as usize][pos.x as usize])
        } else {
            None
        }
    }

    /// Replaces the tile at a position. Out-of-bounds writes are an error,
    /// never silently dropped.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) -> DelveResult<()> {
        if !self.in_bounds(pos) {
            return Err(DelveError::OutOfBounds { x: pos.x, y: pos.y });
        }
        self.tiles[pos.y as usize][pos.x as usize] = tile;
        Ok(())
    }

    /// Changes the terrain type at a position, preserving tile contents.
    pub fn set_tile_type(&mut self, pos: Position, tile_type: TileType) -> DelveResult<()> {
        self.get_tile_mut(pos)
            .ok_or(DelveError::OutOfBounds { x: pos.x, y: pos.y })?
            .set_type(tile_type);
        Ok(())
    }

    /// Whether an entity can stand at this position. Out of bounds is not
    /// walkable.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.get_tile(pos).map(|t| t.is_walkable()).unwrap_or(false)
    }

    /// Whether this position blocks line of sight. Out of bounds is opaque.
    pub fn is_opaque(&self, pos: Position) -> bool {
        self.get_tile(pos).map(|t| t.is_opaque()).unwrap_or(true)
    }

    /// Marks a tile as having been seen. The explored set only grows.
    pub fn mark_explored(&mut self, pos: Position) {
        if self.in_bounds(pos) {
            self.explored.insert(pos);
        }
    }

    /// Whether the tile has ever been visible.
    pub fn is_explored(&self, pos: Position) -> bool {
        self.explored.contains(&pos)
    }

    /// All tiles the player has ever seen, for fog-of-war rendering.
    pub fn explored(&self) -> &HashSet<Position> {
        &self.explored
    }

    /// Carves a room's rectangle into the grid as floor and registers it in
    /// the room list as a single step.
    ///
    /// Carving and registration are deliberately one operation: a room that
    /// exists in the grid but not in `rooms` (or vice versa) is invisible to
    /// the corridor connector and the populator.
    pub fn carve_room(&mut self, room: Room) -> DelveResult<()> {
        let far = Position::new(
            room.origin.x + room.width as i32 - 1,
            room.origin.y + room.height as i32 - 1,
        );
        if !self.in_bounds(room.origin) || !self.in_bounds(far) {
            return Err(DelveError::GenerationFailed(format!(
                "room {} extends outside the map bounds",
                room.id
            )));
        }
        for pos in room.all_positions() {
            self.set_tile(pos, Tile::floor())?;
        }
        self.rooms.push(room);
        Ok(())
    }

    /// Records a region link established by the corridor connector.
    pub fn add_connection(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    /// The entity occupying a tile, if any.
    pub fn occupant_at(&self, pos: Position) -> Option<EntityId> {
        self.get_tile(pos).and_then(|t| t.occupant)
    }

    /// Places an entity on a tile. The tile must be walkable and empty.
    pub fn set_occupant(&mut self, pos: Position, entity: EntityId) -> DelveResult<()> {
        let tile = self
            .get_tile_mut(pos)
            .ok_or(DelveError::OutOfBounds { x: pos.x, y: pos.y })?;
        if !tile.is_walkable() {
            return Err(DelveError::InvalidState(format!(
                "cannot place entity on non-walkable tile ({}, {})",
                pos.x, pos.y
            )));
        }
        if tile.occupant.is_some() {
            return Err(DelveError::InvalidState(format!(
                "tile ({}, {}) is already occupied",
                pos.x, pos.y
            )));
        }
        tile.occupant = Some(entity);
        Ok(())
    }

    /// Removes the occupant from a tile, returning it.
    pub fn clear_occupant(&mut self, pos: Position) -> Option<EntityId> {
        self.get_tile_mut(pos).and_then(|t| t.occupant.take())
    }

    /// Finds a random walkable tile by bounded rejection sampling.
    pub fn find_random_floor_tile(&self, rng: &mut StdRng) -> Option<Position> {
        for _ in 0..1000 {
            let pos = Position::new(
                rng.gen_range(0..self.width as i32),
                rng.gen_range(0..self.height as i32),
            );
            if self.is_walkable(pos) {
                return Some(pos);
            }
        }
        None
    }

    /// Counts walkable tiles on the map.
    pub fn walkable_count(&self) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|t| t.is_walkable())
            .count()
    }

    /// Connected components of the walkable grid, each as a list of positions.
    pub fn walkable_regions(&self) -> Vec<Vec<Position>> {
        connected_regions(self.width, self.height, |pos| self.is_walkable(pos))
    }

    /// The primary correctness property of a finished map: every walkable
    /// tile reachable from every other (at most one walkable component).
    pub fn is_fully_connected(&self) -> bool {
        self.walkable_regions().len() <= 1
    }
}

/// Connected-component labeling over an arbitrary passability predicate.
///
/// Breadth-first flood fill with 4-connected adjacency, shared by cave speck
/// pruning, connectivity validation, and the test suite. Returns one position
/// list per component; order within a component is BFS discovery order from
/// the lowest-index unvisited cell.
pub fn connected_regions<F>(width: u32, height: u32, passable: F) -> Vec<Vec<Position>>
where
    F: Fn(Position) -> bool,
{
    let mut visited = HashSet::new();
    let mut regions = Vec::new();

    for y in 0..height as i32 {
        for x in 0..width as i32 {
            let start = Position::new(x, y);
            if visited.contains(&start) || !passable(start) {
                continue;
            }

            let mut region = Vec::new();
            let mut queue = VecDeque::new();
            visited.insert(start);
            queue.push_back(start);

            while let Some(pos) = queue.pop_front() {
                region.push(pos);
                for next in pos.cardinal_adjacent_positions() {
                    if next.x < 0
                        || next.y < 0
                        || next.x >= width as i32
                        || next.y >= height as i32
                    {
                        continue;
                    }
                    if !visited.contains(&next) && passable(next) {
                        visited.insert(next);
                        queue.push_back(next);
                    }
                }
            }
            regions.push(region);
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::{Room, RoomType};
    use crate::world::new_entity_id;
    use rand::SeedableRng;

    fn open_map(width: u32, height: u32) -> GameMap {
        let mut map = GameMap::new(width, height, 0);
        for y in 1..height as i32 - 1 {
            for x in 1..width as i32 - 1 {
                map.set_tile(Position::new(x, y), Tile::floor()).unwrap();
            }
        }
        map
    }

    #[test]
    fn test_new_map_is_all_wall() {
        let map = GameMap::new(10, 8, 0);
        assert_eq!(map.walkable_count(), 0);
        assert!(map.is_opaque(Position::new(5, 5)));
    }

    #[test]
    fn test_out_of_bounds_queries() {
        let map = GameMap::new(10, 8, 0);
        assert!(map.get_tile(Position::new(-1, 0)).is_none());
        assert!(map.get_tile(Position::new(10, 0)).is_none());
        assert!(!map.is_walkable(Position::new(0, 8)));
        assert!(map.is_opaque(Position::new(0, -1)));
    }

    #[test]
    fn test_set_tile_out_of_bounds_is_error() {
        let mut map = GameMap::new(10, 8, 0);
        let result = map.set_tile(Position::new(10, 0), Tile::floor());
        assert!(matches!(result, Err(DelveError::OutOfBounds { .. })));
    }

    #[test]
    fn test_carve_room_registers_and_carves_atomically() {
        let mut map = GameMap::new(20, 20, 0);
        let room = Room::new(0, Position::new(3, 3), 5, 4, RoomType::Chamber);
        map.carve_room(room).unwrap();

        assert_eq!(map.rooms.len(), 1);
        for pos in map.rooms[0].all_positions() {
            assert!(map.is_walkable(pos));
        }
        // Surrounding wall untouched
        assert!(!map.is_walkable(Position::new(2, 3)));
        assert!(!map.is_walkable(Position::new(8, 3)));
    }

    #[test]
    fn test_carve_room_out_of_bounds_is_error_and_registers_nothing() {
        let mut map = GameMap::new(10, 10, 0);
        let room = Room::new(0, Position::new(7, 7), 5, 5, RoomType::Chamber);
        assert!(map.carve_room(room).is_err());
        assert!(map.rooms.is_empty());
    }

    #[test]
    fn test_explored_set_is_monotonic() {
        let mut map = open_map(10, 10);
        let pos = Position::new(4, 4);
        assert!(!map.is_explored(pos));
        map.mark_explored(pos);
        assert!(map.is_explored(pos));
        map.mark_explored(pos);
        assert_eq!(map.explored().len(), 1);
        // Out-of-bounds marks are ignored
        map.mark_explored(Position::new(-1, -1));
        assert_eq!(map.explored().len(), 1);
    }

    #[test]
    fn test_occupancy() {
        let mut map = open_map(10, 10);
        let pos = Position::new(3, 3);
        let id = new_entity_id();

        assert!(map.occupant_at(pos).is_none());
        map.set_occupant(pos, id).unwrap();
        assert_eq!(map.occupant_at(pos), Some(id));

        // Double placement and placement on walls are rejected
        assert!(map.set_occupant(pos, new_entity_id()).is_err());
        assert!(map.set_occupant(Position::new(0, 0), id).is_err());

        assert_eq!(map.clear_occupant(pos), Some(id));
        assert!(map.occupant_at(pos).is_none());
    }

    #[test]
    fn test_find_random_floor_tile() {
        let map = open_map(10, 10);
        let mut rng = StdRng::seed_from_u64(7);
        let pos = map.find_random_floor_tile(&mut rng).unwrap();
        assert!(map.is_walkable(pos));

        let walls = GameMap::new(10, 10, 0);
        assert!(walls.find_random_floor_tile(&mut rng).is_none());
    }

    #[test]
    fn test_connected_regions_finds_separate_pockets() {
        let mut map = GameMap::new(12, 6, 0);
        for x in 1..4 {
            map.set_tile(Position::new(x, 2), Tile::floor()).unwrap();
        }
        for x in 7..10 {
            map.set_tile(Position::new(x, 2), Tile::floor()).unwrap();
        }

        let regions = map.walkable_regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].len(), 3);
        assert!(!map.is_fully_connected());

        // Bridge the gap and the map becomes one component
        for x in 4..7 {
            map.set_tile(Position::new(x, 2), Tile::floor()).unwrap();
        }
        assert!(map.is_fully_connected());
    }

    #[test]
    fn test_connected_regions_diagonal_is_not_adjacent() {
        // Two floor tiles touching only at a corner are separate regions.
        let mut map = GameMap::new(6, 6, 0);
        map.set_tile(Position::new(2, 2), Tile::floor()).unwrap();
        map.set_tile(Position::new(3, 3), Tile::floor()).unwrap();
        assert_eq!(map.walkable_regions().len(), 2);
    }

    #[test]
    fn test_map_serialization_round_trip() {
        let mut map = open_map(8, 8);
        map.mark_explored(Position::new(2, 2));
        let json = serde_json::to_string(&map).unwrap();
        let back: GameMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back.width, map.width);
        assert_eq!(back.tiles, map.tiles);
        assert!(back.is_explored(Position::new(2, 2)));
    }
}
