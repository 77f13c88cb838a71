//! # Dungeon Generation
//!
//! The generation orchestrator. Runs the phases in their required order —
//! BSP partition, room carving, cave carving, corridor connection, stairs and
//! doors, connectivity validation, population — retrying with a derived seed
//! when validation fails and falling back to a minimal guaranteed-valid floor
//! when retries exhaust.

use crate::generation::{
    carve_caves, connect_bsp, connect_caves, utils, BspTree, GenerationConfig, Generator,
    Populator, Rect, Room, RoomType,
};
use crate::world::{GameMap, Position, TileType};
use crate::{DelveError, DelveResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// Primary dungeon generator: BSP rooms, cellular caves, guaranteed-connected
/// corridors, then population.
///
/// # Examples
///
/// ```
/// use delve::{DungeonGenerator, GenerationConfig, Generator};
///
/// let config = GenerationConfig::for_testing(42);
/// let map = DungeonGenerator::new().generate(&config).unwrap();
/// assert!(map.is_fully_connected());
/// assert!(!map.rooms.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DungeonGenerator;

impl DungeonGenerator {
    /// Creates a new dungeon generator.
    pub fn new() -> Self {
        Self
    }

    /// Builds one candidate floor. Connectivity is checked by the caller.
    fn build_floor(&self, config: &GenerationConfig, rng: &mut StdRng) -> DelveResult<GameMap> {
        let mut map = GameMap::new(config.width, config.height, config.seed);

        // Keep the outermost ring solid rock.
        let region = Rect::new(1, 1, config.width - 2, config.height - 2);
        let tree = BspTree::partition(region, config, rng);
        debug!("partitioned into {} leaves", tree.leaves().len());

        let leaf_rooms = self.carve_rooms(&mut map, &tree, config, rng)?;
        let caves = carve_caves(&mut map, config, rng)?;

        connect_bsp(&mut map, &tree, &leaf_rooms, rng)?;
        connect_caves(&mut map, &caves, rng)?;

        self.place_stairs(&mut map)?;
        self.add_doors(&mut map, config, rng)?;
        Ok(map)
    }

    /// Carves one room per BSP leaf and registers it on the map, returning
    /// the leaf-to-room mapping the corridor connector walks.
    ///
    /// Dimensions are clamped to the leaf extent minus a 1-tile margin on
    /// each side before placement, so a room can never escape its leaf.
    fn carve_rooms(
        &self,
        map: &mut GameMap,
        tree: &BspTree,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<HashMap<usize, u32>> {
        let mut leaf_rooms = HashMap::new();

        for leaf in tree.leaves() {
            let region = tree.nodes()[leaf].region;
            let max_w = config.max_room_size.min(region.width.saturating_sub(2));
            let max_h = config.max_room_size.min(region.height.saturating_sub(2));
            if max_w < config.min_room_size || max_h < config.min_room_size {
                continue;
            }

            let width = rng.gen_range(config.min_room_size..=max_w);
            let height = rng.gen_range(config.min_room_size..=max_h);
            let x = region.x + 1 + rng.gen_range(0..=region.width - 2 - width) as i32;
            let y = region.y + 1 + rng.gen_range(0..=region.height - 2 - height) as i32;

            let id = map.rooms.len() as u32;
            let room_type = self.determine_room_type(id, rng);
            map.carve_room(Room::new(id, Position::new(x, y), width, height, room_type))?;
            leaf_rooms.insert(leaf, id);
        }

        if map.rooms.is_empty() {
            return Err(DelveError::GenerationFailed(
                "no BSP leaf could hold a room".to_string(),
            ));
        }
        debug!("carved {} rooms", map.rooms.len());
        Ok(leaf_rooms)
    }

    /// Determines the type of room to create. The first room is always a
    /// plain chamber: the player spawns there.
    fn determine_room_type(&self, room_id: u32, rng: &mut StdRng) -> RoomType {
        if room_id == 0 {
            return RoomType::Chamber;
        }
        let roll = rng.gen::<f64>();
        if roll < 0.06 {
            RoomType::Shrine
        } else if roll < 0.12 {
            RoomType::Crypt
        } else if roll < 0.17 {
            RoomType::Spring
        } else if roll < 0.30 {
            RoomType::Den
        } else {
            RoomType::Chamber
        }
    }

    /// Stairs up (and the player spawn) at the first room's center, stairs
    /// down at the last room's center.
    fn place_stairs(&self, map: &mut GameMap) -> DelveResult<()> {
        let first = map.rooms.first().map(|r| r.center());
        let last = map.rooms.last().map(|r| r.center());

        if let Some(pos) = first {
            map.set_tile_type(pos, TileType::StairsUp)?;
            map.stairs_up = Some(pos);
            map.player_spawn = pos;
        }
        if map.rooms.len() > 1 {
            if let Some(pos) = last {
                map.set_tile_type(pos, TileType::StairsDown)?;
                map.stairs_down = Some(pos);
            }
        }
        Ok(())
    }

    /// Turns some corridor mouths into open doors. A mouth is a corridor
    /// tile in the wall ring just outside a room's rectangle. Doors are
    /// carved open so the connectivity guarantee is unaffected.
    fn add_doors(
        &self,
        map: &mut GameMap,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<()> {
        if config.door_chance <= 0.0 {
            return Ok(());
        }
        for index in 0..map.rooms.len() {
            let room = map.rooms[index].clone();
            for pos in room_ring(&room) {
                if map.get_tile(pos).map(|t| t.tile_type()) == Some(TileType::Corridor)
                    && rng.gen_bool(config.door_chance)
                {
                    map.set_tile_type(pos, TileType::Door { open: true })?;
                }
            }
        }
        Ok(())
    }

    /// The minimal guaranteed-valid floor: one centered room, stairs up, no
    /// corridors. Used only when every generation attempt failed validation.
    fn fallback_floor(&self, config: &GenerationConfig) -> DelveResult<GameMap> {
        let mut map = GameMap::new(config.width, config.height, config.seed);
        let width = config.min_room_size;
        let height = config.min_room_size;
        let origin = Position::new(
            (config.width - width) as i32 / 2,
            (config.height - height) as i32 / 2,
        );
        map.carve_room(Room::new(0, origin, width, height, RoomType::Chamber))?;
        self.place_stairs(&mut map)?;
        Ok(map)
    }
}

/// The ring of positions immediately outside a room's rectangle.
fn room_ring(room: &Room) -> Vec<Position> {
    let (x0, y0) = (room.origin.x - 1, room.origin.y - 1);
    let (x1, y1) = (
        room.origin.x + room.width as i32,
        room.origin.y + room.height as i32,
    );
    let mut ring = Vec::new();
    for x in x0..=x1 {
        ring.push(Position::new(x, y0));
        ring.push(Position::new(x, y1));
    }
    for y in (y0 + 1)..y1 {
        ring.push(Position::new(x0, y));
        ring.push(Position::new(x1, y));
    }
    ring
}

impl Generator<GameMap> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig) -> DelveResult<GameMap> {
        config.validate()?;

        for attempt in 0..=config.max_retries {
            let mut rng = utils::create_attempt_rng(config, attempt);
            let mut map = self.build_floor(config, &mut rng)?;

            if map.is_fully_connected() {
                Populator::new().populate(&mut map, config, &mut rng)?;
                info!(
                    "generated {}x{} floor: {} rooms, {} connections, {} walkable tiles (attempt {})",
                    map.width,
                    map.height,
                    map.rooms.len(),
                    map.connections.len(),
                    map.walkable_count(),
                    attempt
                );
                return Ok(map);
            }
            warn!(
                "generation attempt {} left unreachable walkable tiles, retrying",
                attempt
            );
        }

        warn!(
            "connectivity validation failed {} times, falling back to minimal floor",
            config.max_retries + 1
        );
        self.fallback_floor(config)
    }

    fn validate(&self, map: &GameMap, _config: &GenerationConfig) -> DelveResult<()> {
        if map.walkable_count() == 0 {
            return Err(DelveError::GenerationFailed(
                "map has no walkable tiles".to_string(),
            ));
        }
        if !map.is_fully_connected() {
            return Err(DelveError::GenerationFailed(
                "map has unreachable walkable pockets".to_string(),
            ));
        }
        for room in &map.rooms {
            for pos in room.all_positions() {
                if map.get_tile(pos).map(|t| t.tile_type()) == Some(TileType::Wall) {
                    return Err(DelveError::GenerationFailed(format!(
                        "room {} is registered but not carved at ({}, {})",
                        room.id, pos.x, pos.y
                    )));
                }
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}
