//! # Populator
//!
//! Assigns enemy spawns, item placements, and special features to the rooms
//! of a finished, connected map. Corridors and the player's entry room are
//! never populated, and no two spawns ever claim the same tile.

use crate::generation::{GenerationConfig, RoomType};
use crate::world::{GameMap, Position, TileType};
use crate::DelveResult;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Enemy varieties the entity collaborator can materialize, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Rat,
    Goblin,
    Skeleton,
    Orc,
    Wraith,
}

impl EnemyKind {
    /// Draws an enemy kind; higher difficulty shifts the roll toward the
    /// dangerous end of the table.
    fn pick(rng: &mut StdRng, difficulty: f64) -> Self {
        let roll = rng.gen::<f64>() + difficulty * 0.15;
        if roll < 0.35 {
            EnemyKind::Rat
        } else if roll < 0.65 {
            EnemyKind::Goblin
        } else if roll < 0.85 {
            EnemyKind::Skeleton
        } else if roll < 1.05 {
            EnemyKind::Orc
        } else {
            EnemyKind::Wraith
        }
    }
}

/// An enemy spawn assigned to a room, consumed by entity instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub kind: EnemyKind,
    pub position: Position,
}

/// An item placed on a room tile, consumed by entity instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub item_id: String,
    pub position: Position,
}

/// Special features placed by room-type lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Altar,
    Statue,
    Fountain,
}

impl FeatureKind {
    /// The feature a room type receives, if any.
    pub fn for_room_type(room_type: RoomType) -> Option<Self> {
        match room_type {
            RoomType::Shrine => Some(FeatureKind::Altar),
            RoomType::Crypt => Some(FeatureKind::Statue),
            RoomType::Spring => Some(FeatureKind::Fountain),
            RoomType::Chamber | RoomType::Den => None,
        }
    }

    /// The terrain this feature carves into the room.
    pub fn tile_type(self) -> TileType {
        match self {
            FeatureKind::Altar => TileType::Altar,
            FeatureKind::Statue => TileType::Statue,
            FeatureKind::Fountain => TileType::Fountain,
        }
    }
}

const ITEM_TABLE: &[&str] = &[
    "potion_minor_healing",
    "scroll_warding",
    "coin_pouch",
    "torch",
    "ration",
    "dagger_rusty",
];

/// Populates rooms with enemies, items, and features.
#[derive(Debug, Clone, Default)]
pub struct Populator;

impl Populator {
    pub fn new() -> Self {
        Self
    }

    /// Assigns spawns and placements to every room except the one holding
    /// the player's entry point.
    ///
    /// Spawn counts scale with room floor area and the configured densities
    /// (per 100 tiles). Placement lands only on walkable, unoccupied tiles no
    /// other spawn has claimed.
    pub fn populate(
        &self,
        map: &mut GameMap,
        config: &GenerationConfig,
        rng: &mut StdRng,
    ) -> DelveResult<()> {
        let mut claimed: HashSet<Position> = HashSet::new();
        claimed.insert(map.player_spawn);
        if let Some(pos) = map.stairs_up {
            claimed.insert(pos);
        }
        if let Some(pos) = map.stairs_down {
            claimed.insert(pos);
        }

        for index in 0..map.rooms.len() {
            let room = map.rooms[index].clone();
            if room.contains(map.player_spawn) {
                continue;
            }

            if let Some(feature) = FeatureKind::for_room_type(room.room_type) {
                if let Some(pos) = feature_position(map, &room, &claimed) {
                    map.set_tile_type(pos, feature.tile_type())?;
                    claimed.insert(pos);
                    map.rooms[index].features.push(feature);
                }
            }

            let area = room.area() as f64;
            let mut enemy_count = (area * config.monster_density / 100.0).round() as usize;
            if room.room_type == RoomType::Den {
                enemy_count += 1;
            }
            for _ in 0..enemy_count {
                if let Some(position) = free_tile_in(map, &room, &claimed, rng) {
                    claimed.insert(position);
                    let kind = EnemyKind::pick(rng, config.difficulty);
                    map.rooms[index].spawns.push(EnemySpawn { kind, position });
                }
            }

            let item_count = (area * config.item_density / 100.0).round() as usize;
            for _ in 0..item_count {
                if let Some(position) = free_tile_in(map, &room, &claimed, rng) {
                    claimed.insert(position);
                    let item_id = ITEM_TABLE[rng.gen_range(0..ITEM_TABLE.len())].to_string();
                    if let Some(tile) = map.get_tile_mut(position) {
                        tile.items.push(item_id.clone());
                    }
                    map.rooms[index]
                        .item_placements
                        .push(ItemPlacement { item_id, position });
                }
            }
        }

        let spawns: usize = map.rooms.iter().map(|r| r.spawns.len()).sum();
        let items: usize = map.rooms.iter().map(|r| r.item_placements.len()).sum();
        debug!("populated {} enemy spawns and {} item placements", spawns, items);
        Ok(())
    }
}

/// A random walkable, unclaimed, unoccupied tile inside the room, found by
/// bounded rejection sampling.
fn free_tile_in(
    map: &GameMap,
    room: &crate::generation::Room,
    claimed: &HashSet<Position>,
    rng: &mut StdRng,
) -> Option<Position> {
    for _ in 0..50 {
        let pos = Position::new(
            room.origin.x + rng.gen_range(0..room.width as i32),
            room.origin.y + rng.gen_range(0..room.height as i32),
        );
        if map.is_walkable(pos) && !claimed.contains(&pos) && map.occupant_at(pos).is_none() {
            return Some(pos);
        }
    }
    None
}

/// Where a feature tile may go: strictly interior floor, so a blocking
/// statue can never pinch off a corridor mouth on the room's perimeter.
fn feature_position(
    map: &GameMap,
    room: &crate::generation::Room,
    claimed: &HashSet<Position>,
) -> Option<Position> {
    if room.width < 3 || room.height < 3 {
        return None;
    }
    let center = room.center();
    let candidates = std::iter::once(center).chain(center.cardinal_adjacent_positions());
    for pos in candidates {
        let interior = pos.x > room.origin.x
            && pos.y > room.origin.y
            && pos.x < room.origin.x + room.width as i32 - 1
            && pos.y < room.origin.y + room.height as i32 - 1;
        if interior
            && !claimed.contains(&pos)
            && map.get_tile(pos).map(|t| t.tile_type()) == Some(TileType::Floor)
        {
            return Some(pos);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::generation::Room;

    fn populated_map(config: &GenerationConfig) -> GameMap {
        let mut map = GameMap::new(40, 20, config.seed);
        map.carve_room(Room::new(0, Position::new(2, 2), 6, 6, RoomType::Chamber))
            .unwrap();
        map.carve_room(Room::new(1, Position::new(12, 2), 8, 8, RoomType::Shrine))
            .unwrap();
        map.carve_room(Room::new(2, Position::new(25, 4), 9, 9, RoomType::Den))
            .unwrap();
        map.player_spawn = map.rooms[0].center();

        let mut rng = create_rng(config);
        Populator::new()
            .populate(&mut map, config, &mut rng)
            .unwrap();
        map
    }

    fn dense_config(seed: u64) -> GenerationConfig {
        let mut config = GenerationConfig::new(seed);
        config.monster_density = 8.0;
        config.item_density = 6.0;
        config
    }

    #[test]
    fn test_spawn_room_is_never_populated() {
        let map = populated_map(&dense_config(5));
        assert!(map.rooms[0].spawns.is_empty());
        assert!(map.rooms[0].item_placements.is_empty());
        assert!(map.rooms[0].features.is_empty());
    }

    #[test]
    fn test_spawns_land_inside_their_room_on_walkable_tiles() {
        let map = populated_map(&dense_config(6));
        for room in &map.rooms {
            for spawn in &room.spawns {
                assert!(room.contains(spawn.position));
                assert!(map.is_walkable(spawn.position));
            }
            for item in &room.item_placements {
                assert!(room.contains(item.position));
                assert!(map.is_walkable(item.position));
            }
        }
    }

    #[test]
    fn test_no_two_spawns_share_a_tile() {
        let map = populated_map(&dense_config(7));
        let mut seen = HashSet::new();
        for room in &map.rooms {
            for spawn in &room.spawns {
                assert!(seen.insert(spawn.position), "{:?} claimed twice", spawn.position);
            }
            for item in &room.item_placements {
                assert!(seen.insert(item.position), "{:?} claimed twice", item.position);
            }
        }
        assert!(!seen.contains(&map.player_spawn));
    }

    #[test]
    fn test_features_follow_room_type() {
        let map = populated_map(&dense_config(8));
        assert_eq!(map.rooms[1].features, vec![FeatureKind::Altar]);
        // The altar tile was actually carved into the shrine.
        let altars = map.rooms[1]
            .all_positions()
            .into_iter()
            .filter(|&p| map.get_tile(p).unwrap().tile_type() == TileType::Altar)
            .count();
        assert_eq!(altars, 1);
        // Dens get extra enemies, not furniture.
        assert!(map.rooms[2].features.is_empty());
        assert!(!map.rooms[2].spawns.is_empty());
    }

    #[test]
    fn test_item_placements_are_mirrored_on_tiles() {
        let map = populated_map(&dense_config(9));
        for room in &map.rooms {
            for item in &room.item_placements {
                let tile = map.get_tile(item.position).unwrap();
                assert!(tile.items.contains(&item.item_id));
            }
        }
    }

    #[test]
    fn test_density_scales_spawn_counts() {
        let sparse = {
            let mut c = GenerationConfig::new(10);
            c.monster_density = 1.0;
            c
        };
        let dense = {
            let mut c = GenerationConfig::new(10);
            c.monster_density = 10.0;
            c
        };
        let count = |map: &GameMap| -> usize { map.rooms.iter().map(|r| r.spawns.len()).sum() };
        assert!(count(&populated_map(&dense)) > count(&populated_map(&sparse)));
    }

    #[test]
    fn test_zero_density_spawns_nothing() {
        let mut config = GenerationConfig::new(11);
        config.monster_density = 0.0;
        config.item_density = 0.0;
        let map = populated_map(&config);
        for room in &map.rooms {
            assert!(room.spawns.is_empty());
            assert!(room.item_placements.is_empty());
        }
    }
}
