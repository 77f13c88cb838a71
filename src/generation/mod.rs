//! # Generation Module
//!
//! Procedural dungeon generation: BSP room layout, cellular-automata caves,
//! corridor connection with a guaranteed-connectivity contract, and room
//! population.
//!
//! Phases run strictly in order — partition, carve, caves, corridors,
//! validation, population — against a single map mutated in place. Every
//! phase draws from one seeded RNG threaded through explicitly, so a seed and
//! a configuration always reproduce the same floor.

pub mod bsp;
pub mod cave;
pub mod corridors;
pub mod dungeon;
pub mod populate;

pub use bsp::*;
pub use cave::*;
pub use corridors::*;
pub use dungeon::*;
pub use populate::*;

use crate::world::Position;
use crate::{DelveError, DelveResult};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
///
/// Validated up front by [`GenerationConfig::validate`]; a bad configuration
/// is rejected before any generation work begins rather than discovered
/// mid-pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Grid width in tiles
    pub width: u32,
    /// Grid height in tiles
    pub height: u32,
    /// Minimum room extent (both axes)
    pub min_room_size: u32,
    /// Maximum room extent (both axes)
    pub max_room_size: u32,
    /// Maximum BSP recursion depth
    pub max_depth: u32,
    /// Target cave floor area as a fraction of room floor area (0.0 disables
    /// caves entirely)
    pub cave_ratio: f64,
    /// Probability that a noise-grid cell starts as wall (0.0 to 1.0)
    pub cave_wall_probability: f64,
    /// Cellular-automata smoothing iterations
    pub cave_smoothing_passes: u32,
    /// Connected cave regions below this tile count are discarded as specks
    pub cave_min_region_size: usize,
    /// Probability that a corridor mouth becomes a door (0.0 to 1.0)
    pub door_chance: f64,
    /// Enemy spawns per 100 room floor tiles
    pub monster_density: f64,
    /// Item placements per 100 room floor tiles
    pub item_density: f64,
    /// Difficulty factor weighting enemy kinds toward the dangerous end
    pub difficulty: f64,
    /// Bounded retry count when connectivity validation fails
    pub max_retries: u32,
}

impl GenerationConfig {
    /// Creates a default generation configuration for the given seed.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(12345);
    /// assert!(config.validate().is_ok());
    /// assert!(config.max_room_size >= config.min_room_size);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            width: crate::config::DEFAULT_MAP_WIDTH,
            height: crate::config::DEFAULT_MAP_HEIGHT,
            min_room_size: 4,
            max_room_size: 10,
            max_depth: 5,
            cave_ratio: 0.25,
            cave_wall_probability: 0.45,
            cave_smoothing_passes: 5,
            cave_min_region_size: 8,
            door_chance: 0.15,
            monster_density: 2.0,
            item_density: 1.5,
            difficulty: 1.0,
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a configuration for testing with smaller, simpler floors.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            seed,
            width: 40,
            height: 20,
            min_room_size: 3,
            max_room_size: 6,
            max_depth: 4,
            cave_ratio: 0.0,
            cave_wall_probability: 0.45,
            cave_smoothing_passes: 4,
            cave_min_region_size: 6,
            door_chance: 0.0,
            monster_density: 1.0,
            item_density: 0.5,
            difficulty: 0.5,
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
        }
    }

    /// Rejects configurations that cannot produce a valid floor.
    pub fn validate(&self) -> DelveResult<()> {
        if self.min_room_size < 2 {
            return Err(DelveError::InvalidConfig(format!(
                "min_room_size must be at least 2, got {}",
                self.min_room_size
            )));
        }
        if self.min_room_size > self.max_room_size {
            return Err(DelveError::InvalidConfig(format!(
                "min_room_size {} exceeds max_room_size {}",
                self.min_room_size, self.max_room_size
            )));
        }
        if self.width < self.min_room_size + 4 || self.height < self.min_room_size + 4 {
            return Err(DelveError::InvalidConfig(format!(
                "{}x{} grid cannot fit a {}-tile room with its margins",
                self.width, self.height, self.min_room_size
            )));
        }
        for (name, value) in [
            ("cave_ratio", self.cave_ratio),
            ("cave_wall_probability", self.cave_wall_probability),
            ("door_chance", self.door_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DelveError::InvalidConfig(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    name, value
                )));
            }
        }
        if self.monster_density < 0.0 || self.item_density < 0.0 || self.difficulty < 0.0 {
            return Err(DelveError::InvalidConfig(
                "densities and difficulty must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Different types of rooms that can be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    /// Standard chamber with no special properties
    Chamber,
    /// Shrine room; receives an altar feature
    Shrine,
    /// Crypt; receives a statue feature
    Crypt,
    /// Natural spring; receives a fountain feature
    Spring,
    /// Monster den; spawns extra enemies
    Den,
}

/// A rectangular room carved into the map.
///
/// Created by the room carver when a BSP leaf is finalized, mutated only by
/// the populator (appending spawns), and never destroyed for the life of the
/// floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Index of this room in the map's room list
    pub id: u32,
    /// Top-left corner
    pub origin: Position,
    /// Extent along x
    pub width: u32,
    /// Extent along y
    pub height: u32,
    /// Type/purpose of this room
    pub room_type: RoomType,
    /// Special features placed by the populator
    pub features: Vec<FeatureKind>,
    /// Enemy spawn descriptors assigned by the populator
    pub spawns: Vec<EnemySpawn>,
    /// Item placements assigned by the populator
    pub item_placements: Vec<ItemPlacement>,
}

impl Room {
    /// Creates a new room with the given bounds and type.
    pub fn new(id: u32, origin: Position, width: u32, height: u32, room_type: RoomType) -> Self {
        Self {
            id,
            origin,
            width,
            height,
            room_type,
            features: Vec::new(),
            spawns: Vec::new(),
            item_placements: Vec::new(),
        }
    }

    /// The center position of the room.
    pub fn center(&self) -> Position {
        Position::new(
            self.origin.x + self.width as i32 / 2,
            self.origin.y + self.height as i32 / 2,
        )
    }

    /// The bottom-right corner of the room.
    pub fn bottom_right(&self) -> Position {
        Position::new(
            self.origin.x + self.width as i32 - 1,
            self.origin.y + self.height as i32 - 1,
        )
    }

    /// The room's floor area in tiles.
    pub fn area(&self) -> u32 {
        self.width * self.height
    }

    /// Checks whether a position lies inside this room.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Position, Room, RoomType};
    ///
    /// let room = Room::new(0, Position::new(5, 5), 6, 4, RoomType::Chamber);
    /// assert!(room.contains(Position::new(7, 7)));
    /// assert!(!room.contains(Position::new(11, 5)));
    /// ```
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.origin.x
            && pos.y >= self.origin.y
            && pos.x < self.origin.x + self.width as i32
            && pos.y < self.origin.y + self.height as i32
    }

    /// Checks whether this room's rectangle overlaps another's.
    pub fn overlaps(&self, other: &Room) -> bool {
        !(self.origin.x >= other.origin.x + other.width as i32
            || other.origin.x >= self.origin.x + self.width as i32
            || self.origin.y >= other.origin.y + other.height as i32
            || other.origin.y >= self.origin.y + self.height as i32)
    }

    /// All positions inside the room rectangle, row by row.
    pub fn all_positions(&self) -> Vec<Position> {
        let mut positions = Vec::with_capacity((self.width * self.height) as usize);
        for y in self.origin.y..(self.origin.y + self.height as i32) {
            for x in self.origin.x..(self.origin.x + self.width as i32) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }
}

/// A generated region that corridors can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegionRef {
    /// A carved room, by room id
    Room(u32),
    /// A cave region, by cave index
    Cave(u32),
}

/// How two regions were joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Single straight corridor segment
    Straight,
    /// Horizontal plus vertical segment with one elbow
    LShaped,
    /// Link from a cave region to its nearest room
    CaveLink,
}

/// A record of two regions being linked by the corridor connector.
///
/// Kept for debugging and for the guaranteed-connectivity tests; the carved
/// corridor tiles themselves live in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: RegionRef,
    pub to: RegionRef,
    pub kind: ConnectionKind,
}

/// Trait for procedural generators.
///
/// Generators create their own seeded RNG from the configuration so that
/// bounded retries (each attempt reseeding deterministically) stay
/// reproducible.
pub trait Generator<T> {
    /// Generates content from the provided configuration.
    fn generate(&self, config: &GenerationConfig) -> DelveResult<T>;

    /// Validates that generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> DelveResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use super::*;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Creates the RNG for a retry attempt. Attempt 0 is the configured
    /// seed; later attempts derive deterministically from it.
    pub fn create_attempt_rng(config: &GenerationConfig, attempt: u32) -> StdRng {
        StdRng::seed_from_u64(config.seed.wrapping_add(attempt as u64))
    }
}
