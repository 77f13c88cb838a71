//! # Delve
//!
//! Procedural dungeon map subsystem for an AI-narrated tactical roguelike.
//!
//! ## Architecture Overview
//!
//! Delve is the spatial-reasoning core that the narrative shell, combat
//! resolver, and renderer build on. It owns four concerns:
//!
//! - **World Model**: the tile grid, room and connection bookkeeping, and the
//!   monotonically growing explored set used for fog-of-war
//! - **Generation System**: BSP room layout, cellular-automata caves, corridor
//!   connection with a guaranteed-connectivity contract, and population
//! - **Pathfinding**: per-turn A* queries over the walkable, occupancy-aware grid
//! - **Field of View**: recursive shadow casting for visibility queries
//!
//! Everything is synchronous and CPU-bound: generation consumes a seed and a
//! configuration, queries consume the in-memory map. Collaborators (scene
//! engine, combat, persistence, rendering) call in-process and serialize the
//! data model with serde.
//!
//! ## Determinism
//!
//! All randomness flows through a single seeded [`rand::rngs::StdRng`] threaded
//! explicitly through the generation pipeline. The same seed and configuration
//! always produce a bit-identical tile grid, which save/reload and the test
//! suite both rely on.

pub mod generation;
pub mod utils;
pub mod world;

// Core module re-exports
pub use generation::*;
pub use utils::*;
pub use world::*;

// Explicit re-exports for commonly used types
pub use generation::{
    Connection, ConnectionKind, DungeonGenerator, EnemyKind, EnemySpawn, FeatureKind,
    GenerationConfig, Generator, ItemPlacement, Populator, RegionRef, Room, RoomType,
};

pub use world::{
    connected_regions, EntityId, FieldOfView, GameMap, Position, Tile, TileType,
};

pub use utils::{find_path, MovementConfig};

/// Core error type for the map subsystem.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration rejected before generation began
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generation could not produce a valid map
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A query was made with coordinates outside the grid
    #[error("Position ({x}, {y}) is outside the map bounds")]
    OutOfBounds { x: i32, y: i32 },

    /// Map or query state is invalid
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Map subsystem constants.
pub mod config {
    /// Default dungeon width in tiles
    pub const DEFAULT_MAP_WIDTH: u32 = 80;

    /// Default dungeon height in tiles
    pub const DEFAULT_MAP_HEIGHT: u32 = 40;

    /// Default field-of-view radius in tiles
    pub const DEFAULT_FOV_RADIUS: i32 = 8;

    /// Bounded retry count for connectivity-failed generation attempts
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Cost of a diagonal step relative to an orthogonal step of 1
    pub const DIAGONAL_COST: f64 = std::f64::consts::SQRT_2;
}
