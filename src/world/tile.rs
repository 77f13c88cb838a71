//! # Tile Model
//!
//! Per-cell tile types and attributes. A tile's movement and sight flags are
//! derived from its type at construction and on every type change, so the
//! flags can never disagree with the tag.

use crate::world::EntityId;
use serde::{Deserialize, Serialize};

/// The kind of terrain occupying a map cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    /// Carved room floor
    Floor,
    /// Solid rock / masonry
    Wall,
    /// Organic cave floor produced by the cellular-automata pass
    CaveFloor,
    /// Corridor floor between rooms
    Corridor,
    /// Door in a room wall; closed doors block movement and sight
    Door { open: bool },
    /// Stairs leading up to the previous floor
    StairsUp,
    /// Stairs leading down to the next floor
    StairsDown,
    /// Shrine altar feature tile
    Altar,
    /// Statue feature tile; blocks movement and sight
    Statue,
    /// Fountain feature tile; blocks movement but not sight
    Fountain,
}

impl TileType {
    /// Whether entities can stand on this terrain.
    pub fn is_walkable(self) -> bool {
        match self {
            TileType::Floor
            | TileType::CaveFloor
            | TileType::Corridor
            | TileType::StairsUp
            | TileType::StairsDown
            | TileType::Altar => true,
            TileType::Door { open } => open,
            TileType::Wall | TileType::Statue | TileType::Fountain => false,
        }
    }

    /// Whether this terrain blocks line of sight.
    pub fn is_opaque(self) -> bool {
        match self {
            TileType::Wall | TileType::Statue => true,
            TileType::Door { open } => !open,
            _ => false,
        }
    }

    /// Default display glyph for this terrain. Cosmetic only; the renderer
    /// may substitute its own.
    pub fn glyph(self) -> char {
        match self {
            TileType::Floor => '.',
            TileType::Wall => '#',
            TileType::CaveFloor => ',',
            TileType::Corridor => '.',
            TileType::Door { open: true } => '/',
            TileType::Door { open: false } => '+',
            TileType::StairsUp => '<',
            TileType::StairsDown => '>',
            TileType::Altar => '_',
            TileType::Statue => '&',
            TileType::Fountain => '~',
        }
    }
}

/// A single map cell.
///
/// The `walkable`/`opaque` flags are private and only ever written by
/// [`Tile::new`] and [`Tile::set_type`], both of which derive them from the
/// tile type. Changing the type without updating the flags is therefore
/// unrepresentable.
///
/// # Examples
///
/// ```
/// use delve::{Tile, TileType};
///
/// let mut tile = Tile::wall();
/// assert!(!tile.is_walkable());
/// assert!(tile.is_opaque());
///
/// tile.set_type(TileType::Floor);
/// assert!(tile.is_walkable());
/// assert!(!tile.is_opaque());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    tile_type: TileType,
    glyph: char,
    walkable: bool,
    opaque: bool,
    /// Item ids currently lying on this tile, in drop order.
    pub items: Vec<String>,
    /// The single entity standing on this tile, if any.
    pub occupant: Option<EntityId>,
}

impl Tile {
    /// Creates a tile of the given type with flags derived from it.
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            glyph: tile_type.glyph(),
            walkable: tile_type.is_walkable(),
            opaque: tile_type.is_opaque(),
            items: Vec::new(),
            occupant: None,
        }
    }

    /// Creates a floor tile.
    pub fn floor() -> Self {
        Self::new(TileType::Floor)
    }

    /// Creates a wall tile.
    pub fn wall() -> Self {
        Self::new(TileType::Wall)
    }

    /// Creates a cave-floor tile.
    pub fn cave_floor() -> Self {
        Self::new(TileType::CaveFloor)
    }

    /// Creates a corridor tile.
    pub fn corridor() -> Self {
        Self::new(TileType::Corridor)
    }

    /// The tile's terrain type.
    pub fn tile_type(&self) -> TileType {
        self.tile_type
    }

    /// Changes the terrain type, re-deriving the movement and sight flags.
    /// Items and occupant are preserved.
    pub fn set_type(&mut self, tile_type: TileType) {
        self.tile_type = tile_type;
        self.glyph = tile_type.glyph();
        self.walkable = tile_type.is_walkable();
        self.opaque = tile_type.is_opaque();
    }

    /// Whether an entity can stand here.
    pub fn is_walkable(&self) -> bool {
        self.walkable
    }

    /// Whether this tile blocks line of sight.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// The tile's display glyph.
    pub fn glyph(&self) -> char {
        self.glyph
    }

    /// Whether an entity is standing on this tile.
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}
