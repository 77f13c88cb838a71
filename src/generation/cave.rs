//! # Cave Generator
//!
//! Cellular-automata cave carving. A random noise grid is smoothed into
//! organic blob shapes by a majority rule, specks are pruned by
//! connected-component labeling, and the surviving regions are written into
//! the map as cave floor.

use crate::generation::GenerationConfig;
use crate::world::{connected_regions, GameMap, Position, Tile, TileType};
use crate::DelveResult;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

/// One organic cave region written into the map.
///
/// Kept so the corridor connector can attach the region to the room network;
/// discarded afterwards.
#[derive(Debug, Clone)]
pub struct CaveRegion {
    /// All cells of the region, in flood-fill discovery order.
    pub cells: Vec<Position>,
}

impl CaveRegion {
    /// The arithmetic center of the region's cells.
    pub fn centroid(&self) -> Position {
        let (sx, sy) = self
            .cells
            .iter()
            .fold((0i64, 0i64), |(sx, sy), p| (sx + p.x as i64, sy + p.y as i64));
        let n = self.cells.len().max(1) as i64;
        Position::new((sx / n) as i32, (sy / n) as i32)
    }

    /// The region cell closest to a target position. Corridors attach here
    /// rather than at the centroid, which can fall on rock in a concave
    /// region.
    pub fn nearest_cell_to(&self, target: Position) -> Option<Position> {
        self.cells
            .iter()
            .min_by_key(|p| p.distance_squared(target))
            .copied()
    }
}

/// Carves cellular-automata caves into the map's remaining rock.
///
/// Runs after room carving: surviving cave cells only ever replace `Wall`
/// tiles, so rooms are never clobbered. How much cave to keep is controlled
/// by `cave_ratio` — surviving regions are admitted largest-first until cave
/// floor area reaches `cave_ratio` times the room floor area already carved.
/// Returns the admitted regions for the corridor connector.
pub fn carve_caves(
    map: &mut GameMap,
    config: &GenerationConfig,
    rng: &mut StdRng,
) -> DelveResult<Vec<CaveRegion>> {
    if config.cave_ratio <= 0.0 {
        return Ok(Vec::new());
    }

    let (width, height) = (map.width, map.height);
    let mut walls = noise_grid(width, height, config, rng);
    for _ in 0..config.cave_smoothing_passes {
        walls = smooth(&walls, width, height);
    }

    // Components of the scratch grid, specks dropped.
    let mut regions: Vec<Vec<Position>> =
        connected_regions(width, height, |pos| !walls[pos.y as usize][pos.x as usize])
            .into_iter()
            .filter(|r| r.len() >= config.cave_min_region_size)
            .collect();
    // Largest first; the scan order of connected_regions keeps ties stable.
    regions.sort_by(|a, b| b.len().cmp(&a.len()));

    let room_floor: u32 = map.rooms.iter().map(|r| r.area()).sum();
    let budget = (config.cave_ratio * room_floor as f64).ceil() as usize;

    let mut admitted = Vec::new();
    let mut total = 0usize;
    for cells in regions {
        if total >= budget {
            break;
        }
        total += cells.len();
        for &pos in &cells {
            if map.get_tile(pos).map(|t| t.tile_type()) == Some(TileType::Wall) {
                map.set_tile(pos, Tile::cave_floor())?;
            }
        }
        admitted.push(CaveRegion { cells });
    }

    debug!(
        "carved {} cave regions covering {} tiles (budget {})",
        admitted.len(),
        total,
        budget
    );
    Ok(admitted)
}

/// Seeds the noise grid: each interior cell is wall with the configured
/// probability, the border is always wall so caves never touch the map edge.
fn noise_grid(width: u32, height: u32, config: &GenerationConfig, rng: &mut StdRng) -> Vec<Vec<bool>> {
    (0..height as i32)
        .map(|y| {
            (0..width as i32)
                .map(|x| {
                    if x == 0 || y == 0 || x == width as i32 - 1 || y == height as i32 - 1 {
                        true
                    } else {
                        rng.gen_bool(config.cave_wall_probability)
                    }
                })
                .collect()
        })
        .collect()
}

/// One smoothing pass: a cell becomes wall when five or more of its Moore
/// neighbors are wall. Out-of-bounds neighbors count as wall, which keeps
/// the border closed and converges noise into blobs.
fn smooth(walls: &[Vec<bool>], width: u32, height: u32) -> Vec<Vec<bool>> {
    (0..height as i32)
        .map(|y| {
            (0..width as i32)
                .map(|x| wall_neighbors(walls, width, height, x, y) >= 5)
                .collect()
        })
        .collect()
}

fn wall_neighbors(walls: &[Vec<bool>], width: u32, height: u32, x: i32, y: i32) -> u32 {
    let mut count = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                count += 1;
            } else if walls[ny as usize][nx as usize] {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;
    use crate::generation::{Room, RoomType};

    fn cave_config(seed: u64) -> GenerationConfig {
        let mut config = GenerationConfig::new(seed);
        config.width = 60;
        config.height = 40;
        config.cave_ratio = 0.5;
        config
    }

    fn map_with_room(config: &GenerationConfig) -> GameMap {
        let mut map = GameMap::new(config.width, config.height, config.seed);
        map.carve_room(Room::new(0, Position::new(2, 2), 6, 5, RoomType::Chamber))
            .unwrap();
        map
    }

    #[test]
    fn test_cave_ratio_zero_disables_caves() {
        let mut config = cave_config(11);
        config.cave_ratio = 0.0;
        let mut map = map_with_room(&config);
        let mut rng = create_rng(&config);
        assert!(carve_caves(&mut map, &config, &mut rng).unwrap().is_empty());
        let cave_tiles = map
            .tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|t| t.tile_type() == TileType::CaveFloor)
            .count();
        assert_eq!(cave_tiles, 0);
    }

    #[test]
    fn test_no_specks_survive_pruning() {
        let config = cave_config(21);
        let mut map = map_with_room(&config);
        let mut rng = create_rng(&config);
        let regions = carve_caves(&mut map, &config, &mut rng).unwrap();
        assert!(!regions.is_empty());
        for region in &regions {
            assert!(region.cells.len() >= config.cave_min_region_size);
        }
    }

    #[test]
    fn test_caves_never_overwrite_room_floor() {
        let config = cave_config(31);
        let mut map = map_with_room(&config);
        let mut rng = create_rng(&config);
        carve_caves(&mut map, &config, &mut rng).unwrap();
        for pos in map.rooms[0].all_positions() {
            assert_eq!(map.get_tile(pos).unwrap().tile_type(), TileType::Floor);
        }
    }

    #[test]
    fn test_region_cells_are_walkable_after_carving() {
        let config = cave_config(41);
        let mut map = map_with_room(&config);
        let mut rng = create_rng(&config);
        for region in carve_caves(&mut map, &config, &mut rng).unwrap() {
            for &pos in &region.cells {
                assert!(map.is_walkable(pos), "{:?} not walkable", pos);
            }
        }
    }

    #[test]
    fn test_caves_stay_off_the_border() {
        let config = cave_config(51);
        let mut map = map_with_room(&config);
        let mut rng = create_rng(&config);
        carve_caves(&mut map, &config, &mut rng).unwrap();
        for x in 0..config.width as i32 {
            assert!(!map.is_walkable(Position::new(x, 0)));
            assert!(!map.is_walkable(Position::new(x, config.height as i32 - 1)));
        }
        for y in 0..config.height as i32 {
            assert!(!map.is_walkable(Position::new(0, y)));
            assert!(!map.is_walkable(Position::new(config.width as i32 - 1, y)));
        }
    }

    #[test]
    fn test_carving_is_deterministic() {
        let config = cave_config(61);
        let mut map_a = map_with_room(&config);
        let mut map_b = map_with_room(&config);
        let mut rng_a = create_rng(&config);
        let mut rng_b = create_rng(&config);
        carve_caves(&mut map_a, &config, &mut rng_a).unwrap();
        carve_caves(&mut map_b, &config, &mut rng_b).unwrap();
        assert_eq!(map_a.tiles, map_b.tiles);
    }

    #[test]
    fn test_nearest_cell_and_centroid() {
        let region = CaveRegion {
            cells: vec![
                Position::new(2, 2),
                Position::new(3, 2),
                Position::new(4, 2),
                Position::new(3, 3),
            ],
        };
        assert_eq!(region.centroid(), Position::new(3, 2));
        assert_eq!(region.nearest_cell_to(Position::new(10, 2)), Some(Position::new(4, 2)));
    }
}
