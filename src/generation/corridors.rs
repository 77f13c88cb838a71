//! # Corridor Connector
//!
//! Guarantees full connectivity. The BSP tree is walked bottom-up; every
//! internal node joins the room nearest its split boundary on each side, so
//! by induction the whole tree collapses into a single connected component.
//! Cave regions are attached to their nearest room afterwards.

use crate::generation::{
    BspTree, CaveRegion, Connection, ConnectionKind, RegionRef, SplitAxis,
};
use crate::world::{GameMap, Position, Tile, TileType};
use crate::DelveResult;
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::HashMap;

/// Joins every sibling pair of the BSP tree with a corridor, bottom-up.
///
/// `leaf_rooms` maps leaf arena indices to the ids of the rooms carved in
/// them. Children always have larger arena indices than their parents, so a
/// reverse index scan visits children before parents.
pub fn connect_bsp(
    map: &mut GameMap,
    tree: &BspTree,
    leaf_rooms: &HashMap<usize, u32>,
    rng: &mut StdRng,
) -> DelveResult<()> {
    for idx in (0..tree.nodes().len()).rev() {
        let node = &tree.nodes()[idx];
        let (left, right, split) = match (node.children, node.split) {
            (Some((l, r)), Some(split)) => (l, r, split),
            _ => continue,
        };

        let a = match nearest_room_to_boundary(map, tree, leaf_rooms, left, split.axis, split.coord)
        {
            Some(id) => id,
            None => continue,
        };
        let b =
            match nearest_room_to_boundary(map, tree, leaf_rooms, right, split.axis, split.coord) {
                Some(id) => id,
                None => continue,
            };

        let start = map.rooms[a as usize].center();
        let end = map.rooms[b as usize].center();
        let kind = carve_corridor(map, start, end, rng)?;
        map.add_connection(Connection {
            from: RegionRef::Room(a),
            to: RegionRef::Room(b),
            kind,
        });
    }
    debug!("connected BSP tree with {} links", map.connections.len());
    Ok(())
}

/// Attaches each cave region to the room nearest its centroid.
pub fn connect_caves(map: &mut GameMap, regions: &[CaveRegion], rng: &mut StdRng) -> DelveResult<()> {
    for (index, region) in regions.iter().enumerate() {
        let centroid = region.centroid();
        let room = match map
            .rooms
            .iter()
            .min_by_key(|r| r.center().distance_squared(centroid))
        {
            Some(room) => room,
            None => continue,
        };
        let room_id = room.id;
        let target = room.center();
        let start = match region.nearest_cell_to(target) {
            Some(cell) => cell,
            None => continue,
        };
        carve_corridor(map, start, target, rng)?;
        map.add_connection(Connection {
            from: RegionRef::Cave(index as u32),
            to: RegionRef::Room(room_id),
            kind: ConnectionKind::CaveLink,
        });
    }
    Ok(())
}

/// The room under `node` whose center lies closest to the split boundary.
fn nearest_room_to_boundary(
    map: &GameMap,
    tree: &BspTree,
    leaf_rooms: &HashMap<usize, u32>,
    node: usize,
    axis: SplitAxis,
    coord: i32,
) -> Option<u32> {
    tree.leaves_under(node)
        .into_iter()
        .filter_map(|leaf| leaf_rooms.get(&leaf).copied())
        .min_by_key(|&id| {
            let center = map.rooms[id as usize].center();
            let distance = match axis {
                SplitAxis::Vertical => (center.x - coord).abs(),
                SplitAxis::Horizontal => (center.y - coord).abs(),
            };
            (distance, id)
        })
}

/// Carves a 1-tile-wide corridor between two points: straight when they
/// share an axis, otherwise L-shaped with an RNG-chosen elbow.
fn carve_corridor(
    map: &mut GameMap,
    start: Position,
    end: Position,
    rng: &mut StdRng,
) -> DelveResult<ConnectionKind> {
    if start.x == end.x {
        carve_vertical(map, start.y, end.y, start.x)?;
        Ok(ConnectionKind::Straight)
    } else if start.y == end.y {
        carve_horizontal(map, start.x, end.x, start.y)?;
        Ok(ConnectionKind::Straight)
    } else if rng.gen_bool(0.5) {
        // Horizontal first, elbow at (end.x, start.y)
        carve_horizontal(map, start.x, end.x, start.y)?;
        carve_vertical(map, start.y, end.y, end.x)?;
        Ok(ConnectionKind::LShaped)
    } else {
        // Vertical first, elbow at (start.x, end.y)
        carve_vertical(map, start.y, end.y, start.x)?;
        carve_horizontal(map, start.x, end.x, end.y)?;
        Ok(ConnectionKind::LShaped)
    }
}

fn carve_horizontal(map: &mut GameMap, x1: i32, x2: i32, y: i32) -> DelveResult<()> {
    for x in x1.min(x2)..=x1.max(x2) {
        carve_corridor_tile(map, Position::new(x, y))?;
    }
    Ok(())
}

fn carve_vertical(map: &mut GameMap, y1: i32, y2: i32, x: i32) -> DelveResult<()> {
    for y in y1.min(y2)..=y1.max(y2) {
        carve_corridor_tile(map, Position::new(x, y))?;
    }
    Ok(())
}

/// Converts a single wall tile to corridor floor. Tiles that are already
/// walkable are left untouched rather than re-carved.
fn carve_corridor_tile(map: &mut GameMap, pos: Position) -> DelveResult<()> {
    if map.get_tile(pos).map(|t| t.tile_type()) == Some(TileType::Wall) {
        map.set_tile(pos, Tile::corridor())?;
    }
    Ok(())
}
