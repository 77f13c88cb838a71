//! # Delve Demo Entry Point
//!
//! Generates a dungeon floor from CLI flags and dumps it as ASCII, optionally
//! overlaying a pathfinding query and the spawn-point field of view. Useful
//! for eyeballing generator output and reproducing seeds from bug reports.

use clap::Parser;
use delve::{
    compute_fov, find_path, DelveError, DelveResult, DungeonGenerator, GenerationConfig,
    Generator, MovementConfig, Position,
};
use log::info;
use std::collections::HashSet;

/// Command line arguments for the Delve map inspector.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Procedural dungeon map generator and inspector")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Grid width in tiles
    #[arg(long, default_value_t = delve::config::DEFAULT_MAP_WIDTH)]
    width: u32,

    /// Grid height in tiles
    #[arg(long, default_value_t = delve::config::DEFAULT_MAP_HEIGHT)]
    height: u32,

    /// Cave floor area as a fraction of room floor area
    #[arg(long, default_value_t = 0.25)]
    cave_ratio: f64,

    /// Overlay the shortest path from the spawn to the down stairs
    #[arg(long)]
    show_path: bool,

    /// Overlay the field of view from the spawn point
    #[arg(long)]
    show_fov: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> DelveResult<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .parse_filters(&args.log_level)
        .init();

    info!("Delve v{}", delve::VERSION);

    let mut config = GenerationConfig::new(args.seed);
    config.width = args.width;
    config.height = args.height;
    config.cave_ratio = args.cave_ratio;

    let mut map = DungeonGenerator::new().generate(&config)?;

    let path: HashSet<Position> = if args.show_path {
        let goal = map.stairs_down.ok_or_else(|| {
            DelveError::InvalidState("floor has no down stairs to path to".to_string())
        })?;
        find_path(&map, map.player_spawn, goal, &MovementConfig::default())?
            .into_iter()
            .collect()
    } else {
        HashSet::new()
    };

    let fov: HashSet<Position> = if args.show_fov {
        let spawn = map.player_spawn;
        compute_fov(&mut map, spawn, delve::config::DEFAULT_FOV_RADIUS)?
    } else {
        HashSet::new()
    };

    let mut out = String::with_capacity((map.width as usize + 1) * map.height as usize);
    for y in 0..map.height as i32 {
        for x in 0..map.width as i32 {
            let pos = Position::new(x, y);
            let glyph = if pos == map.player_spawn {
                '@'
            } else if path.contains(&pos) {
                '*'
            } else if args.show_fov && fov.contains(&pos) && map.is_walkable(pos) {
                ':'
            } else {
                map.get_tile(pos).map(|t| t.glyph()).unwrap_or(' ')
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    print!("{}", out);

    println!(
        "seed {} | {} rooms | {} connections | {} walkable tiles",
        config.seed,
        map.rooms.len(),
        map.connections.len(),
        map.walkable_count()
    );
    for room in &map.rooms {
        println!(
            "room {:>2} {:?} at ({}, {}) {}x{} — {} spawns, {} items",
            room.id,
            room.room_type,
            room.origin.x,
            room.origin.y,
            room.width,
            room.height,
            room.spawns.len(),
            room.item_placements.len()
        );
    }

    Ok(())
}
