//! Performance tests for the map subsystem's per-turn and per-floor budgets.

use delve::{
    compute_fov, find_path, new_entity_id, DungeonGenerator, GenerationConfig, Generator,
    MovementConfig,
};
use std::time::Instant;

#[test]
fn test_generation_performance() {
    // The reference scenario: a 40x20 floor must generate in under 50ms.
    let mut config = GenerationConfig::new(42);
    config.width = 40;
    config.height = 20;
    config.min_room_size = 4;
    config.max_room_size = 8;
    config.max_depth = 5;

    let generator = DungeonGenerator::new();
    // Warm up once so allocator effects don't dominate the measurement.
    let _ = generator.generate(&config).unwrap();

    let start = Instant::now();
    let map = generator.generate(&config).unwrap();
    let elapsed = start.elapsed();

    println!("40x20 generation took {:?}", elapsed);
    assert!(map.rooms.len() >= 5);
    assert!(
        elapsed.as_millis() < 50,
        "generation too slow: {:?}",
        elapsed
    );
}

#[test]
fn test_pathfinding_performance_with_obstacles() {
    // A single query on an 80x24 grid with ~100 dynamic obstacles must stay
    // well under 10ms.
    let mut config = GenerationConfig::new(7);
    config.width = 80;
    config.height = 24;
    let mut map = DungeonGenerator::new().generate(&config).unwrap();

    let mut rng = delve::generation::utils::create_rng(&config);
    let mut placed = 0;
    while placed < 100 {
        let pos = map.find_random_floor_tile(&mut rng).unwrap();
        if pos != map.player_spawn && map.occupant_at(pos).is_none() {
            map.set_occupant(pos, new_entity_id()).unwrap();
            placed += 1;
        }
    }

    let goal = map.stairs_down.unwrap();
    let start = Instant::now();
    let iterations = 50;
    for _ in 0..iterations {
        let _ = find_path(&map, map.player_spawn, goal, &MovementConfig::default()).unwrap();
    }
    let per_query = start.elapsed() / iterations;

    println!("80x24 path query with 100 obstacles: {:?}", per_query);
    assert!(
        per_query.as_millis() < 10,
        "pathfinding too slow: {:?}",
        per_query
    );
}

#[test]
fn test_fov_performance() {
    // Radius-8 FOV on an 80x24 grid must stay under a few milliseconds; it
    // reruns on every player move and every enemy turn.
    let mut config = GenerationConfig::new(11);
    config.width = 80;
    config.height = 24;
    let mut map = DungeonGenerator::new().generate(&config).unwrap();
    let origin = map.player_spawn;

    let start = Instant::now();
    let iterations = 200;
    for _ in 0..iterations {
        let _ = compute_fov(&mut map, origin, 8).unwrap();
    }
    let per_query = start.elapsed() / iterations;

    println!("80x24 radius-8 FOV query: {:?}", per_query);
    assert!(
        per_query.as_millis() < 5,
        "FOV too slow: {:?}",
        per_query
    );
}

#[test]
fn test_enclosed_goal_terminates_quickly() {
    // A goal walled off from the rest of the floor must exhaust the search
    // in bounded time, not hang.
    let mut config = GenerationConfig::new(13);
    config.width = 80;
    config.height = 24;
    let mut map = DungeonGenerator::new().generate(&config).unwrap();

    let goal = map.stairs_down.unwrap();
    for pos in goal.adjacent_positions() {
        map.set_tile(pos, delve::Tile::wall()).unwrap();
    }

    let start = Instant::now();
    let path = find_path(&map, map.player_spawn, goal, &MovementConfig::default()).unwrap();
    let elapsed = start.elapsed();

    assert!(path.is_empty());
    println!("exhaustive no-path search took {:?}", elapsed);
    assert!(elapsed.as_millis() < 10, "no-path search too slow: {:?}", elapsed);
}
