//! Criterion benchmarks backing the map subsystem's performance budgets:
//! floor generation per level change, pathfinding and FOV per turn.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use delve::{
    compute_fov, find_path, DungeonGenerator, GenerationConfig, Generator, MovementConfig,
};

fn bench_generation(c: &mut Criterion) {
    let generator = DungeonGenerator::new();

    let config = GenerationConfig::new(42);
    c.bench_function("generate 80x40 floor", |b| {
        b.iter(|| generator.generate(black_box(&config)).unwrap())
    });

    let mut cave_config = GenerationConfig::new(42);
    cave_config.cave_ratio = 0.5;
    c.bench_function("generate 80x40 floor with caves", |b| {
        b.iter(|| generator.generate(black_box(&cave_config)).unwrap())
    });
}

fn bench_pathfinding(c: &mut Criterion) {
    let mut config = GenerationConfig::new(7);
    config.width = 80;
    config.height = 24;
    let map = DungeonGenerator::new().generate(&config).unwrap();
    let start = map.player_spawn;
    let goal = map.stairs_down.unwrap();

    c.bench_function("find_path across 80x24 floor", |b| {
        b.iter(|| {
            find_path(
                black_box(&map),
                black_box(start),
                black_box(goal),
                &MovementConfig::default(),
            )
            .unwrap()
        })
    });

    c.bench_function("find_path four-way across 80x24 floor", |b| {
        b.iter(|| {
            find_path(
                black_box(&map),
                black_box(start),
                black_box(goal),
                &MovementConfig::four_way(),
            )
            .unwrap()
        })
    });
}

fn bench_fov(c: &mut Criterion) {
    let mut config = GenerationConfig::new(11);
    config.width = 80;
    config.height = 24;
    let mut map = DungeonGenerator::new().generate(&config).unwrap();
    let origin = map.player_spawn;

    c.bench_function("radius-8 FOV on 80x24 floor", |b| {
        b.iter(|| compute_fov(black_box(&mut map), black_box(origin), 8).unwrap())
    });
}

criterion_group!(benches, bench_generation, bench_pathfinding, bench_fov);
criterion_main!(benches);
