use criterion::{black_box, criterion_group, criterion_main, Criterion};
use delver_logic::config::{GenerationSettings, PathfindingSettings};
use delver_logic::cost_grid::CostGrid;
use delver_logic::geometry::GridPos;
use delver_logic::layout::generate_dungeon;
use delver_logic::level::LevelDefinition;
use delver_logic::pathfinding::find_cells;
use rand::rngs::StdRng;
use rand::SeedableRng;

const LEVEL_1: &str = include_str!("../../../data/levels/level_1.json");

/// 64×64 hall with staggered wall segments and two preferred-path rows cut through them.
fn maze_grid() -> CostGrid {
    let settings = PathfindingSettings::default();
    let mut grid = CostGrid::filled(64, 64, settings.default_movement_penalty);
    for x in (8..56).step_by(8) {
        let wall = if (x / 8) % 2 == 0 { 0..56 } else { 8..64 };
        for y in wall {
            grid.set_penalty(GridPos::new(x, y), 0);
        }
    }
    for i in 0..64 {
        grid.set_penalty(GridPos::new(i, 2), settings.preferred_path_movement_penalty);
        grid.set_penalty(GridPos::new(i, 61), settings.preferred_path_movement_penalty);
    }
    grid
}

fn bench_astar(c: &mut Criterion) {
    let open = CostGrid::filled(64, 64, 40);
    c.bench_function("astar_open_64x64_corner_to_corner", |b| {
        b.iter(|| find_cells(black_box(&open), GridPos::new(0, 0), GridPos::new(63, 63)))
    });

    let maze = maze_grid();
    c.bench_function("astar_maze_64x64", |b| {
        b.iter(|| find_cells(black_box(&maze), GridPos::new(1, 32), GridPos::new(62, 32)))
    });
}

fn bench_generation(c: &mut Criterion) {
    let level = LevelDefinition::from_json(LEVEL_1).expect("level_1.json parses");
    let settings = GenerationSettings::default();
    let mut seed = 0u64;
    c.bench_function("generate_level_1", |b| {
        b.iter(|| {
            seed += 1;
            let mut rng = StdRng::seed_from_u64(seed);
            generate_dungeon(black_box(&level), &settings, &mut rng)
        })
    });
}

criterion_group!(benches, bench_astar, bench_generation);
criterion_main!(benches);
