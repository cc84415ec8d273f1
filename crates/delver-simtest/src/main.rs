//! Delver Headless Generation Harness
//!
//! Validates dungeon generation and enemy pathfinding without an engine.
//! Runs entirely in-process with no rendering and no input. The only asset
//! is the level JSON.
//!
//! Usage:
//!   cargo run -p delver-simtest
//!   cargo run -p delver-simtest -- --verbose --seeds 200
//!   cargo run -p delver-simtest -- --level data/levels/level_1.json --config delver.json
//!
//! Log output is controlled by `RUST_LOG` (default `warn`).

use std::path::PathBuf;

use clap::Parser;
use delver_logic::chase::{plan_chase_path, PathRebuildTracker};
use delver_logic::config::{validate_config, DelverConfig, GenerationSettings};
use delver_logic::cost_grid::CostGrid;
use delver_logic::geometry::{cell_center, GridPos, Orientation, WorldPos};
use delver_logic::graph::RoomNodeGraph;
use delver_logic::layout::{generate_dungeon, DungeonLayout, GenerationError};
use delver_logic::level::{validate_level, LevelDefinition};
use delver_logic::pathfinding::build_path;
use delver_logic::templates::{Doorway, RoomTemplate, RoomType};
use delver_logic::validation::{validate_layout, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

// ── Shipped level (same JSON the game loads) ────────────────────────────
const LEVEL_1_JSON: &str = include_str!("../../../data/levels/level_1.json");

/// Headless harness for dungeon generation and pathfinding
#[derive(Parser, Debug)]
#[command(name = "delver-simtest")]
#[command(
    version,
    about = "Delver - headless generation and pathfinding checks",
    long_about = None
)]
struct Args {
    /// Print passing checks too
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Number of seeds in the generation sweep
    #[arg(short = 'n', long = "seeds", default_value_t = 50)]
    seeds: u64,

    /// First seed of the sweep
    #[arg(short = 's', long = "seed", default_value_t = 0)]
    seed: u64,

    /// Level JSON to test instead of the shipped level
    #[arg(short = 'l', long = "level")]
    level: Option<PathBuf>,

    /// Settings JSON; omitted fields keep their defaults
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    println!("=== Delver Generation Harness ===\n");

    let mut results = Vec::new();

    // 1. Settings
    let config = load_config(&args, &mut results);

    // 2. Level data
    let Some(level) = load_level(&args, &mut results) else {
        return finish(&results, args.verbose);
    };
    results.extend(validate_level_data(&level, &config, args.verbose));

    // 3. Generation sweep
    let layouts = sweep_generation(&level, &config, &args, &mut results);

    // 4. Termination on unsatisfiable graphs
    results.extend(validate_termination(&config.generation, args.verbose));

    // 5. Pathfinding inside generated rooms
    if let Some(layout) = layouts.first() {
        results.extend(validate_room_pathfinding(&level, layout, &config, args.verbose));
    }

    // 6. Chase rebuild policy
    results.extend(validate_chase_policy(&config, args.verbose));

    // 7. Determinism
    results.extend(validate_determinism(&level, &config, args.seed));

    finish(&results, args.verbose);
}

fn finish(results: &[TestResult], verbose: bool) {
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Settings ─────────────────────────────────────────────────────────

fn load_config(args: &Args, results: &mut Vec<TestResult>) -> DelverConfig {
    println!("--- Settings ---");
    let config = match &args.config {
        None => DelverConfig::default(),
        Some(path) => match std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| DelverConfig::from_json(&text).map_err(|e| e.to_string()))
        {
            Ok(c) => c,
            Err(e) => {
                results.push(TestResult {
                    name: "config_parse".into(),
                    passed: false,
                    detail: format!("{}: {}", path.display(), e),
                });
                DelverConfig::default()
            }
        },
    };

    let errors = validate_config(&config);
    results.push(TestResult {
        name: "config_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!(
                "{} graph choices × {} rebuilds, penalties {}/{}",
                config.generation.max_dungeon_build_attempts,
                config.generation.max_dungeon_rebuild_attempts_for_room_graph,
                config.pathfinding.default_movement_penalty,
                config.pathfinding.preferred_path_movement_penalty
            )
        } else {
            format!("{:?}", errors)
        },
    });
    config
}

// ── 2. Level data ───────────────────────────────────────────────────────

fn load_level(args: &Args, results: &mut Vec<TestResult>) -> Option<LevelDefinition> {
    println!("--- Level Data ---");
    let loaded = match &args.level {
        Some(path) => LevelDefinition::load(path),
        None => LevelDefinition::from_json(LEVEL_1_JSON),
    };
    match loaded {
        Ok(level) => {
            results.push(TestResult {
                name: "level_parse".into(),
                passed: true,
                detail: format!(
                    "'{}': {} templates, {} graphs",
                    level.name,
                    level.templates.len(),
                    level.graphs.len()
                ),
            });
            Some(level)
        }
        Err(e) => {
            results.push(TestResult {
                name: "level_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            None
        }
    }
}

fn validate_level_data(
    level: &LevelDefinition,
    config: &DelverConfig,
    verbose: bool,
) -> Vec<TestResult> {
    let mut results = Vec::new();
    let issues = validate_level(level, config.generation.max_child_corridors);
    let errors: Vec<_> = issues
        .iter()
        .filter(|e| e.severity == Severity::Error)
        .collect();
    for w in issues.iter().filter(|e| e.severity == Severity::Warning) {
        log::warn!("[{}] {}", w.category, w.message);
    }
    results.push(TestResult {
        name: "level_valid".into(),
        passed: errors.is_empty(),
        detail: if errors.is_empty() {
            format!("{} warnings", issues.len())
        } else {
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ")
        },
    });

    let settings = &config.pathfinding;
    let grid_failures: Vec<String> = level
        .templates
        .iter()
        .filter_map(|t| CostGrid::from_template(t, settings).err())
        .map(|e| e.to_string())
        .collect();
    results.push(TestResult {
        name: "template_cost_grids".into(),
        passed: grid_failures.is_empty(),
        detail: if grid_failures.is_empty() {
            format!("{} grids built", level.templates.len())
        } else {
            grid_failures.join("; ")
        },
    });

    if verbose {
        for t in &level.templates {
            println!(
                "  {:<16} {:?} {}×{}, {} doorways",
                t.id,
                t.room_type,
                t.bounds().width(),
                t.bounds().height(),
                t.doorways.len()
            );
        }
    }
    results
}

// ── 3. Generation sweep ─────────────────────────────────────────────────

fn graph_for<'a>(level: &'a LevelDefinition, layout: &DungeonLayout) -> Option<&'a RoomNodeGraph> {
    level.graphs.iter().find(|g| g.name == layout.graph_name)
}

fn sweep_generation(
    level: &LevelDefinition,
    config: &DelverConfig,
    args: &Args,
    results: &mut Vec<TestResult>,
) -> Vec<DungeonLayout> {
    println!("--- Generation Sweep ({} seeds) ---", args.seeds);
    let mut layouts = Vec::new();
    let mut failures = Vec::new();
    let mut invalid = Vec::new();
    let mut total_rebuilds = 0u64;
    let mut worst_rebuilds = 0u32;

    for seed in args.seed..args.seed + args.seeds {
        let mut rng = StdRng::seed_from_u64(seed);
        match generate_dungeon(level, &config.generation, &mut rng) {
            Ok(layout) => {
                let errors = match graph_for(level, &layout) {
                    Some(graph) => validate_layout(&layout, graph)
                        .into_iter()
                        .map(|e| e.message)
                        .collect(),
                    None => vec![format!("unknown graph '{}'", layout.graph_name)],
                };
                if !errors.is_empty() {
                    invalid.push(format!("seed {}: {}", seed, errors.join("; ")));
                }
                total_rebuilds += u64::from(layout.rebuild_attempts);
                worst_rebuilds = worst_rebuilds.max(layout.rebuild_attempts);
                if args.verbose {
                    println!(
                        "  seed {:>4}: graph '{}', {} rooms, rebuild {}",
                        seed,
                        layout.graph_name,
                        layout.len(),
                        layout.rebuild_attempts
                    );
                }
                layouts.push(layout);
            }
            Err(e) => failures.push(format!("seed {}: {}", seed, e)),
        }
    }

    results.push(TestResult {
        name: "generation_succeeds".into(),
        passed: failures.is_empty(),
        detail: if failures.is_empty() {
            format!("{}/{} seeds built", layouts.len(), args.seeds)
        } else {
            failures.join("; ")
        },
    });
    results.push(TestResult {
        name: "layouts_valid".into(),
        passed: invalid.is_empty(),
        detail: if invalid.is_empty() {
            "no overlaps, doorways aligned, all rooms reachable".into()
        } else {
            invalid.join(" | ")
        },
    });
    if !layouts.is_empty() {
        results.push(TestResult {
            name: "rebuild_budget".into(),
            passed: worst_rebuilds <= config.generation.max_dungeon_rebuild_attempts_for_room_graph,
            detail: format!(
                "mean {:.1}, worst {} rebuilds",
                total_rebuilds as f64 / layouts.len() as f64,
                worst_rebuilds
            ),
        });
    }
    layouts
}

// ── 4. Termination ──────────────────────────────────────────────────────

/// An entrance with four single doorways and five children can never be
/// satisfied.
fn crowded_level() -> LevelDefinition {
    let door = |x, y, o| Doorway::new(GridPos::new(x, y), o);
    let entrance = RoomTemplate::new(
        "entrance",
        RoomType::Entrance,
        GridPos::new(0, 0),
        GridPos::new(10, 10),
        vec![
            door(5, 10, Orientation::North),
            door(10, 5, Orientation::East),
            door(5, 0, Orientation::South),
            door(0, 5, Orientation::West),
        ],
    );
    let small = RoomTemplate::new(
        "small",
        RoomType::SmallRoom,
        GridPos::new(0, 0),
        GridPos::new(4, 4),
        vec![
            door(2, 4, Orientation::North),
            door(4, 2, Orientation::East),
            door(2, 0, Orientation::South),
            door(0, 2, Orientation::West),
        ],
    );
    let mut graph = RoomNodeGraph::new("crowded").with_node("entrance", RoomType::Entrance);
    for i in 0..5 {
        let id = format!("room_{}", i);
        graph = graph
            .with_node(id.clone(), RoomType::SmallRoom)
            .with_link("entrance", &id);
    }
    LevelDefinition {
        name: "crowded".into(),
        templates: vec![entrance, small],
        graphs: vec![graph],
    }
}

fn validate_termination(generation: &GenerationSettings, verbose: bool) -> Vec<TestResult> {
    println!("--- Termination ---");
    let mut results = Vec::new();
    let settings = GenerationSettings {
        max_dungeon_build_attempts: generation.max_dungeon_build_attempts.min(3),
        max_dungeon_rebuild_attempts_for_room_graph: generation
            .max_dungeon_rebuild_attempts_for_room_graph
            .min(50),
        ..generation.clone()
    };
    let expected = settings.max_dungeon_build_attempts
        * settings.max_dungeon_rebuild_attempts_for_room_graph;

    let mut rng = StdRng::seed_from_u64(0);
    let outcome = generate_dungeon(&crowded_level(), &settings, &mut rng);
    let passed = matches!(
        outcome,
        Err(GenerationError::AttemptsExhausted { total_attempts, .. }) if total_attempts == expected
    );
    results.push(TestResult {
        name: "unsatisfiable_graph_terminates".into(),
        passed,
        detail: match outcome {
            Ok(layout) => format!("unexpectedly built {} rooms", layout.len()),
            Err(e) => e.to_string(),
        },
    });

    let empty = LevelDefinition {
        name: "empty".into(),
        templates: Vec::new(),
        graphs: Vec::new(),
    };
    let outcome = generate_dungeon(&empty, &settings, &mut rng);
    results.push(TestResult {
        name: "no_graphs_fails_fast".into(),
        passed: matches!(outcome, Err(GenerationError::NoRoomNodeGraphs(_))),
        detail: format!("{:?}", outcome.err()),
    });

    if verbose {
        println!("  expected {} attempts before giving up", expected);
    }
    results
}

// ── 5. Pathfinding ──────────────────────────────────────────────────────

fn validate_room_pathfinding(
    level: &LevelDefinition,
    layout: &DungeonLayout,
    config: &DelverConfig,
    verbose: bool,
) -> Vec<TestResult> {
    println!("--- Room Pathfinding ---");
    let mut results = Vec::new();
    let catalog = level.catalog();
    let settings = &config.pathfinding;

    let mut door_paths = 0;
    let mut door_failures = Vec::new();
    let mut chase_paths = 0;
    let mut chase_failures = Vec::new();

    for room in &layout.rooms {
        let Some(grid) = catalog
            .get(&room.template_id)
            .and_then(|t| CostGrid::from_template(t, settings).ok())
        else {
            door_failures.push(format!("{}: no grid", room.id));
            continue;
        };

        let doors: Vec<GridPos> = (0..room.doorways.len())
            .filter_map(|i| room.doorway_world_position(i))
            .collect();
        for pair in doors.windows(2) {
            match build_path(room, &grid, pair[0], pair[1], settings.cell_size) {
                Some(path) => {
                    door_paths += 1;
                    if verbose {
                        println!(
                            "  {:<10} {:?} -> {:?}: {} steps",
                            room.id,
                            pair[0],
                            pair[1],
                            path.len()
                        );
                    }
                }
                None => door_failures.push(format!("{}: {:?} -> {:?}", room.id, pair[0], pair[1])),
            }
        }

        // Every spawn point can reach the room's first doorway.
        let Some(&exit) = doors.first() else {
            continue;
        };
        for &spawn in &room.spawn_positions {
            let spawn_world = room.local_to_world(spawn);
            match plan_chase_path(room, &grid, spawn_world, exit, settings.cell_size) {
                Some(_) => chase_paths += 1,
                None => chase_failures.push(format!("{}: spawn {:?}", room.id, spawn)),
            }
        }
    }

    results.push(TestResult {
        name: "doorway_to_doorway_paths".into(),
        passed: door_failures.is_empty(),
        detail: if door_failures.is_empty() {
            format!("{} paths in {} rooms", door_paths, layout.len())
        } else {
            door_failures.join("; ")
        },
    });
    results.push(TestResult {
        name: "spawn_chase_paths".into(),
        passed: chase_failures.is_empty(),
        detail: if chase_failures.is_empty() {
            format!("{} spawn points reach an exit", chase_paths)
        } else {
            chase_failures.join("; ")
        },
    });
    results
}

// ── 6. Chase policy ─────────────────────────────────────────────────────

fn validate_chase_policy(config: &DelverConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Chase Policy ---");
    let mut results = Vec::new();
    let chase = &config.chase;
    let spread = u64::from(chase.target_frame_rate_to_spread_pathfinding_over.max(1));
    let dt = 1.0 / spread as f32;
    let frames = spread * 10;
    let enemy_count = 8;

    let mut trackers: Vec<PathRebuildTracker> = (0..enemy_count)
        .map(|i| PathRebuildTracker::new(i, chase))
        .collect();
    let mut rebuild_frames: Vec<Vec<u64>> = vec![Vec::new(); enemy_count];
    let own = WorldPos::new(0.0, 0.0);

    for frame in 0..frames {
        // Player walks away from the enemies at one cell per second.
        let target = cell_center(GridPos::new((frame / spread) as i32, 0), 1.0);
        for (i, tracker) in trackers.iter_mut().enumerate() {
            if tracker.should_rebuild(chase, frame, dt, own, target, 50.0) {
                rebuild_frames[i].push(frame);
            }
        }
    }

    let off_slot = rebuild_frames
        .iter()
        .zip(&trackers)
        .flat_map(|(f, t)| f.iter().map(move |&frame| (frame, t.update_frame())))
        .filter(|&(frame, slot)| frame % spread != u64::from(slot))
        .count();
    results.push(TestResult {
        name: "rebuilds_on_own_frame_slot".into(),
        passed: off_slot == 0,
        detail: format!("{} off-slot rebuilds", off_slot),
    });

    let max_rebuilds = rebuild_frames.iter().map(Vec::len).max().unwrap_or(0);
    let bound = frames as usize / spread as usize;
    results.push(TestResult {
        name: "rebuilds_are_throttled".into(),
        passed: max_rebuilds > 0 && max_rebuilds <= bound,
        detail: format!("at most {} rebuilds per enemy over {} frames", max_rebuilds, frames),
    });

    if verbose {
        for (i, f) in rebuild_frames.iter().enumerate() {
            println!("  enemy {}: rebuilt on frames {:?}", i, f);
        }
    }
    results
}

// ── 7. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(
    level: &LevelDefinition,
    config: &DelverConfig,
    seed: u64,
) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let run = || {
        generate_dungeon(level, &config.generation, &mut StdRng::seed_from_u64(seed)).map(
            |layout| {
                layout
                    .rooms
                    .iter()
                    .map(|r| (r.id.clone(), r.template_id.clone(), r.bounds()))
                    .collect::<Vec<_>>()
            },
        )
    };
    let a = run();
    let b = run();
    vec![TestResult {
        name: "same_seed_same_layout".into(),
        passed: a.is_ok() && a == b,
        detail: format!("seed {}", seed),
    }]
}
