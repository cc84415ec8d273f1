//! Integration tests for the full dungeon pipeline.
//!
//! Exercises: LevelDefinition → generate_dungeon → validate_layout
//! → CostGrid → build_path
//!
//! All tests are pure logic with no engine and no rendering.

use delver_logic::config::{GenerationSettings, PathfindingSettings};
use delver_logic::cost_grid::CostGrid;
use delver_logic::geometry::{GridPos, Orientation};
use delver_logic::graph::RoomNodeGraph;
use delver_logic::layout::{generate_dungeon, DungeonLayout, GenerationError};
use delver_logic::level::{validate_level, LevelDefinition};
use delver_logic::pathfinding::build_path;
use delver_logic::templates::{Doorway, DoorwayState, RoomTemplate, RoomType};
use delver_logic::validation::{validate_layout, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;

// ── Helpers ────────────────────────────────────────────────────────────

const LEVEL_1: &str = include_str!("../../../data/levels/level_1.json");

fn level_1() -> LevelDefinition {
    LevelDefinition::from_json(LEVEL_1).expect("level_1.json parses")
}

fn door(x: i32, y: i32, o: Orientation) -> Doorway {
    Doorway::new(GridPos::new(x, y), o)
}

fn four_door_entrance() -> RoomTemplate {
    RoomTemplate::new(
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
    )
}

/// Entrance with `children` small rooms hanging directly off it.
fn star_graph(children: usize) -> RoomNodeGraph {
    let mut graph = RoomNodeGraph::new("star").with_node("entrance", RoomType::Entrance);
    for i in 0..children {
        let id = format!("room_{i}");
        graph = graph
            .with_node(id.clone(), RoomType::SmallRoom)
            .with_link("entrance", &id);
    }
    graph
}

/// Four small rooms, each with a single doorway facing a different way.
fn single_door_rooms() -> Vec<RoomTemplate> {
    [
        ("small_n", door(2, 4, Orientation::North)),
        ("small_e", door(4, 2, Orientation::East)),
        ("small_s", door(2, 0, Orientation::South)),
        ("small_w", door(0, 2, Orientation::West)),
    ]
    .into_iter()
    .map(|(id, d)| {
        RoomTemplate::new(id, RoomType::SmallRoom, GridPos::new(0, 0), GridPos::new(4, 4), vec![d])
    })
    .collect()
}

fn assert_layout_valid(level: &LevelDefinition, layout: &DungeonLayout) {
    let graph = level
        .graphs
        .iter()
        .find(|g| g.name == layout.graph_name)
        .expect("layout names one of the level's graphs");
    let errors = validate_layout(layout, graph);
    assert!(errors.is_empty(), "layout errors: {errors:?}");
}

// ── Level data ─────────────────────────────────────────────────────────

#[test]
fn shipped_level_has_no_errors() {
    let level = level_1();
    let settings = GenerationSettings::default();
    let errors: Vec<_> = validate_level(&level, settings.max_child_corridors)
        .into_iter()
        .filter(|e| e.severity == Severity::Error)
        .collect();
    assert!(errors.is_empty(), "level errors: {errors:?}");
}

#[test]
fn shipped_templates_build_cost_grids() {
    let level = level_1();
    let settings = PathfindingSettings::default();
    for template in &level.templates {
        let grid = CostGrid::from_template(template, &settings)
            .unwrap_or_else(|e| panic!("{}: {e}", template.id));
        for d in &template.doorways {
            let cell = d.position - template.lower_bounds;
            assert!(
                grid.is_passable(cell),
                "{} doorway at {:?} is not walkable",
                template.id,
                d.position
            );
        }
    }
}

// ── Generation ─────────────────────────────────────────────────────────

#[test]
fn shipped_level_generates_across_seeds() {
    let level = level_1();
    let settings = GenerationSettings::default();
    for seed in 0..25 {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_dungeon(&level, &settings, &mut rng)
            .unwrap_or_else(|e| panic!("seed {seed}: {e}"));
        assert_eq!(layout.len(), 9, "seed {seed}");
        assert_eq!(layout.rooms[0].room_type, RoomType::Entrance);
        assert_layout_valid(&level, &layout);
    }
}

#[test]
fn generic_corridors_match_parent_doorway_axis() {
    let level = level_1();
    let mut rng = StdRng::seed_from_u64(99);
    let layout = generate_dungeon(&level, &GenerationSettings::default(), &mut rng).unwrap();
    for c in &layout.connections {
        let child = layout.room(&c.child_id).unwrap();
        if !child.room_type.is_corridor() {
            continue;
        }
        let parent = layout.room(&c.parent_id).unwrap();
        let axis = parent.doorways[c.parent_doorway].orientation;
        assert_eq!(child.room_type, RoomType::corridor_for(axis), "{c:?}");
    }
}

#[test]
fn same_seed_same_dungeon() {
    let level = level_1();
    let settings = GenerationSettings::default();
    let a = generate_dungeon(&level, &settings, &mut StdRng::seed_from_u64(7)).unwrap();
    let b = generate_dungeon(&level, &settings, &mut StdRng::seed_from_u64(7)).unwrap();
    assert_eq!(a.graph_name, b.graph_name);
    assert_eq!(a.connections, b.connections);
    let bounds_a: Vec<_> = a.rooms.iter().map(|r| (r.id.clone(), r.bounds())).collect();
    let bounds_b: Vec<_> = b.rooms.iter().map(|r| (r.id.clone(), r.bounds())).collect();
    assert_eq!(bounds_a, bounds_b);
}

#[test]
fn four_single_door_rooms_around_four_door_entrance() {
    let mut templates = vec![four_door_entrance()];
    templates.extend(single_door_rooms());
    let level = LevelDefinition {
        name: "star".into(),
        templates,
        graphs: vec![star_graph(4)],
    };
    let mut rng = StdRng::seed_from_u64(2024);
    let layout = generate_dungeon(&level, &GenerationSettings::default(), &mut rng)
        .expect("a matching arrangement exists");

    assert_eq!(layout.len(), 5);
    let entrance = layout.entrance().unwrap();
    assert!(entrance.doorways.iter().all(|d| d.state == DoorwayState::Connected));
    // Each small room sits against a different side of the entrance.
    let mut used: Vec<Orientation> = layout
        .rooms
        .iter()
        .skip(1)
        .map(|r| r.doorways[0].orientation)
        .collect();
    used.sort_by_key(|o| *o as u8);
    assert_eq!(used, Orientation::ALL.to_vec());
    assert_layout_valid(&level, &layout);
}

#[test]
fn four_door_rooms_always_fit_first_try() {
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
    let level = LevelDefinition {
        name: "star".into(),
        templates: vec![four_door_entrance(), small],
        graphs: vec![star_graph(4)],
    };
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let layout = generate_dungeon(&level, &GenerationSettings::default(), &mut rng).unwrap();
        assert_eq!(layout.rebuild_attempts, 1, "seed {seed}");
        assert_layout_valid(&level, &layout);
    }
}

// ── Termination ────────────────────────────────────────────────────────

#[test]
fn unsatisfiable_graph_exhausts_budget() {
    let mut templates = vec![four_door_entrance()];
    templates.extend(single_door_rooms());
    let level = LevelDefinition {
        name: "crowded".into(),
        templates,
        graphs: vec![star_graph(5)],
    };
    let settings = GenerationSettings {
        max_dungeon_build_attempts: 3,
        max_dungeon_rebuild_attempts_for_room_graph: 20,
        ..GenerationSettings::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let err = generate_dungeon(&level, &settings, &mut rng).unwrap_err();
    assert_eq!(
        err,
        GenerationError::AttemptsExhausted {
            build_attempts: 3,
            total_attempts: 60
        }
    );
}

#[test]
fn graph_without_entrance_is_not_rebuilt() {
    let level = LevelDefinition {
        name: "headless".into(),
        templates: single_door_rooms(),
        graphs: vec![RoomNodeGraph::new("no-entrance").with_node("a", RoomType::SmallRoom)],
    };
    let settings = GenerationSettings {
        max_dungeon_build_attempts: 4,
        ..GenerationSettings::default()
    };
    let err = generate_dungeon(&level, &settings, &mut StdRng::seed_from_u64(0)).unwrap_err();
    assert_eq!(
        err,
        GenerationError::AttemptsExhausted {
            build_attempts: 4,
            total_attempts: 4
        }
    );
}

#[test]
fn level_without_graphs_fails() {
    let level = LevelDefinition {
        name: "empty".into(),
        templates: vec![four_door_entrance()],
        graphs: Vec::new(),
    };
    let mut rng = StdRng::seed_from_u64(0);
    let err = generate_dungeon(&level, &GenerationSettings::default(), &mut rng).unwrap_err();
    assert_eq!(err, GenerationError::NoRoomNodeGraphs("empty".into()));
}

// ── Pathfinding in generated rooms ─────────────────────────────────────

#[test]
fn doorways_are_connected_by_paths_inside_every_room() {
    let level = level_1();
    let catalog = level.catalog();
    let settings = PathfindingSettings::default();
    let mut rng = StdRng::seed_from_u64(5);
    let layout = generate_dungeon(&level, &GenerationSettings::default(), &mut rng).unwrap();

    for room in &layout.rooms {
        let template = catalog.get(&room.template_id).unwrap();
        let grid = CostGrid::from_template(template, &settings).unwrap();
        let doors: Vec<GridPos> = (0..room.doorways.len())
            .filter_map(|i| room.doorway_world_position(i))
            .collect();
        for pair in doors.windows(2) {
            let path = build_path(room, &grid, pair[0], pair[1], settings.cell_size)
                .unwrap_or_else(|| panic!("{}: no path {:?} -> {:?}", room.id, pair[0], pair[1]));
            assert!(path.cells().iter().all(|c| room.bounds().contains(*c)));
            assert_eq!(path.cells().last(), Some(&pair[1]));
        }
    }
}
