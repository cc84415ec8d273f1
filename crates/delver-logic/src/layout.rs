//! Dungeon layout engine.
//!
//! Turns a [`RoomNodeGraph`] plus a [`TemplateCatalog`] into placed rooms
//! with world-aligned bounds. Placement walks the graph breadth-first from
//! the entrance and attaches each room to a random free doorway of its
//! parent, aligning the facing doorways one cell apart. A candidate that
//! overlaps an existing room burns that parent doorway and another one is
//! tried; when a parent runs out of doorways the whole attempt is thrown away
//! and rebuilt from scratch.
//!
//! [`attempt_build`] is one such attempt and owns all of its state.
//! [`generate_dungeon`] runs attempts inside two bounded retry loops: an
//! outer one choosing a node graph, an inner one rebuilding that graph.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GenerationSettings;
use crate::geometry::{Bounds, GridPos};
use crate::graph::{RoomNode, RoomNodeGraph};
use crate::level::LevelDefinition;
use crate::templates::{Doorway, DoorwayState, RoomTemplate, RoomType, TemplateCatalog};

/// A template bound to a graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Same as the node id.
    pub id: String,
    pub template_id: String,
    pub room_type: RoomType,
    pub template_lower_bounds: GridPos,
    pub template_upper_bounds: GridPos,
    /// World bounds, valid once `is_positioned` is set.
    pub lower_bounds: GridPos,
    pub upper_bounds: GridPos,
    pub doorways: Vec<Doorway>,
    pub spawn_positions: Vec<GridPos>,
    pub parent_id: Option<String>,
    pub child_ids: Vec<String>,
    pub is_positioned: bool,
    pub is_previously_visited: bool,
}

impl Room {
    /// Bind `template` to `node`. Doorways are copied with fresh state and
    /// the room starts at its template bounds.
    pub fn from_template(template: &RoomTemplate, node: &RoomNode) -> Self {
        let doorways = template
            .doorways
            .iter()
            .map(|d| Doorway::new(d.position, d.orientation))
            .collect();
        let parent_id = node.parent_id().map(str::to_string);
        Self {
            id: node.id.clone(),
            template_id: template.id.clone(),
            room_type: template.room_type,
            template_lower_bounds: template.lower_bounds,
            template_upper_bounds: template.upper_bounds,
            lower_bounds: template.lower_bounds,
            upper_bounds: template.upper_bounds,
            doorways,
            spawn_positions: template.spawn_positions.clone(),
            is_previously_visited: parent_id.is_none(),
            parent_id,
            child_ids: node.child_ids.clone(),
            is_positioned: false,
        }
    }

    pub fn is_entrance(&self) -> bool {
        self.parent_id.is_none()
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lower_bounds, self.upper_bounds)
    }

    /// Template-local bounds (the pathfinding grid's extent).
    pub fn template_bounds(&self) -> Bounds {
        Bounds::new(self.template_lower_bounds, self.template_upper_bounds)
    }

    /// Translation from template-local cells to world cells.
    pub fn world_offset(&self) -> GridPos {
        self.lower_bounds - self.template_lower_bounds
    }

    pub fn local_to_world(&self, cell: GridPos) -> GridPos {
        cell + self.world_offset()
    }

    pub fn world_to_local(&self, cell: GridPos) -> GridPos {
        cell - self.world_offset()
    }

    pub fn doorway_world_position(&self, index: usize) -> Option<GridPos> {
        self.doorways
            .get(index)
            .map(|d| self.local_to_world(d.position))
    }

    /// Move the room so that its doorway at `doorway_index` sits one cell
    /// beyond `parent_doorway_world`, away from the parent.
    fn align_to(&mut self, parent_doorway_world: GridPos, doorway_index: usize) {
        let doorway = &self.doorways[doorway_index];
        let lower = parent_doorway_world + doorway.orientation.attachment_offset()
            + self.template_lower_bounds
            - doorway.position;
        self.lower_bounds = lower;
        self.upper_bounds = lower + (self.template_upper_bounds - self.template_lower_bounds);
    }
}

/// Two doorways joined during placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorConnection {
    pub parent_id: String,
    pub parent_doorway: usize,
    pub child_id: String,
    pub child_doorway: usize,
}

/// Rooms placed so far in one attempt, by id, in placement order.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    order: Vec<String>,
}

impl RoomRegistry {
    pub fn insert(&mut self, room: Room) {
        if !self.rooms.contains_key(&room.id) {
            self.order.push(room.id.clone());
        }
        self.rooms.insert(room.id.clone(), room);
    }

    pub fn get(&self, id: &str) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
        self.order.clear();
    }

    /// True if `bounds` overlaps any positioned room other than `exclude_id`.
    pub fn overlaps_positioned(&self, bounds: &Bounds, exclude_id: &str) -> bool {
        self.rooms
            .values()
            .filter(|r| r.is_positioned && r.id != exclude_id)
            .any(|r| r.bounds().overlaps(bounds))
    }

    /// Rooms in placement order.
    pub fn into_rooms(mut self) -> Vec<Room> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.remove(id))
            .collect()
    }
}

/// Why a single build attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("room node graph '{graph}' has no entrance node")]
    NoEntranceNode { graph: String },

    #[error("no room template of type {0:?}")]
    NoTemplateForType(RoomType),

    #[error("room '{parent_id}' ran out of doorways while placing '{room_id}'")]
    DoorwayExhausted { room_id: String, parent_id: String },

    #[error("room '{room_id}' has no placed parent")]
    MissingParentRoom { room_id: String },
}

impl LayoutError {
    /// Failures that no amount of re-rolling the same graph can fix.
    pub fn is_fatal_for_graph(&self) -> bool {
        matches!(
            self,
            LayoutError::NoEntranceNode { .. } | LayoutError::MissingParentRoom { .. }
        )
    }
}

/// Why generation as a whole failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("level '{0}' has no room node graphs")]
    NoRoomNodeGraphs(String),

    #[error("no dungeon built after {build_attempts} graph choices ({total_attempts} attempts)")]
    AttemptsExhausted {
        build_attempts: u32,
        total_attempts: u32,
    },
}

/// A complete, non-overlapping placement of every node in one graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DungeonLayout {
    pub graph_name: String,
    /// Rooms in placement (breadth-first) order; the entrance comes first.
    pub rooms: Vec<Room>,
    pub connections: Vec<DoorConnection>,
    /// Outer-loop iteration that produced this layout (1-based).
    pub build_attempts: u32,
    /// Rebuilds of the chosen graph, including the successful one.
    pub rebuild_attempts: u32,
}

impl DungeonLayout {
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn entrance(&self) -> Option<&Room> {
        self.rooms.iter().find(|r| r.is_entrance())
    }

    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Room> + 'a {
        self.rooms
            .iter()
            .filter(move |r| r.parent_id.as_deref() == Some(id))
    }

    /// The room whose world bounds contain `cell`.
    pub fn room_containing(&self, cell: GridPos) -> Option<&Room> {
        self.rooms.iter().find(|r| r.bounds().contains(cell))
    }

    /// Rooms intersecting a world-space view rectangle.
    pub fn rooms_in_view<'a>(&'a self, view: &'a Bounds) -> impl Iterator<Item = &'a Room> + 'a {
        self.rooms.iter().filter(move |r| r.bounds().overlaps(view))
    }

    /// Smallest rectangle containing every room.
    pub fn extent(&self) -> Option<Bounds> {
        let first = self.rooms.first()?.bounds();
        Some(self.rooms.iter().skip(1).fold(first, |acc, r| {
            Bounds::new(
                GridPos::new(acc.lower.x.min(r.lower_bounds.x), acc.lower.y.min(r.lower_bounds.y)),
                GridPos::new(acc.upper.x.max(r.upper_bounds.x), acc.upper.y.max(r.upper_bounds.y)),
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// One full breadth-first placement of `graph`.
///
/// Either every node is placed or the attempt is abandoned; nothing from a
/// failed attempt outlives this call.
pub fn attempt_build<R: Rng + ?Sized>(
    graph: &RoomNodeGraph,
    catalog: &TemplateCatalog,
    rng: &mut R,
) -> Result<DungeonLayout, LayoutError> {
    let entrance = graph.entrance().ok_or_else(|| LayoutError::NoEntranceNode {
        graph: graph.name.clone(),
    })?;

    let mut registry = RoomRegistry::default();
    let mut connections = Vec::new();
    let mut queued: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&RoomNode> = VecDeque::new();
    queued.insert(entrance.id.as_str());
    queue.push_back(entrance);

    while let Some(node) = queue.pop_front() {
        // Children go in before the node is placed; they are only dequeued
        // after it, so their parent always exists by then.
        for child in graph.children(node) {
            if queued.insert(child.id.as_str()) {
                queue.push_back(child);
            }
        }

        if node.room_type.is_entrance() {
            let template = catalog
                .random_of_type(node.room_type, rng)
                .ok_or(LayoutError::NoTemplateForType(node.room_type))?;
            let mut room = Room::from_template(template, node);
            room.is_positioned = true;
            registry.insert(room);
        } else {
            let parent_id = node
                .parent_id()
                .filter(|id| registry.contains(id))
                .ok_or_else(|| LayoutError::MissingParentRoom {
                    room_id: node.id.clone(),
                })?;
            let connection =
                place_room_with_no_overlaps(node, parent_id, catalog, &mut registry, rng)?;
            connections.push(connection);
        }
    }

    Ok(DungeonLayout {
        graph_name: graph.name.clone(),
        rooms: registry.into_rooms(),
        connections,
        build_attempts: 1,
        rebuild_attempts: 1,
    })
}

/// Attach a room for `node` to one of the parent's free doorways, trying
/// doorways at random until one fits.
fn place_room_with_no_overlaps<R: Rng + ?Sized>(
    node: &RoomNode,
    parent_id: &str,
    catalog: &TemplateCatalog,
    registry: &mut RoomRegistry,
    rng: &mut R,
) -> Result<DoorConnection, LayoutError> {
    loop {
        let parent = registry
            .get(parent_id)
            .ok_or_else(|| LayoutError::MissingParentRoom {
                room_id: node.id.clone(),
            })?;

        let available: Vec<usize> = parent
            .doorways
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_available())
            .map(|(i, _)| i)
            .collect();
        let Some(&parent_index) = available.choose(rng) else {
            return Err(LayoutError::DoorwayExhausted {
                room_id: node.id.clone(),
                parent_id: parent_id.to_string(),
            });
        };
        let parent_orientation = parent.doorways[parent_index].orientation;
        let parent_doorway_world = parent.local_to_world(parent.doorways[parent_index].position);

        let template_type = if node.room_type == RoomType::Corridor {
            RoomType::corridor_for(parent_orientation)
        } else {
            node.room_type
        };
        let template = catalog
            .random_of_type(template_type, rng)
            .ok_or(LayoutError::NoTemplateForType(template_type))?;
        let mut room = Room::from_template(template, node);

        let wanted = parent_orientation.opposite();
        let placed = room
            .doorways
            .iter()
            .position(|d| d.orientation == wanted)
            .and_then(|child_index| {
                room.align_to(parent_doorway_world, child_index);
                (!registry.overlaps_positioned(&room.bounds(), &room.id)).then_some(child_index)
            });

        let Some(child_index) = placed else {
            set_doorway_state(registry, parent_id, parent_index, DoorwayState::Unavailable);
            continue;
        };

        set_doorway_state(registry, parent_id, parent_index, DoorwayState::Connected);
        room.doorways[child_index].state = DoorwayState::Connected;
        room.is_positioned = true;
        let connection = DoorConnection {
            parent_id: parent_id.to_string(),
            parent_doorway: parent_index,
            child_id: room.id.clone(),
            child_doorway: child_index,
        };
        registry.insert(room);
        return Ok(connection);
    }
}

fn set_doorway_state(
    registry: &mut RoomRegistry,
    room_id: &str,
    index: usize,
    state: DoorwayState,
) {
    if let Some(doorway) = registry
        .get_mut(room_id)
        .and_then(|r| r.doorways.get_mut(index))
    {
        doorway.state = state;
    }
}

/// Build a dungeon for `level`, retrying within the configured budgets.
pub fn generate_dungeon<R: Rng + ?Sized>(
    level: &LevelDefinition,
    settings: &GenerationSettings,
    rng: &mut R,
) -> Result<DungeonLayout, GenerationError> {
    if level.graphs.is_empty() {
        log::warn!("Level '{}' has no room node graphs", level.name);
        return Err(GenerationError::NoRoomNodeGraphs(level.name.clone()));
    }
    let catalog = level.catalog();
    let mut total_attempts = 0u32;

    for build_attempt in 1..=settings.max_dungeon_build_attempts {
        let Some(graph) = level.graphs.choose(rng) else {
            break;
        };

        for rebuild_attempt in 1..=settings.max_dungeon_rebuild_attempts_for_room_graph {
            total_attempts += 1;
            match attempt_build(graph, &catalog, rng) {
                Ok(mut layout) => {
                    layout.build_attempts = build_attempt;
                    layout.rebuild_attempts = rebuild_attempt;
                    log::info!(
                        "Built level '{}' from graph '{}': {} rooms after {} attempts",
                        level.name,
                        graph.name,
                        layout.len(),
                        total_attempts
                    );
                    return Ok(layout);
                }
                Err(e) => {
                    log::debug!(
                        "Graph '{}' attempt {}/{} failed: {}",
                        graph.name,
                        rebuild_attempt,
                        settings.max_dungeon_rebuild_attempts_for_room_graph,
                        e
                    );
                    if e.is_fatal_for_graph() {
                        break;
                    }
                }
            }
        }
    }

    log::warn!(
        "Couldn't build level '{}' from its templates and node graphs ({} attempts)",
        level.name,
        total_attempts
    );
    Err(GenerationError::AttemptsExhausted {
        build_attempts: settings.max_dungeon_build_attempts,
        total_attempts,
    })
}
