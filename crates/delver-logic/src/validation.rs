//! Validation for generated dungeon layouts.
//!
//! Pure functions that take a [`DungeonLayout`] and return validation errors.
//! Generation already guarantees these properties; the checks exist so the
//! harness and tests can assert them independently of the engine.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::graph::RoomNodeGraph;
use crate::layout::{DungeonLayout, Room};

/// A validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

// ── Rooms ────────────────────────────────────────────────────────────────

/// Every room must be positioned and sized like its template.
pub fn check_room_placement(layout: &DungeonLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for r in &layout.rooms {
        if !r.is_positioned {
            errors.push(ValidationError {
                category: "room_placement",
                severity: Severity::Error,
                message: format!("Room '{}' was never positioned", r.id),
            });
        }
        let world = r.bounds();
        let local = r.template_bounds();
        if world.width() != local.width() || world.height() != local.height() {
            errors.push(ValidationError {
                category: "room_placement",
                severity: Severity::Error,
                message: format!(
                    "Room '{}' is {}×{} but its template is {}×{}",
                    r.id,
                    world.width(),
                    world.height(),
                    local.width(),
                    local.height()
                ),
            });
        }
    }
    errors
}

/// AABB overlap test over every pair of rooms.
pub fn check_room_overlaps(layout: &DungeonLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = &layout.rooms;
    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let a = &rooms[i];
            let b = &rooms[j];
            if a.bounds().overlaps(&b.bounds()) {
                errors.push(ValidationError {
                    category: "room_overlap",
                    severity: Severity::Error,
                    message: format!("Rooms '{}' and '{}' overlap", a.id, b.id),
                });
            }
        }
    }
    errors
}

// ── Doorways ─────────────────────────────────────────────────────────────

/// Count the connected doorways of `child` that face a connected doorway of
/// `parent` exactly one cell away.
fn aligned_connections(parent: &Room, child: &Room) -> usize {
    child
        .doorways
        .iter()
        .filter(|d| d.is_connected())
        .filter(|cd| {
            let child_world = child.local_to_world(cd.position);
            parent.doorways.iter().any(|pd| {
                pd.is_connected()
                    && pd.orientation == cd.orientation.opposite()
                    && parent.local_to_world(pd.position) + cd.orientation.attachment_offset()
                        == child_world
            })
        })
        .count()
}

/// Every non-entrance room must share exactly one aligned, connected doorway
/// pair with its parent.
pub fn check_doorway_connections(layout: &DungeonLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for child in &layout.rooms {
        let Some(parent_id) = child.parent_id.as_deref() else {
            continue;
        };
        let Some(parent) = layout.room(parent_id) else {
            errors.push(ValidationError {
                category: "doorway",
                severity: Severity::Error,
                message: format!("Room '{}' references missing parent '{}'", child.id, parent_id),
            });
            continue;
        };
        let aligned = aligned_connections(parent, child);
        if aligned != 1 {
            errors.push(ValidationError {
                category: "doorway",
                severity: Severity::Error,
                message: format!(
                    "Room '{}' has {} aligned connections to parent '{}' (expected 1)",
                    child.id, aligned, parent.id
                ),
            });
        }
    }

    for c in &layout.connections {
        let ok = layout
            .room(&c.parent_id)
            .and_then(|r| r.doorways.get(c.parent_doorway))
            .is_some_and(|d| d.is_connected())
            && layout
                .room(&c.child_id)
                .and_then(|r| r.doorways.get(c.child_doorway))
                .is_some_and(|d| d.is_connected());
        if !ok {
            errors.push(ValidationError {
                category: "doorway",
                severity: Severity::Error,
                message: format!(
                    "Connection {}#{} → {}#{} does not join two connected doorways",
                    c.parent_id, c.parent_doorway, c.child_id, c.child_doorway
                ),
            });
        }
    }
    errors
}

// ── Connectivity ─────────────────────────────────────────────────────────

/// Every room must be reachable from the entrance through parent links.
pub fn check_connectivity(layout: &DungeonLayout) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let entrances: Vec<&Room> = layout.rooms.iter().filter(|r| r.is_entrance()).collect();
    if entrances.len() != 1 {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: format!("Layout has {} entrance rooms (expected 1)", entrances.len()),
        });
        return errors;
    }

    let mut adj: HashMap<&str, Vec<&str>> = HashMap::new();
    for r in &layout.rooms {
        if let Some(p) = r.parent_id.as_deref() {
            adj.entry(p).or_default().push(r.id.as_str());
        }
    }

    let start = entrances[0].id.as_str();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        if let Some(children) = adj.get(current) {
            for &next in children {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    let unreached: Vec<&str> = layout
        .rooms
        .iter()
        .map(|r| r.id.as_str())
        .filter(|id| !visited.contains(id))
        .collect();
    if !unreached.is_empty() {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Error,
            message: format!(
                "{} of {} rooms unreachable from the entrance (e.g. '{}')",
                unreached.len(),
                layout.rooms.len(),
                unreached[0]
            ),
        });
    }
    errors
}

/// Every graph node has exactly one room, and nothing else was placed.
pub fn check_graph_coverage(layout: &DungeonLayout, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let placed: HashSet<&str> = layout.rooms.iter().map(|r| r.id.as_str()).collect();
    if placed.len() != layout.rooms.len() {
        errors.push(ValidationError {
            category: "coverage",
            severity: Severity::Error,
            message: "Layout contains duplicate room ids".to_string(),
        });
    }
    for node in &graph.nodes {
        if !placed.contains(node.id.as_str()) {
            errors.push(ValidationError {
                category: "coverage",
                severity: Severity::Error,
                message: format!("Node '{}' ({:?}) has no room", node.id, node.room_type),
            });
        }
    }
    for r in &layout.rooms {
        if graph.node(&r.id).is_none() {
            errors.push(ValidationError {
                category: "coverage",
                severity: Severity::Error,
                message: format!("Room '{}' has no node in graph '{}'", r.id, graph.name),
            });
        }
    }
    errors
}

// ── Master validation ────────────────────────────────────────────────────

/// Run all layout validations and return combined results.
pub fn validate_layout(layout: &DungeonLayout, graph: &RoomNodeGraph) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_room_placement(layout));
    all.extend(check_room_overlaps(layout));
    all.extend(check_doorway_connections(layout));
    all.extend(check_connectivity(layout));
    all.extend(check_graph_coverage(layout, graph));
    all
}
