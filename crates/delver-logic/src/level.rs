//! Level definitions: the templates and candidate node graphs for one
//! dungeon level, loaded from JSON.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{validate_graph, RoomNodeGraph};
use crate::templates::{RoomTemplate, RoomType, TemplateCatalog};
use crate::validation::{Severity, ValidationError};

/// Everything the layout engine needs to build one level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub name: String,
    pub templates: Vec<RoomTemplate>,
    /// One is picked at random per build attempt.
    pub graphs: Vec<RoomNodeGraph>,
}

/// Errors that can occur when loading level data.
#[derive(Debug, Error)]
pub enum LevelError {
    /// File could not be read.
    #[error("Failed to read level file '{path}': {details}")]
    Read { path: String, details: String },

    /// JSON parsing failed.
    #[error("Parse error in level '{source_name}': {details}")]
    Parse { source_name: String, details: String },
}

impl LevelDefinition {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        Self::parse(json, "<inline>")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| LevelError::Read {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::parse(&text, &path.display().to_string())
    }

    fn parse(json: &str, source_name: &str) -> Result<Self, LevelError> {
        serde_json::from_str(json).map_err(|e| LevelError::Parse {
            source_name: source_name.to_string(),
            details: e.to_string(),
        })
    }

    /// The level's templates as a lookup catalog.
    pub fn catalog(&self) -> TemplateCatalog {
        TemplateCatalog::from_templates(self.templates.iter().cloned())
    }
}

/// Check that every graph can be satisfied by the level's templates and is
/// itself a well-formed tree.
pub fn validate_level(level: &LevelDefinition, max_child_corridors: usize) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if level.name.trim().is_empty() {
        errors.push(ValidationError {
            category: "level",
            severity: Severity::Warning,
            message: "Level has an empty name".to_string(),
        });
    }
    if level.graphs.is_empty() {
        errors.push(ValidationError {
            category: "level",
            severity: Severity::Error,
            message: format!("Level '{}' lists no room node graphs", level.name),
        });
    }

    let mut seen_ids = HashSet::new();
    for t in &level.templates {
        if !seen_ids.insert(t.id.as_str()) {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Warning,
                message: format!("Duplicate room template id '{}'", t.id),
            });
        }
        if t.upper_bounds.x < t.lower_bounds.x || t.upper_bounds.y < t.lower_bounds.y {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Error,
                message: format!("Template '{}' has inverted bounds", t.id),
            });
        }
        if t.doorways.is_empty() {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Error,
                message: format!("Template '{}' has no doorways", t.id),
            });
        }
        let bounds = t.bounds();
        for d in t.doorways.iter().filter(|d| !bounds.contains(d.position)) {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Error,
                message: format!(
                    "Template '{}' doorway at ({}, {}) lies outside its bounds",
                    t.id, d.position.x, d.position.y
                ),
            });
        }
        for s in t.spawn_positions.iter().filter(|s| !bounds.contains(**s)) {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Warning,
                message: format!(
                    "Template '{}' spawn position ({}, {}) lies outside its bounds",
                    t.id, s.x, s.y
                ),
            });
        }
    }

    let has_type = |room_type: RoomType| level.templates.iter().any(|t| t.room_type == room_type);
    for (room_type, label) in [
        (RoomType::CorridorEw, "E/W corridor"),
        (RoomType::CorridorNs, "N/S corridor"),
        (RoomType::Entrance, "entrance"),
    ] {
        if !has_type(room_type) {
            errors.push(ValidationError {
                category: "template",
                severity: Severity::Warning,
                message: format!("Level '{}': no {} room template", level.name, label),
            });
        }
    }

    for graph in &level.graphs {
        for e in validate_graph(graph, max_child_corridors) {
            errors.push(ValidationError {
                category: "graph",
                severity: Severity::Error,
                message: format!("Graph '{}': {:?}", graph.name, e),
            });
        }

        let mut reported = HashSet::new();
        for node in &graph.nodes {
            let t = node.room_type;
            // Corridors and the entrance were covered above.
            if t.is_entrance() || t.is_corridor() || t == RoomType::None {
                continue;
            }
            if !has_type(t) && reported.insert(t) {
                errors.push(ValidationError {
                    category: "template",
                    severity: Severity::Error,
                    message: format!(
                        "No room template of type {:?} for node graph '{}'",
                        t, graph.name
                    ),
                });
            }
        }
    }

    errors
}
