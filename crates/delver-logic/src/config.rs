//! Tunable settings for generation, pathfinding and enemy chasing.
//!
//! Every field has a default taken from [`crate::constants`], so a config
//! file only needs to name the values it changes:
//!
//! ```
//! use delver_logic::config::{validate_config, DelverConfig};
//!
//! let config = DelverConfig::from_json(r#"{ "generation": { "max_dungeon_build_attempts": 3 } }"#)
//!     .unwrap();
//! assert_eq!(config.generation.max_dungeon_build_attempts, 3);
//! assert_eq!(config.generation.max_dungeon_rebuild_attempts_for_room_graph, 1000);
//! assert!(validate_config(&config).is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{build, chase, pathing};

/// Attempt budgets for the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub max_dungeon_build_attempts: u32,
    pub max_dungeon_rebuild_attempts_for_room_graph: u32,
    /// Only used when validating graphs.
    pub max_child_corridors: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_dungeon_build_attempts: build::MAX_DUNGEON_BUILD_ATTEMPTS,
            max_dungeon_rebuild_attempts_for_room_graph:
                build::MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH,
            max_child_corridors: build::MAX_CHILD_CORRIDORS,
        }
    }
}

/// Cost grid construction and waypoint placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingSettings {
    pub default_movement_penalty: u32,
    pub preferred_path_movement_penalty: u32,
    pub cell_size: f32,
}

impl Default for PathfindingSettings {
    fn default() -> Self {
        Self {
            default_movement_penalty: pathing::DEFAULT_MOVEMENT_PENALTY,
            preferred_path_movement_penalty: pathing::PREFERRED_PATH_MOVEMENT_PENALTY,
            cell_size: pathing::CELL_SIZE,
        }
    }
}

/// When an enemy re-runs the pathfinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseSettings {
    pub player_move_distance_to_rebuild_path: f32,
    pub enemy_path_rebuild_cooldown: f32,
    pub target_frame_rate_to_spread_pathfinding_over: u32,
}

impl Default for ChaseSettings {
    fn default() -> Self {
        Self {
            player_move_distance_to_rebuild_path: chase::PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH,
            enemy_path_rebuild_cooldown: chase::ENEMY_PATH_REBUILD_COOLDOWN,
            target_frame_rate_to_spread_pathfinding_over:
                chase::TARGET_FRAME_RATE_TO_SPREAD_PATHFINDING_OVER,
        }
    }
}

/// All settings, grouped by subsystem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelverConfig {
    pub generation: GenerationSettings,
    pub pathfinding: PathfindingSettings,
    pub chase: ChaseSettings,
}

impl DelverConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Generation could never run.
    ZeroBuildAttempts,
    ZeroRebuildAttempts,
    /// A zero penalty would make every floor tile a wall.
    ZeroDefaultPenalty,
    ZeroPreferredPenalty,
    /// Preferred paths must be cheaper than ordinary floor.
    PreferredNotCheaper { preferred: u32, default: u32 },
    InvalidCellSize(f32),
    NegativeCooldown(f32),
    NegativeRebuildDistance(f32),
    ZeroFrameSpread,
}

/// Validate a configuration, returning all errors found.
pub fn validate_config(config: &DelverConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let generation = &config.generation;
    if generation.max_dungeon_build_attempts == 0 {
        errors.push(ConfigError::ZeroBuildAttempts);
    }
    if generation.max_dungeon_rebuild_attempts_for_room_graph == 0 {
        errors.push(ConfigError::ZeroRebuildAttempts);
    }

    let pathfinding = &config.pathfinding;
    if pathfinding.default_movement_penalty == 0 {
        errors.push(ConfigError::ZeroDefaultPenalty);
    }
    if pathfinding.preferred_path_movement_penalty == 0 {
        errors.push(ConfigError::ZeroPreferredPenalty);
    }
    if pathfinding.preferred_path_movement_penalty >= pathfinding.default_movement_penalty
        && pathfinding.default_movement_penalty > 0
    {
        errors.push(ConfigError::PreferredNotCheaper {
            preferred: pathfinding.preferred_path_movement_penalty,
            default: pathfinding.default_movement_penalty,
        });
    }
    if !(pathfinding.cell_size.is_finite() && pathfinding.cell_size > 0.0) {
        errors.push(ConfigError::InvalidCellSize(pathfinding.cell_size));
    }

    let chase = &config.chase;
    if chase.enemy_path_rebuild_cooldown < 0.0 {
        errors.push(ConfigError::NegativeCooldown(chase.enemy_path_rebuild_cooldown));
    }
    if chase.player_move_distance_to_rebuild_path < 0.0 {
        errors.push(ConfigError::NegativeRebuildDistance(
            chase.player_move_distance_to_rebuild_path,
        ));
    }
    if chase.target_frame_rate_to_spread_pathfinding_over == 0 {
        errors.push(ConfigError::ZeroFrameSpread);
    }

    errors
}
