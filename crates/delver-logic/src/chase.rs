//! Enemy chase policy: when to re-run the pathfinder.
//!
//! Rebuilding every frame for every enemy is wasteful, so each enemy gets a
//! frame slot and only reconsiders its path on that slot. A rebuild then
//! happens when the cooldown has run out or the target has moved far enough
//! since the last rebuild.

use crate::config::ChaseSettings;
use crate::cost_grid::CostGrid;
use crate::geometry::{GridPos, WorldPos};
use crate::layout::Room;
use crate::pathfinding::{build_path, Path};

/// Frame slot for the enemy spawned `spawn_index`-th in a room.
pub fn update_frame_for(spawn_index: usize, spread: u32) -> u32 {
    (spawn_index % spread.max(1) as usize) as u32
}

/// Per-enemy rebuild state.
#[derive(Debug, Clone, PartialEq)]
pub struct PathRebuildTracker {
    update_frame: u32,
    cooldown_remaining: f32,
    reference_target: Option<WorldPos>,
    chasing: bool,
}

impl PathRebuildTracker {
    pub fn new(spawn_index: usize, settings: &ChaseSettings) -> Self {
        Self {
            update_frame: update_frame_for(
                spawn_index,
                settings.target_frame_rate_to_spread_pathfinding_over,
            ),
            cooldown_remaining: 0.0,
            reference_target: None,
            chasing: false,
        }
    }

    pub fn update_frame(&self) -> u32 {
        self.update_frame
    }

    pub fn is_chasing(&self) -> bool {
        self.chasing
    }

    /// Advance by one frame of `dt` seconds and report whether the enemy at
    /// `own` should rebuild its path toward `target` now.
    ///
    /// Chasing starts the first time the target comes within
    /// `chase_distance` and never stops.
    pub fn should_rebuild(
        &mut self,
        settings: &ChaseSettings,
        frame: u64,
        dt: f32,
        own: WorldPos,
        target: WorldPos,
        chase_distance: f32,
    ) -> bool {
        self.cooldown_remaining -= dt;

        if !self.chasing && own.distance(target) < chase_distance {
            self.chasing = true;
        }
        if !self.chasing {
            return false;
        }

        let spread = u64::from(settings.target_frame_rate_to_spread_pathfinding_over.max(1));
        if frame % spread != u64::from(self.update_frame) {
            return false;
        }

        let target_moved = self.reference_target.map_or(true, |r| {
            r.distance(target) > settings.player_move_distance_to_rebuild_path
        });
        if self.cooldown_remaining <= 0.0 || target_moved {
            self.cooldown_remaining = settings.enemy_path_rebuild_cooldown;
            self.reference_target = Some(target);
            return true;
        }
        false
    }
}

/// Plan a chase path from `enemy_cell` toward `target_cell` in `room`.
///
/// A target standing on a blocked cell is swapped for its nearest passable
/// neighbour. The enemy's own cell is dropped from the front of the path.
pub fn plan_chase_path(
    room: &Room,
    grid: &CostGrid,
    enemy_cell: GridPos,
    target_cell: GridPos,
    cell_size: f32,
) -> Option<Path> {
    let origin = room.template_lower_bounds;
    let grid_target = room.world_to_local(target_cell) - origin;
    let adjusted = room.local_to_world(grid.nearest_passable(grid_target) + origin);

    let mut path = build_path(room, grid, enemy_cell, adjusted, cell_size)?;
    path.skip_current_cell();
    Some(path)
}
