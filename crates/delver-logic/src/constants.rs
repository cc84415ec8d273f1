//! Tuning constants: build budgets, movement penalties and chase timing.
//!
//! Plain `const` values with no engine dependency. [`crate::config`] uses
//! these as its defaults; the layout engine and pathfinder read them only
//! through the config structs.

pub mod build {
    /// Number of node graphs tried before generation gives up.
    pub const MAX_DUNGEON_BUILD_ATTEMPTS: u32 = 10;
    /// Full rebuilds of a single node graph before another graph is picked.
    pub const MAX_DUNGEON_REBUILD_ATTEMPTS_FOR_ROOM_GRAPH: u32 = 1000;
    /// Corridors leading out of one room. 3 is allowed but makes layouts
    /// fail far more often since the rooms rarely fit together.
    pub const MAX_CHILD_CORRIDORS: usize = 3;
}

pub mod pathing {
    /// Penalty for an ordinary floor tile.
    pub const DEFAULT_MOVEMENT_PENALTY: u32 = 40;
    /// Penalty for tiles painted as a preferred path.
    pub const PREFERRED_PATH_MOVEMENT_PENALTY: u32 = 1;
    /// Penalty value that marks a cell as impassable.
    pub const IMPASSABLE: u32 = 0;
    /// Cost of an orthogonal step.
    pub const ORTHOGONAL_STEP_COST: u32 = 10;
    /// Cost of a diagonal step (√2 × 10, rounded).
    pub const DIAGONAL_STEP_COST: u32 = 14;
    /// World units per grid cell.
    pub const CELL_SIZE: f32 = 1.0;
}

pub mod chase {
    /// Distance the target must move before an enemy rebuilds its path.
    pub const PLAYER_MOVE_DISTANCE_TO_REBUILD_PATH: f32 = 3.0;
    /// Seconds between forced path rebuilds.
    pub const ENEMY_PATH_REBUILD_COOLDOWN: f32 = 2.0;
    /// Enemies are spread over this many frames when rebuilding paths.
    pub const TARGET_FRAME_RATE_TO_SPREAD_PATHFINDING_OVER: u32 = 60;
}

pub mod tiles {
    pub const WALL: char = '#';
    pub const FLOOR: char = '.';
    pub const PREFERRED_PATH: char = '=';
    pub const VOID: char = ' ';
}
