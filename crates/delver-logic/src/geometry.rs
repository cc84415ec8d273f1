//! Grid geometry primitives shared by the layout engine and the pathfinder.
//!
//! All rectangles are inclusive integer cell ranges: a room with lower bound
//! `(0, 0)` and upper bound `(4, 2)` covers 5×3 cells. The y axis points
//! north.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::constants::pathing::{DIAGONAL_STEP_COST, ORTHOGONAL_STEP_COST};

/// A cell coordinate on an integer grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const ZERO: GridPos = GridPos { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// True when `other` is one of the 8 cells surrounding `self`.
    pub fn is_neighbor_of(self, other: GridPos) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}

impl Add for GridPos {
    type Output = GridPos;

    fn add(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPos {
    type Output = GridPos;

    fn sub(self, rhs: GridPos) -> GridPos {
        GridPos::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A point in world space (cell centres, movement targets).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f32,
    pub y: f32,
}

impl WorldPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPos) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// The grid cell containing this point.
    pub fn to_cell(self, cell_size: f32) -> GridPos {
        GridPos::new(
            (self.x / cell_size).floor() as i32,
            (self.y / cell_size).floor() as i32,
        )
    }
}

/// Centre of a grid cell in world space.
pub fn cell_center(cell: GridPos, cell_size: f32) -> WorldPos {
    WorldPos::new(
        (cell.x as f32 + 0.5) * cell_size,
        (cell.y as f32 + 0.5) * cell_size,
    )
}

/// Inclusive axis-aligned cell rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: GridPos,
    pub upper: GridPos,
}

impl Bounds {
    pub const fn new(lower: GridPos, upper: GridPos) -> Self {
        Self { lower, upper }
    }

    /// Number of cells along x.
    pub fn width(&self) -> i32 {
        self.upper.x - self.lower.x + 1
    }

    /// Number of cells along y.
    pub fn height(&self) -> i32 {
        self.upper.y - self.lower.y + 1
    }

    pub fn contains(&self, cell: GridPos) -> bool {
        cell.x >= self.lower.x
            && cell.x <= self.upper.x
            && cell.y >= self.lower.y
            && cell.y <= self.upper.y
    }

    /// Both the x and y intervals must overlap. Rectangles sharing a row or
    /// column of cells count as overlapping; rectangles whose edges are one
    /// cell apart do not.
    pub fn overlaps(&self, other: &Bounds) -> bool {
        intervals_overlap(self.lower.x, self.upper.x, other.lower.x, other.upper.x)
            && intervals_overlap(self.lower.y, self.upper.y, other.lower.y, other.upper.y)
    }
}

/// Inclusive integer intervals `[min1, max1]` and `[min2, max2]` overlap.
pub fn intervals_overlap(min1: i32, max1: i32, min2: i32, max2: i32) -> bool {
    min1.max(min2) <= max1.min(max2)
}

/// Compass orientation of a doorway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    pub fn opposite(self) -> Orientation {
        match self {
            Orientation::North => Orientation::South,
            Orientation::East => Orientation::West,
            Orientation::South => Orientation::North,
            Orientation::West => Orientation::East,
        }
    }

    /// Offset from a parent doorway tile to the tile of a child doorway with
    /// this orientation. A child whose doorway faces north sits below its
    /// parent, so its doorway is one cell further south.
    pub fn attachment_offset(self) -> GridPos {
        match self {
            Orientation::North => GridPos::new(0, -1),
            Orientation::East => GridPos::new(-1, 0),
            Orientation::South => GridPos::new(0, 1),
            Orientation::West => GridPos::new(1, 0),
        }
    }

    pub fn is_north_south(self) -> bool {
        matches!(self, Orientation::North | Orientation::South)
    }
}

/// Integer octile distance: 14 per diagonal step, 10 per orthogonal step.
pub fn octile_distance(a: GridPos, b: GridPos) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    if dx > dy {
        DIAGONAL_STEP_COST * dy + ORTHOGONAL_STEP_COST * (dx - dy)
    } else {
        DIAGONAL_STEP_COST * dx + ORTHOGONAL_STEP_COST * (dy - dx)
    }
}
