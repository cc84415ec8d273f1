//! A* pathfinding over a room's cost grid.
//!
//! The search runs on the zero-origin [`CostGrid`] of a single room. Moves go
//! to any of the 8 neighbouring cells; a step costs the octile distance (10
//! orthogonal, 14 diagonal) plus the terrain penalty of the cell entered.
//! Diagonal moves may cut past impassable corners. Costs accumulate as `u64`,
//! so any `u32` penalty is safe on any grid that fits in memory.
//!
//! Every call allocates its own open and closed sets, so searches can run
//! concurrently against shared grids.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::cost_grid::CostGrid;
use crate::geometry::{cell_center, octile_distance, GridPos, WorldPos};
use crate::layout::Room;

/// Open-set entry. Ordered so the max-heap pops lowest `f`, then lowest `h`,
/// then the earliest pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: u64,
    h: u64,
    g: u64,
    seq: u64,
    cell: GridPos,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Find the cheapest cell sequence from `start` to `target`, both inclusive.
///
/// Returns `None` when either end is off-grid or the target cannot be
/// reached. `start == target` yields a single-cell path. The start cell
/// itself is not required to be passable; every other cell on the path is.
pub fn find_cells(grid: &CostGrid, start: GridPos, target: GridPos) -> Option<Vec<GridPos>> {
    if !grid.in_bounds(start) || !grid.in_bounds(target) {
        return None;
    }
    if start == target {
        return Some(vec![start]);
    }

    let width = grid.width();
    let cell_count = width * grid.height();
    let index = |c: GridPos| c.y as usize * width + c.x as usize;

    let mut g_costs = vec![u64::MAX; cell_count];
    let mut parents: Vec<Option<GridPos>> = vec![None; cell_count];
    let mut closed = vec![false; cell_count];
    let mut open = BinaryHeap::new();
    let mut seq = 0u64;

    let h = u64::from(octile_distance(start, target));
    g_costs[index(start)] = 0;
    open.push(OpenNode {
        f: h,
        h,
        g: 0,
        seq,
        cell: start,
    });

    while let Some(current) = open.pop() {
        let current_index = index(current.cell);
        // Stale entry superseded by a cheaper push.
        if closed[current_index] || current.g > g_costs[current_index] {
            continue;
        }
        if current.cell == target {
            return Some(retrace(&parents, index, start, target));
        }
        closed[current_index] = true;

        for (dx, dy) in NEIGHBOR_OFFSETS {
            let next = GridPos::new(current.cell.x + dx, current.cell.y + dy);
            if !grid.in_bounds(next) {
                continue;
            }
            let next_index = index(next);
            if closed[next_index] || !grid.is_passable(next) {
                continue;
            }
            let penalty = u64::from(grid.penalty(next).unwrap_or(0));
            let tentative = current.g + u64::from(octile_distance(current.cell, next)) + penalty;
            if tentative < g_costs[next_index] {
                g_costs[next_index] = tentative;
                parents[next_index] = Some(current.cell);
                let h = u64::from(octile_distance(next, target));
                seq += 1;
                open.push(OpenNode {
                    f: tentative + h,
                    h,
                    g: tentative,
                    seq,
                    cell: next,
                });
            }
        }
    }

    None
}

fn retrace(
    parents: &[Option<GridPos>],
    index: impl Fn(GridPos) -> usize,
    start: GridPos,
    target: GridPos,
) -> Vec<GridPos> {
    let mut cells = vec![target];
    let mut cursor = target;
    while cursor != start {
        match parents[index(cursor)] {
            Some(parent) => {
                cells.push(parent);
                cursor = parent;
            }
            None => break,
        }
    }
    cells.reverse();
    cells
}

/// Sum of step and terrain costs along `cells`, as the search scores it.
pub fn path_cost(grid: &CostGrid, cells: &[GridPos]) -> Option<u64> {
    cells.windows(2).try_fold(0u64, |acc, pair| {
        let step = u64::from(octile_distance(pair[0], pair[1]));
        Some(acc + step + u64::from(grid.penalty(pair[1])?))
    })
}

/// Waypoints from an enemy's cell to its target, consumed front first.
///
/// The first waypoint is the cell the search started from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    cells: Vec<GridPos>,
    waypoints: VecDeque<WorldPos>,
}

impl Path {
    pub fn new(cells: Vec<GridPos>, cell_size: f32) -> Self {
        let waypoints = cells.iter().map(|&c| cell_center(c, cell_size)).collect();
        Self { cells, waypoints }
    }

    /// Drop the first waypoint; the mover is already standing on it.
    pub fn skip_current_cell(&mut self) {
        self.waypoints.pop_front();
    }

    pub fn next_step(&mut self) -> Option<WorldPos> {
        self.waypoints.pop_front()
    }

    pub fn peek(&self) -> Option<WorldPos> {
        self.waypoints.front().copied()
    }

    /// Remaining waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Every world cell the search returned, including consumed ones.
    pub fn cells(&self) -> &[GridPos] {
        &self.cells
    }
}

/// Path between two world cells inside `room`, searched on `grid`.
///
/// Cells are rebased onto the grid through the room's world offset and
/// template lower bound; waypoints come back as world-space cell centres.
pub fn build_path(
    room: &Room,
    grid: &CostGrid,
    start: GridPos,
    target: GridPos,
    cell_size: f32,
) -> Option<Path> {
    let origin = room.template_lower_bounds;
    let start_cell = room.world_to_local(start) - origin;
    let target_cell = room.world_to_local(target) - origin;

    let cells = find_cells(grid, start_cell, target_cell)?;
    let world_cells = cells
        .into_iter()
        .map(|c| room.local_to_world(c + origin))
        .collect();
    Some(Path::new(world_cells, cell_size))
}
