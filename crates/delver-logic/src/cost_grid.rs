//! Per-room traversal cost grids.
//!
//! A [`CostGrid`] is indexed by template-local cells rebased to a zero
//! origin: cell `(0, 0)` is the template's lower bound. Each cell carries a
//! static terrain penalty (0 = impassable) and a flag for movable items,
//! which are rebuilt independently of the terrain whenever room contents
//! change.

use thiserror::Error;

use crate::config::PathfindingSettings;
use crate::constants::{pathing, tiles};
use crate::geometry::GridPos;
use crate::templates::RoomTemplate;

/// Failure to turn tile rows into a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("template '{template}' has {found} tile rows, expected {expected}")]
    RowCountMismatch {
        template: String,
        expected: usize,
        found: usize,
    },

    #[error("template '{template}' tile row {row} is {found} wide, expected {expected}")]
    RowWidthMismatch {
        template: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown tile {ch:?} at ({x}, {y})")]
    UnknownTile { ch: char, x: usize, y: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostGrid {
    width: usize,
    height: usize,
    penalties: Vec<u32>,
    item_obstacles: Vec<bool>,
}

impl CostGrid {
    /// A grid with every cell set to `penalty`.
    pub fn filled(width: usize, height: usize, penalty: u32) -> Self {
        Self {
            width,
            height,
            penalties: vec![penalty; width * height],
            item_obstacles: vec![false; width * height],
        }
    }

    /// Build a grid from tile rows, top row first.
    ///
    /// `#` wall, `.` floor, `=` preferred path, space is void.
    pub fn from_rows(rows: &[&str], settings: &PathfindingSettings) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.chars().count());
        Self::parse_rows("<rows>", rows.iter().copied(), width, height, settings)
    }

    /// Build the grid for a room template. Templates without tile rows are
    /// open floor.
    pub fn from_template(
        template: &RoomTemplate,
        settings: &PathfindingSettings,
    ) -> Result<Self, GridError> {
        let bounds = template.bounds();
        let width = bounds.width().max(0) as usize;
        let height = bounds.height().max(0) as usize;
        if template.tiles.is_empty() {
            return Ok(Self::filled(width, height, settings.default_movement_penalty));
        }
        if template.tiles.len() != height {
            return Err(GridError::RowCountMismatch {
                template: template.id.clone(),
                expected: height,
                found: template.tiles.len(),
            });
        }
        Self::parse_rows(
            &template.id,
            template.tiles.iter().map(String::as_str),
            width,
            height,
            settings,
        )
    }

    fn parse_rows<'a>(
        name: &str,
        rows: impl Iterator<Item = &'a str>,
        width: usize,
        height: usize,
        settings: &PathfindingSettings,
    ) -> Result<Self, GridError> {
        let mut grid = Self::filled(width, height, pathing::IMPASSABLE);
        for (row, line) in rows.enumerate() {
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RowWidthMismatch {
                    template: name.to_string(),
                    row,
                    expected: width,
                    found,
                });
            }
            let y = height - 1 - row;
            for (x, ch) in line.chars().enumerate() {
                let penalty = match ch {
                    tiles::FLOOR => settings.default_movement_penalty,
                    tiles::PREFERRED_PATH => settings.preferred_path_movement_penalty,
                    tiles::WALL | tiles::VOID => pathing::IMPASSABLE,
                    _ => return Err(GridError::UnknownTile { ch, x, y }),
                };
                grid.penalties[y * width + x] = penalty;
            }
        }
        Ok(grid)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, cell: GridPos) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    fn index(&self, cell: GridPos) -> Option<usize> {
        self.in_bounds(cell)
            .then(|| cell.y as usize * self.width + cell.x as usize)
    }

    /// Terrain penalty, or `None` off-grid.
    pub fn penalty(&self, cell: GridPos) -> Option<u32> {
        self.index(cell).map(|i| self.penalties[i])
    }

    pub fn set_penalty(&mut self, cell: GridPos, penalty: u32) {
        if let Some(i) = self.index(cell) {
            self.penalties[i] = penalty;
        }
    }

    pub fn has_item_obstacle(&self, cell: GridPos) -> bool {
        self.index(cell).is_some_and(|i| self.item_obstacles[i])
    }

    /// Walkable terrain not covered by an item.
    pub fn is_passable(&self, cell: GridPos) -> bool {
        self.index(cell)
            .is_some_and(|i| self.penalties[i] != pathing::IMPASSABLE && !self.item_obstacles[i])
    }

    /// Replace the item layer with the given footprint cells. Off-grid cells
    /// are ignored.
    pub fn set_item_obstacles(&mut self, cells: impl IntoIterator<Item = GridPos>) {
        self.clear_item_obstacles();
        for cell in cells {
            if let Some(i) = self.index(cell) {
                self.item_obstacles[i] = true;
            }
        }
    }

    pub fn clear_item_obstacles(&mut self) {
        self.item_obstacles.iter_mut().for_each(|o| *o = false);
    }

    /// `cell` if it is passable, otherwise the first passable neighbour
    /// scanning x-1..=x+1, then y-1..=y+1. Falls back to `cell`.
    pub fn nearest_passable(&self, cell: GridPos) -> GridPos {
        if self.is_passable(cell) {
            return cell;
        }
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let candidate = GridPos::new(cell.x + dx, cell.y + dy);
                if self.is_passable(candidate) {
                    return candidate;
                }
            }
        }
        cell
    }

    pub fn passable_count(&self) -> usize {
        (0..self.penalties.len())
            .filter(|&i| self.penalties[i] != pathing::IMPASSABLE && !self.item_obstacles[i])
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Orientation;
    use crate::templates::{Doorway, RoomType};

    fn settings() -> PathfindingSettings {
        PathfindingSettings::default()
    }

    #[test]
    fn rows_are_read_top_first() {
        let grid = CostGrid::from_rows(&["#..", "=.#"], &settings()).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        // Bottom row is y = 0.
        assert_eq!(grid.penalty(GridPos::new(0, 0)), Some(1));
        assert_eq!(grid.penalty(GridPos::new(2, 0)), Some(0));
        assert_eq!(grid.penalty(GridPos::new(0, 1)), Some(0));
        assert_eq!(grid.penalty(GridPos::new(1, 1)), Some(40));
        assert_eq!(grid.penalty(GridPos::new(3, 0)), None);
    }

    #[test]
    fn unknown_glyph() {
        let err = CostGrid::from_rows(&["..", ".x"], &settings()).unwrap_err();
        assert_eq!(err, GridError::UnknownTile { ch: 'x', x: 1, y: 0 });
    }

    #[test]
    fn ragged_rows() {
        let err = CostGrid::from_rows(&["...", ".."], &settings()).unwrap_err();
        assert!(matches!(err, GridError::RowWidthMismatch { row: 1, .. }));
    }

    #[test]
    fn template_without_tiles_is_open_floor() {
        let template = RoomTemplate::new(
            "hall",
            RoomType::MediumRoom,
            GridPos::new(-2, -2),
            GridPos::new(2, 3),
            vec![Doorway::new(GridPos::new(0, 3), Orientation::North)],
        );
        let grid = CostGrid::from_template(&template, &settings()).unwrap();
        assert_eq!((grid.width(), grid.height()), (5, 6));
        assert_eq!(grid.passable_count(), 30);
    }

    #[test]
    fn template_tile_rows_must_match_height() {
        let mut template = RoomTemplate::new(
            "bad",
            RoomType::SmallRoom,
            GridPos::new(0, 0),
            GridPos::new(2, 2),
            Vec::new(),
        );
        template.tiles = vec!["...".into(), "...".into()];
        let err = CostGrid::from_template(&template, &settings()).unwrap_err();
        assert_eq!(
            err,
            GridError::RowCountMismatch {
                template: "bad".into(),
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn items_block_without_touching_terrain() {
        let mut grid = CostGrid::filled(4, 4, 40);
        grid.set_item_obstacles([GridPos::new(1, 1), GridPos::new(9, 9)]);
        assert!(!grid.is_passable(GridPos::new(1, 1)));
        assert_eq!(grid.penalty(GridPos::new(1, 1)), Some(40));
        assert_eq!(grid.passable_count(), 15);

        grid.set_item_obstacles([GridPos::new(2, 2)]);
        assert!(grid.is_passable(GridPos::new(1, 1)));
        assert!(grid.has_item_obstacle(GridPos::new(2, 2)));

        grid.clear_item_obstacles();
        assert_eq!(grid.passable_count(), 16);
    }

    #[test]
    fn nearest_passable_scan_order() {
        let mut grid = CostGrid::filled(5, 5, 40);
        let target = GridPos::new(2, 2);
        grid.set_item_obstacles([target, GridPos::new(1, 1)]);
        // (1,1) is blocked, so the next in scan order is (1,2).
        assert_eq!(grid.nearest_passable(target), GridPos::new(1, 2));

        grid.clear_item_obstacles();
        assert_eq!(grid.nearest_passable(target), target);
    }

    #[test]
    fn nearest_passable_falls_back_to_cell() {
        let grid = CostGrid::filled(3, 3, 0);
        assert_eq!(grid.nearest_passable(GridPos::new(1, 1)), GridPos::new(1, 1));
    }
}
