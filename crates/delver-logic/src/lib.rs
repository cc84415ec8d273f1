//! Pure dungeon logic for Delver.
//!
//! This crate contains the procedural layout engine and the enemy
//! pathfinder, independent of any engine or renderer. Functions take plain
//! data and return results, making them unit-testable and usable from the
//! headless simtest harness as well as any future game client.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`chase`] | Enemy path-rebuild policy (cooldown, target drift, frame slots) |
//! | [`config`] | Generation / pathfinding / chase settings and validation |
//! | [`constants`] | Build budgets, movement penalties, tile glyphs |
//! | [`cost_grid`] | Per-room penalty grids with a movable-item obstacle layer |
//! | [`geometry`] | Grid cells, inclusive bounds, orientations, octile distance |
//! | [`graph`] | Room node graphs and tree validation |
//! | [`layout`] | BFS room placement with doorway matching and bounded retries |
//! | [`level`] | Level definitions loaded from JSON and their validation |
//! | [`pathfinding`] | A* over a cost grid, waypoint paths |
//! | [`templates`] | Room types, doorways, room templates, template catalog |
//! | [`validation`] | Post-generation layout checks (overlap, doorways, reachability) |

pub mod chase;
pub mod config;
pub mod constants;
pub mod cost_grid;
pub mod geometry;
pub mod graph;
pub mod layout;
pub mod level;
pub mod pathfinding;
pub mod templates;
pub mod validation;
