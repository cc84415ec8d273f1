//! Room archetypes and the catalog the layout engine draws them from.
//!
//! Templates are static data: bounds in template-local tile coordinates,
//! doorways on the perimeter, spawn points, and optional tile rows used to
//! build the room's [`CostGrid`](crate::cost_grid::CostGrid).

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, GridPos, Orientation};

/// Room-type tag shared by graph nodes and templates.
///
/// Graphs only use the generic [`RoomType::Corridor`]; templates come in the
/// two oriented corridor kinds and the layout engine picks one based on the
/// parent doorway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    None,
    Entrance,
    Corridor,
    CorridorNs,
    CorridorEw,
    SmallRoom,
    MediumRoom,
    LargeRoom,
    ChestRoom,
    BossRoom,
}

impl RoomType {
    pub fn is_entrance(self) -> bool {
        self == RoomType::Entrance
    }

    /// Any corridor kind, generic or oriented.
    pub fn is_corridor(self) -> bool {
        matches!(
            self,
            RoomType::Corridor | RoomType::CorridorNs | RoomType::CorridorEw
        )
    }

    /// Oriented corridor template for a generic corridor attached to a
    /// doorway facing `orientation`.
    pub fn corridor_for(orientation: Orientation) -> RoomType {
        if orientation.is_north_south() {
            RoomType::CorridorNs
        } else {
            RoomType::CorridorEw
        }
    }
}

/// Connection state of one doorway on one room instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorwayState {
    /// Free to be tried.
    #[default]
    Unconnected,
    /// Joined to a doorway on a neighbouring room. Never tried again.
    Connected,
    /// Tried and failed; excluded from further attempts on this room.
    Unavailable,
}

/// A three-tile opening on a room's perimeter. `position` is the middle tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doorway {
    pub position: GridPos,
    pub orientation: Orientation,
    #[serde(default)]
    pub state: DoorwayState,
}

impl Doorway {
    pub fn new(position: GridPos, orientation: Orientation) -> Self {
        Self {
            position,
            orientation,
            state: DoorwayState::Unconnected,
        }
    }

    pub fn is_available(&self) -> bool {
        self.state == DoorwayState::Unconnected
    }

    pub fn is_connected(&self) -> bool {
        self.state == DoorwayState::Connected
    }
}

/// A placeable room archetype.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomTemplate {
    pub id: String,
    pub room_type: RoomType,
    pub lower_bounds: GridPos,
    pub upper_bounds: GridPos,
    pub doorways: Vec<Doorway>,
    #[serde(default)]
    pub spawn_positions: Vec<GridPos>,
    /// Tile rows, top row first. Empty means an all-floor room.
    #[serde(default)]
    pub tiles: Vec<String>,
}

impl RoomTemplate {
    pub fn new(
        id: impl Into<String>,
        room_type: RoomType,
        lower_bounds: GridPos,
        upper_bounds: GridPos,
        doorways: Vec<Doorway>,
    ) -> Self {
        Self {
            id: id.into(),
            room_type,
            lower_bounds,
            upper_bounds,
            doorways,
            spawn_positions: Vec::new(),
            tiles: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.lower_bounds, self.upper_bounds)
    }
}

/// Templates for one level, keyed by id and kept in load order so random
/// selection is reproducible for a given seed.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<RoomTemplate>,
    by_id: HashMap<String, usize>,
}

impl TemplateCatalog {
    /// Build a catalog. Later templates reusing an id are skipped.
    pub fn from_templates(templates: impl IntoIterator<Item = RoomTemplate>) -> Self {
        let mut catalog = Self::default();
        for template in templates {
            if catalog.by_id.contains_key(&template.id) {
                log::warn!("Duplicate room template id '{}' skipped", template.id);
                continue;
            }
            catalog
                .by_id
                .insert(template.id.clone(), catalog.templates.len());
            catalog.templates.push(template);
        }
        catalog
    }

    pub fn get(&self, id: &str) -> Option<&RoomTemplate> {
        self.by_id.get(id).map(|&i| &self.templates[i])
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomTemplate> {
        self.templates.iter()
    }

    pub fn has_type(&self, room_type: RoomType) -> bool {
        self.templates.iter().any(|t| t.room_type == room_type)
    }

    /// Pick a random template of `room_type`, or `None` if there is none.
    pub fn random_of_type<R: Rng + ?Sized>(
        &self,
        room_type: RoomType,
        rng: &mut R,
    ) -> Option<&RoomTemplate> {
        let matching: Vec<&RoomTemplate> = self
            .templates
            .iter()
            .filter(|t| t.room_type == room_type)
            .collect();
        matching.choose(rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn template(id: &str, room_type: RoomType) -> RoomTemplate {
        RoomTemplate::new(
            id,
            room_type,
            GridPos::new(0, 0),
            GridPos::new(4, 4),
            vec![Doorway::new(GridPos::new(2, 4), Orientation::North)],
        )
    }

    #[test]
    fn corridor_kind_follows_doorway_axis() {
        assert_eq!(RoomType::corridor_for(Orientation::North), RoomType::CorridorNs);
        assert_eq!(RoomType::corridor_for(Orientation::South), RoomType::CorridorNs);
        assert_eq!(RoomType::corridor_for(Orientation::East), RoomType::CorridorEw);
        assert_eq!(RoomType::corridor_for(Orientation::West), RoomType::CorridorEw);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let catalog = TemplateCatalog::from_templates(vec![
            template("a", RoomType::SmallRoom),
            template("a", RoomType::BossRoom),
            template("b", RoomType::Entrance),
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a").map(|t| t.room_type), Some(RoomType::SmallRoom));
    }

    #[test]
    fn random_selection_only_returns_matching_type() {
        let catalog = TemplateCatalog::from_templates(vec![
            template("small-1", RoomType::SmallRoom),
            template("small-2", RoomType::SmallRoom),
            template("boss", RoomType::BossRoom),
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let t = catalog
                .random_of_type(RoomType::SmallRoom, &mut rng)
                .expect("small rooms exist");
            assert_eq!(t.room_type, RoomType::SmallRoom);
            seen.insert(t.id.clone());
        }
        assert_eq!(seen.len(), 2, "both small templates should be picked");
    }

    #[test]
    fn missing_type_yields_none() {
        let catalog = TemplateCatalog::from_templates(vec![template("e", RoomType::Entrance)]);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(catalog.random_of_type(RoomType::BossRoom, &mut rng).is_none());
        assert!(!catalog.has_type(RoomType::BossRoom));
    }

    #[test]
    fn doorway_state_defaults_when_absent_from_json() {
        let json = r#"{ "position": { "x": 1, "y": 2 }, "orientation": "west" }"#;
        let doorway: Doorway = serde_json::from_str(json).unwrap();
        assert_eq!(doorway.state, DoorwayState::Unconnected);
        assert!(doorway.is_available());
    }
}
