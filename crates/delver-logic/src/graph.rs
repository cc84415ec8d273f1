//! Room node graphs, the abstract shape of a level.
//!
//! A graph says which rooms a level needs and how they hang off each other,
//! without any geometry. It must be a tree rooted at a single entrance; the
//! layout engine walks it breadth-first so a parent is always placed before
//! its children.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::templates::RoomType;

/// One required room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNode {
    pub id: String,
    pub room_type: RoomType,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub child_ids: Vec<String>,
}

impl RoomNode {
    pub fn new(id: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            id: id.into(),
            room_type,
            parent_ids: Vec::new(),
            child_ids: Vec::new(),
        }
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }
}

/// A named room node graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomNodeGraph {
    pub name: String,
    pub nodes: Vec<RoomNode>,
}

impl RoomNodeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Append a node; returns `self` for chaining.
    pub fn with_node(mut self, id: impl Into<String>, room_type: RoomType) -> Self {
        self.nodes.push(RoomNode::new(id, room_type));
        self
    }

    /// Record `child` under `parent` on both nodes. Unknown ids are ignored
    /// here and reported by [`validate_graph`].
    pub fn with_link(mut self, parent: &str, child: &str) -> Self {
        if let Some(p) = self.nodes.iter_mut().find(|n| n.id == parent) {
            p.child_ids.push(child.to_string());
        }
        if let Some(c) = self.nodes.iter_mut().find(|n| n.id == child) {
            c.parent_ids.push(parent.to_string());
        }
        self
    }

    pub fn node(&self, id: &str) -> Option<&RoomNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// The first node of type [`RoomType::Entrance`].
    pub fn entrance(&self) -> Option<&RoomNode> {
        self.nodes.iter().find(|n| n.room_type.is_entrance())
    }

    /// Children of `node` in declaration order. Dangling ids are skipped.
    pub fn children<'a>(&'a self, node: &'a RoomNode) -> impl Iterator<Item = &'a RoomNode> + 'a {
        node.child_ids.iter().filter_map(move |id| self.node(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A structural problem with a node graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    NoEntrance,
    MultipleEntrances(usize),
    DuplicateNodeId(String),
    /// Nodes of type `None` cannot be placed.
    UntypedNode(String),
    TooManyParents(String),
    EntranceHasParent(String),
    MissingParent(String),
    DanglingLink { from: String, to: String },
    /// Parent lists a child that does not list the parent back, or vice versa.
    AsymmetricLink { parent: String, child: String },
    Unreachable(String),
    CorridorWithMultipleChildren(String),
    TooManyChildCorridors { node: String, count: usize },
}

/// Check that a graph is a tree the layout engine can walk.
pub fn validate_graph(graph: &RoomNodeGraph, max_child_corridors: usize) -> Vec<GraphError> {
    let mut errors = Vec::new();

    let mut by_id: HashMap<&str, &RoomNode> = HashMap::new();
    for node in &graph.nodes {
        if by_id.insert(node.id.as_str(), node).is_some() {
            errors.push(GraphError::DuplicateNodeId(node.id.clone()));
        }
    }

    let entrances: Vec<&RoomNode> = graph
        .nodes
        .iter()
        .filter(|n| n.room_type.is_entrance())
        .collect();
    match entrances.len() {
        0 => errors.push(GraphError::NoEntrance),
        1 => {}
        n => errors.push(GraphError::MultipleEntrances(n)),
    }

    for node in &graph.nodes {
        if node.room_type == RoomType::None {
            errors.push(GraphError::UntypedNode(node.id.clone()));
        }

        if node.room_type.is_entrance() {
            if !node.parent_ids.is_empty() {
                errors.push(GraphError::EntranceHasParent(node.id.clone()));
            }
        } else if node.parent_ids.is_empty() {
            errors.push(GraphError::MissingParent(node.id.clone()));
        } else if node.parent_ids.len() > 1 {
            errors.push(GraphError::TooManyParents(node.id.clone()));
        }

        for child_id in &node.child_ids {
            match by_id.get(child_id.as_str()) {
                None => errors.push(GraphError::DanglingLink {
                    from: node.id.clone(),
                    to: child_id.clone(),
                }),
                Some(child) if !child.parent_ids.contains(&node.id) => {
                    errors.push(GraphError::AsymmetricLink {
                        parent: node.id.clone(),
                        child: child_id.clone(),
                    })
                }
                Some(_) => {}
            }
        }
        for parent_id in &node.parent_ids {
            match by_id.get(parent_id.as_str()) {
                None => errors.push(GraphError::DanglingLink {
                    from: node.id.clone(),
                    to: parent_id.clone(),
                }),
                Some(parent) if !parent.child_ids.contains(&node.id) => {
                    errors.push(GraphError::AsymmetricLink {
                        parent: parent_id.clone(),
                        child: node.id.clone(),
                    })
                }
                Some(_) => {}
            }
        }

        let corridor_children = node
            .child_ids
            .iter()
            .filter_map(|id| by_id.get(id.as_str()))
            .filter(|c| c.room_type.is_corridor())
            .count();
        if node.room_type.is_corridor() {
            if node.child_ids.len() > 1 {
                errors.push(GraphError::CorridorWithMultipleChildren(node.id.clone()));
            }
        } else if corridor_children > max_child_corridors {
            errors.push(GraphError::TooManyChildCorridors {
                node: node.id.clone(),
                count: corridor_children,
            });
        }
    }

    if let Some(entrance) = entrances.first() {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(entrance.id.as_str());
        queue.push_back(*entrance);
        while let Some(current) = queue.pop_front() {
            for child in graph.children(current) {
                if visited.insert(child.id.as_str()) {
                    queue.push_back(child);
                }
            }
        }
        for node in &graph.nodes {
            if !visited.contains(node.id.as_str()) {
                errors.push(GraphError::Unreachable(node.id.clone()));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::build::MAX_CHILD_CORRIDORS;

    fn simple_graph() -> RoomNodeGraph {
        RoomNodeGraph::new("simple")
            .with_node("entrance", RoomType::Entrance)
            .with_node("c1", RoomType::Corridor)
            .with_node("room", RoomType::SmallRoom)
            .with_link("entrance", "c1")
            .with_link("c1", "room")
    }

    #[test]
    fn well_formed_graph_is_valid() {
        let errors = validate_graph(&simple_graph(), MAX_CHILD_CORRIDORS);
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn builder_links_both_directions() {
        let g = simple_graph();
        let c1 = g.node("c1").unwrap();
        assert_eq!(c1.parent_id(), Some("entrance"));
        assert_eq!(c1.child_ids, vec!["room".to_string()]);
        let children: Vec<&str> = g
            .children(g.entrance().unwrap())
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(children, vec!["c1"]);
    }

    #[test]
    fn missing_entrance() {
        let g = RoomNodeGraph::new("none").with_node("a", RoomType::SmallRoom);
        let errors = validate_graph(&g, MAX_CHILD_CORRIDORS);
        assert!(errors.contains(&GraphError::NoEntrance));
    }

    #[test]
    fn two_entrances() {
        let g = RoomNodeGraph::new("two")
            .with_node("a", RoomType::Entrance)
            .with_node("b", RoomType::Entrance);
        let errors = validate_graph(&g, MAX_CHILD_CORRIDORS);
        assert!(errors.contains(&GraphError::MultipleEntrances(2)));
    }

    #[test]
    fn orphan_is_unreachable() {
        let g = simple_graph().with_node("orphan", RoomType::BossRoom);
        let errors = validate_graph(&g, MAX_CHILD_CORRIDORS);
        assert!(errors.contains(&GraphError::Unreachable("orphan".into())));
        assert!(errors.contains(&GraphError::MissingParent("orphan".into())));
    }

    #[test]
    fn dangling_child_reference() {
        let mut g = simple_graph();
        g.nodes[2].child_ids.push("ghost".into());
        let errors = validate_graph(&g, MAX_CHILD_CORRIDORS);
        assert!(errors.contains(&GraphError::DanglingLink {
            from: "room".into(),
            to: "ghost".into()
        }));
    }

    #[test]
    fn one_sided_link_is_asymmetric() {
        let mut g = simple_graph();
        g.nodes[2].parent_ids.clear();
        let errors = validate_graph(&g, MAX_CHILD_CORRIDORS);
        assert!(errors.contains(&GraphError::AsymmetricLink {
            parent: "c1".into(),
            child: "room".into()
        }));
    }

    #[test]
    fn corridor_fan_out_limits() {
        let g = RoomNodeGraph::new("fan")
            .with_node("e", RoomType::Entrance)
            .with_node("c1", RoomType::Corridor)
            .with_node("c2", RoomType::Corridor)
            .with_node("r1", RoomType::SmallRoom)
            .with_node("r2", RoomType::SmallRoom)
            .with_link("e", "c1")
            .with_link("e", "c2")
            .with_link("c1", "r1")
            .with_link("c1", "r2");
        let errors = validate_graph(&g, 1);
        assert!(errors.contains(&GraphError::CorridorWithMultipleChildren("c1".into())));
        assert!(errors.contains(&GraphError::TooManyChildCorridors {
            node: "e".into(),
            count: 2
        }));
    }

    #[test]
    fn graph_round_trips_through_json() {
        let json = serde_json::to_string(&simple_graph()).unwrap();
        let back: RoomNodeGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.nodes, simple_graph().nodes);
    }
}
