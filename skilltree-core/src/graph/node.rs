//! Graph Nodes
//!
//! This module defines the skill nodes that live in the allocation graph.
//!
//! A node carries two kinds of data. The static part (identity, placement,
//! classification flags, neighbors) is fixed when the tree is loaded. The
//! derived part (allocation, visual state, distances, paths, dependents) is
//! rewritten on every allocation change, and only through [`NodePatch`].

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unique identifier for a skill in the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(u32);

impl SkillId {
    /// Wrap a raw skill number.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw skill number.
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl From<u32> for SkillId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual state shared by nodes and connectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    /// Not allocated and not next to anything allocated.
    #[default]
    Default,

    /// Allocatable (adjacent to an allocated node) or highlighted by a
    /// hover preview.
    Intermediate,

    /// Allocated.
    Active,
}

/// Classification flags read from the tree definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFlags {
    pub is_notable: bool,
    pub is_keystone: bool,
    pub is_mastery: bool,
    pub is_jewel_socket: bool,
    pub is_start_point: bool,
    pub is_proxy: bool,
    pub hidden: bool,
}

/// Screen placement derived from group position and orbit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Neighbor list. Most skills link to at most four others.
pub type Neighbors = SmallVec<[SkillId; 4]>;

/// A skill node in the allocation graph.
#[derive(Debug, Clone)]
pub struct Node {
    skill: SkillId,
    name: String,
    stats: Vec<String>,
    group: u32,
    orbit: u32,
    orbit_index: u32,
    position: Position,
    flags: NodeFlags,

    /// Undirected adjacency, normalized from the definition's `out` and `in`.
    neighbors: Neighbors,

    allocated: bool,
    can_allocate: bool,
    state: NodeState,

    /// Hops to the nearest allocated node, or the sentinel when unreached.
    path_distance: u32,

    /// Nodes to allocate to reach this one, starting with the node itself and
    /// ending next to an allocated node.
    path: Vec<SkillId>,

    /// Allocated nodes that lose their link to the start if this node goes.
    /// Always includes the node itself while it is allocated.
    dependency_of: Vec<SkillId>,

    /// Snapshot of the last cycle's distance from the start node.
    distance_to_start: u32,
}

/// Static description used to build a [`Node`].
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub skill: SkillId,
    pub name: String,
    pub stats: Vec<String>,
    pub group: u32,
    pub orbit: u32,
    pub orbit_index: u32,
    pub position: Position,
    pub flags: NodeFlags,
}

impl Node {
    /// Create an unallocated node with the given static data and no neighbors.
    pub fn new(spec: NodeSpec, sentinel: u32) -> Self {
        Self {
            skill: spec.skill,
            name: spec.name,
            stats: spec.stats,
            group: spec.group,
            orbit: spec.orbit,
            orbit_index: spec.orbit_index,
            position: spec.position,
            flags: spec.flags,
            neighbors: Neighbors::new(),
            allocated: false,
            can_allocate: false,
            state: NodeState::Default,
            path_distance: sentinel,
            path: Vec::new(),
            dependency_of: Vec::new(),
            distance_to_start: sentinel,
        }
    }

    pub fn skill(&self) -> SkillId {
        self.skill
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> &[String] {
        &self.stats
    }

    pub fn group(&self) -> u32 {
        self.group
    }

    pub fn orbit(&self) -> u32 {
        self.orbit
    }

    pub fn orbit_index(&self) -> u32 {
        self.orbit_index
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_notable(&self) -> bool {
        self.flags.is_notable
    }

    pub fn is_mastery(&self) -> bool {
        self.flags.is_mastery
    }

    pub fn is_start_point(&self) -> bool {
        self.flags.is_start_point
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.hidden
    }

    /// Get the undirected neighbor list.
    pub fn neighbors(&self) -> &[SkillId] {
        &self.neighbors
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    pub fn can_allocate(&self) -> bool {
        self.can_allocate
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn path_distance(&self) -> u32 {
        self.path_distance
    }

    pub fn path(&self) -> &[SkillId] {
        &self.path
    }

    pub fn dependency_of(&self) -> &[SkillId] {
        &self.dependency_of
    }

    pub fn distance_to_start(&self) -> u32 {
        self.distance_to_start
    }

    /// Link this node to another. Duplicate and self links are ignored.
    pub(crate) fn link(&mut self, other: SkillId) {
        if other != self.skill && !self.neighbors.contains(&other) {
            self.neighbors.push(other);
        }
    }

    /// Merge every field set in `patch` into this node.
    pub(crate) fn apply(&mut self, patch: NodePatch) {
        if let Some(allocated) = patch.allocated {
            self.allocated = allocated;
        }
        if let Some(can_allocate) = patch.can_allocate {
            self.can_allocate = can_allocate;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
        if let Some(path_distance) = patch.path_distance {
            self.path_distance = path_distance;
        }
        if let Some(path) = patch.path {
            self.path = path;
        }
        if let Some(dependency_of) = patch.dependency_of {
            self.dependency_of = dependency_of;
        }
        if let Some(distance_to_start) = patch.distance_to_start {
            self.distance_to_start = distance_to_start;
        }
    }
}

/// Sparse update of a node's mutable fields.
///
/// Unset fields are left untouched by [`Node::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub allocated: Option<bool>,
    pub can_allocate: Option<bool>,
    pub state: Option<NodeState>,
    pub path_distance: Option<u32>,
    pub path: Option<Vec<SkillId>>,
    pub dependency_of: Option<Vec<SkillId>>,
    pub distance_to_start: Option<u32>,
}

impl NodePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocated(mut self, allocated: bool) -> Self {
        self.allocated = Some(allocated);
        self
    }

    pub fn can_allocate(mut self, can_allocate: bool) -> Self {
        self.can_allocate = Some(can_allocate);
        self
    }

    pub fn state(mut self, state: NodeState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn path_distance(mut self, distance: u32) -> Self {
        self.path_distance = Some(distance);
        self
    }

    pub fn path(mut self, path: Vec<SkillId>) -> Self {
        self.path = Some(path);
        self
    }

    pub fn dependency_of(mut self, dependents: Vec<SkillId>) -> Self {
        self.dependency_of = Some(dependents);
        self
    }

    pub fn distance_to_start(mut self, distance: u32) -> Self {
        self.distance_to_start = Some(distance);
        self
    }
}

/// Serializable view of a node for renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub skill: SkillId,
    pub name: String,
    pub group: u32,
    pub position: Position,
    pub flags: NodeFlags,
    pub allocated: bool,
    pub can_allocate: bool,
    pub state: NodeState,
    pub path_distance: u32,
    pub path: Vec<SkillId>,
    pub is_dependency_of: Vec<SkillId>,
    pub distance_to_start: u32,
}

impl From<&Node> for NodeView {
    fn from(node: &Node) -> Self {
        Self {
            skill: node.skill,
            name: node.name.clone(),
            group: node.group,
            position: node.position,
            flags: node.flags,
            allocated: node.allocated,
            can_allocate: node.can_allocate,
            state: node.state,
            path_distance: node.path_distance,
            path: node.path.clone(),
            is_dependency_of: node.dependency_of.clone(),
            distance_to_start: node.distance_to_start,
        }
    }
}
