//! Skill Graph
//!
//! This module implements the static skill graph and the store that owns it.
//!
//! # Overview
//!
//! The graph is undirected:
//!
//! - Nodes are skills, addressed by [`SkillId`]
//! - Edges are connectors; each one is drawn once and walked both ways
//!
//! Nodes are created when a tree definition is loaded and are never added or
//! removed afterwards. Only their allocation and derived fields change.
//!
//! # Design Decisions
//!
//! 1. Nodes live in a single table keyed by skill id, and updates go through
//!    the store by id. No code holds a node while changing another.
//!
//! 2. The definition's `out`/`in` lists are merged into one neighbor list at
//!    load time. Nothing downstream cares about edge direction.

mod connector;
pub mod loader;
mod node;
mod store;

pub use connector::{Connector, ConnectorKind};
pub use loader::{load, Group, LoadedTree, TreeDefinition};
pub use node::{
    Neighbors, Node, NodeFlags, NodePatch, NodeSpec, NodeState, NodeView, Position, SkillId,
};
pub use store::GraphStore;
