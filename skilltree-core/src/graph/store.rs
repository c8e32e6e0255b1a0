//! Graph Store
//!
//! The store owns every node and connector of a loaded tree. Nodes are kept
//! in an insertion-ordered table addressed by skill id, and the only way to
//! change a node after construction is [`GraphStore::update_node`].
//!
//! The store does not enforce graph-wide invariants. Keeping allocation,
//! distances and connector states consistent is the job of the engine and
//! the allocation session built on top of it.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::error::{Result, TreeError};

use super::connector::{Connector, ConnectorKind};
use super::node::{Node, NodePatch, NodeState, SkillId};

/// Nodes and connectors of one skill tree.
#[derive(Debug, Clone)]
pub struct GraphStore {
    /// All nodes, in definition order.
    nodes: IndexMap<SkillId, Node>,

    /// One connector per undirected edge.
    connectors: Vec<Connector>,

    /// Connector position keyed by the ordered endpoint pair.
    connector_index: HashMap<(SkillId, SkillId), usize>,

    /// Distance recorded for nodes no allocated node can reach.
    sentinel: u32,
}

fn edge_key(a: SkillId, b: SkillId) -> (SkillId, SkillId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl GraphStore {
    /// Create an empty store.
    pub fn new(sentinel: u32) -> Self {
        Self {
            nodes: IndexMap::new(),
            connectors: Vec::new(),
            connector_index: HashMap::new(),
            sentinel,
        }
    }

    /// Add a node to the graph, replacing any node with the same skill id.
    pub fn add_node(&mut self, node: Node) -> SkillId {
        let skill = node.skill();
        self.nodes.insert(skill, node);
        skill
    }

    /// Link two nodes and create the connector between them.
    ///
    /// Linking an already linked pair is a no-op.
    pub fn add_edge(&mut self, a: SkillId, b: SkillId, kind: ConnectorKind) -> Result<()> {
        if a == b {
            return Ok(());
        }
        if !self.nodes.contains_key(&b) {
            return Err(TreeError::NotFound(b));
        }
        self.nodes.get_mut(&a).ok_or(TreeError::NotFound(a))?.link(b);
        if let Some(other) = self.nodes.get_mut(&b) {
            other.link(a);
        }

        let key = edge_key(a, b);
        if !self.connector_index.contains_key(&key) {
            self.connector_index.insert(key, self.connectors.len());
            self.connectors.push(Connector::new(a, b, kind));
        }
        Ok(())
    }

    /// Get a node by skill id.
    pub fn get_node(&self, skill: SkillId) -> Result<&Node> {
        self.nodes.get(&skill).ok_or(TreeError::NotFound(skill))
    }

    /// Merge the fields set in `patch` into a node.
    pub fn update_node(&mut self, skill: SkillId, patch: NodePatch) -> Result<()> {
        self.nodes
            .get_mut(&skill)
            .ok_or(TreeError::NotFound(skill))?
            .apply(patch);
        Ok(())
    }

    /// Check whether the graph contains a skill.
    pub fn contains(&self, skill: SkillId) -> bool {
        self.nodes.contains_key(&skill)
    }

    /// Iterate over every node in table order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    /// Collect every node in table order.
    pub fn to_array(&self) -> Vec<&Node> {
        self.nodes.values().collect()
    }

    pub fn filter_nodes<P>(&self, mut predicate: P) -> Vec<&Node>
    where
        P: FnMut(&Node) -> bool,
    {
        self.nodes.values().filter(|node| predicate(*node)).collect()
    }

    pub fn find_node<P>(&self, mut predicate: P) -> Option<&Node>
    where
        P: FnMut(&Node) -> bool,
    {
        self.nodes.values().find(|node| predicate(*node))
    }

    pub fn any_node<P>(&self, mut predicate: P) -> bool
    where
        P: FnMut(&Node) -> bool,
    {
        self.nodes.values().any(|node| predicate(node))
    }

    /// Skills of all allocated nodes, in table order.
    pub fn allocated_skills(&self) -> Vec<SkillId> {
        self.nodes
            .values()
            .filter(|node| node.is_allocated())
            .map(Node::skill)
            .collect()
    }

    /// Get all connectors.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// Find the connector linking two skills, in either order.
    pub fn connector_between(&self, a: SkillId, b: SkillId) -> Option<&Connector> {
        self.connector_index
            .get(&edge_key(a, b))
            .map(|&index| &self.connectors[index])
    }

    /// Set the state of the connector linking two skills, if there is one.
    pub(crate) fn set_connector_state(&mut self, a: SkillId, b: SkillId, state: NodeState) {
        if let Some(&index) = self.connector_index.get(&edge_key(a, b)) {
            self.connectors[index].set_state(state);
        }
    }

    pub(crate) fn set_connector_hidden(&mut self, a: SkillId, b: SkillId, hidden: bool) {
        if let Some(&index) = self.connector_index.get(&edge_key(a, b)) {
            self.connectors[index].set_hidden(hidden);
        }
    }

    /// Get the unreached-distance sentinel.
    pub fn sentinel(&self) -> u32 {
        self.sentinel
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_SENTINEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::NodeSpec;

    fn store_with(skills: &[u32]) -> GraphStore {
        let mut store = GraphStore::new(1000);
        for &skill in skills {
            store.add_node(Node::new(
                NodeSpec {
                    skill: SkillId::new(skill),
                    ..NodeSpec::default()
                },
                1000,
            ));
        }
        store
    }

    #[test]
    fn get_unknown_skill_fails() {
        let store = store_with(&[1]);
        assert!(store.get_node(SkillId::new(1)).is_ok());
        assert!(matches!(
            store.get_node(SkillId::new(2)),
            Err(TreeError::NotFound(id)) if id == SkillId::new(2)
        ));
    }

    #[test]
    fn update_node_merges_patch() {
        let mut store = store_with(&[1, 2]);
        store
            .update_node(SkillId::new(2), NodePatch::new().allocated(true))
            .unwrap();
        assert_eq!(store.allocated_skills(), vec![SkillId::new(2)]);
        assert!(store
            .update_node(SkillId::new(9), NodePatch::new().allocated(true))
            .is_err());
    }

    #[test]
    fn edges_are_undirected_and_deduplicated() {
        let mut store = store_with(&[1, 2, 3]);
        store.add_edge(SkillId::new(1), SkillId::new(2), ConnectorKind::Line).unwrap();
        store.add_edge(SkillId::new(2), SkillId::new(1), ConnectorKind::Line).unwrap();
        store.add_edge(SkillId::new(2), SkillId::new(3), ConnectorKind::Arc).unwrap();

        assert_eq!(store.connector_count(), 2);
        assert_eq!(
            store.get_node(SkillId::new(2)).unwrap().neighbors(),
            &[SkillId::new(1), SkillId::new(3)]
        );
        let connector = store
            .connector_between(SkillId::new(3), SkillId::new(2))
            .unwrap();
        assert_eq!(connector.kind(), ConnectorKind::Arc);
        assert!(store.connector_between(SkillId::new(1), SkillId::new(3)).is_none());
    }

    #[test]
    fn edge_to_unknown_node_fails() {
        let mut store = store_with(&[1]);
        assert!(store
            .add_edge(SkillId::new(1), SkillId::new(5), ConnectorKind::Line)
            .is_err());
        assert!(store.get_node(SkillId::new(1)).unwrap().neighbors().is_empty());
    }

    #[test]
    fn query_helpers() {
        let store = store_with(&[3, 1, 2]);
        let order: Vec<_> = store.to_array().iter().map(|n| n.skill().raw()).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(store.filter_nodes(|n| n.skill().raw() > 1).len(), 2);
        assert_eq!(
            store.find_node(|n| n.skill().raw() == 2).map(Node::skill),
            Some(SkillId::new(2))
        );
        assert!(!store.any_node(Node::is_allocated));
    }
}
