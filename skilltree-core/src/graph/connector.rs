//! Connectors
//!
//! A connector is the visual link drawn between two adjacent skills. There is
//! exactly one connector per undirected edge; its endpoints are stored in the
//! order the edge was first seen but matching ignores that order.

use serde::Serialize;

use super::node::{NodeState, SkillId};

/// How a renderer should draw the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    /// Both endpoints sit on the same orbit of the same group.
    Arc,
    /// Anything else.
    Line,
}

/// An undirected edge between two skills.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    start_node: SkillId,
    end_node: SkillId,
    kind: ConnectorKind,
    state: NodeState,
    hidden: bool,
}

impl Connector {
    pub fn new(start_node: SkillId, end_node: SkillId, kind: ConnectorKind) -> Self {
        Self {
            start_node,
            end_node,
            kind,
            state: NodeState::Default,
            hidden: false,
        }
    }

    /// Stable identifier in `start/end` form.
    pub fn id(&self) -> String {
        format!("{}/{}", self.start_node, self.end_node)
    }

    pub fn start_node(&self) -> SkillId {
        self.start_node
    }

    pub fn end_node(&self) -> SkillId {
        self.end_node
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Check whether this connector links `a` and `b`, in either order.
    pub fn links(&self, a: SkillId, b: SkillId) -> bool {
        (self.start_node == a && self.end_node == b) || (self.start_node == b && self.end_node == a)
    }

    pub(crate) fn set_state(&mut self, state: NodeState) {
        self.state = state;
    }

    pub(crate) fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_is_order_independent() {
        let connector = Connector::new(SkillId::new(1), SkillId::new(2), ConnectorKind::Line);
        assert!(connector.links(SkillId::new(1), SkillId::new(2)));
        assert!(connector.links(SkillId::new(2), SkillId::new(1)));
        assert!(!connector.links(SkillId::new(1), SkillId::new(3)));
    }

    #[test]
    fn id_uses_stored_order() {
        let connector = Connector::new(SkillId::new(10), SkillId::new(4), ConnectorKind::Arc);
        assert_eq!(connector.id(), "10/4");
        assert_eq!(connector.state(), NodeState::Default);
    }
}
