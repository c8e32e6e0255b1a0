//! Hover Preview
//!
//! Previewing an unallocated node paints it, its path and the connectors
//! along the path `Intermediate` so a renderer can show what a click would
//! buy. Only visual state is touched: allocation, distances and dependents
//! stay as the last recompute left them.
//!
//! Every state a preview overwrites is recorded first. Ending the preview
//! writes those records back, so the tree looks exactly as it did before.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::trace;

use crate::error::Result;
use crate::graph::{NodePatch, NodeState, SkillId};

use super::tree::SkillTree;

/// Handle of an active preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewToken(u64);

impl PreviewToken {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// States overwritten by an active preview.
#[derive(Debug)]
pub(crate) struct Preview {
    token: PreviewToken,
    skill: SkillId,
    nodes: Vec<(SkillId, NodeState)>,
    connectors: Vec<(SkillId, SkillId, NodeState)>,
}

impl SkillTree {
    /// Paint the path a click on `skill` would allocate.
    ///
    /// Returns `None` when there is nothing to preview: the node is
    /// allocated, a mastery, or unreachable. Any earlier preview is ended
    /// first.
    pub fn preview(&mut self, skill: SkillId) -> Result<Option<PreviewToken>> {
        self.clear_preview()?;

        let node = self.store().get_node(skill)?;
        let unreachable = node.path_distance() >= self.store().sentinel();
        if node.is_allocated() || node.is_mastery() || unreachable {
            return Ok(None);
        }
        let path = node.path().to_vec();

        let mut preview = Preview {
            token: PreviewToken::new(),
            skill,
            nodes: Vec::with_capacity(path.len()),
            connectors: Vec::with_capacity(path.len()),
        };

        for &step in &path {
            let state = self.store().get_node(step)?.state();
            preview.nodes.push((step, state));
            self.store_mut()
                .update_node(step, NodePatch::new().state(NodeState::Intermediate))?;
        }

        let mut links: Vec<(SkillId, SkillId)> = path.windows(2).map(|w| (w[0], w[1])).collect();
        if let Some(&last) = path.last() {
            if let Some(anchor) = self.allocated_anchor(last)? {
                links.push((last, anchor));
            }
        }
        for (a, b) in links {
            let Some(connector) = self.store().connector_between(a, b) else {
                continue;
            };
            let state = connector.state();
            if state == NodeState::Active {
                continue;
            }
            preview.connectors.push((a, b, state));
            self.store_mut()
                .set_connector_state(a, b, NodeState::Intermediate);
        }

        trace!(%skill, steps = path.len(), "preview started");
        let token = preview.token;
        self.preview = Some(preview);
        Ok(Some(token))
    }

    /// End the preview `token` refers to. Returns false if it is not active.
    pub fn end_preview(&mut self, token: PreviewToken) -> Result<bool> {
        match &self.preview {
            Some(preview) if preview.token == token => {
                self.clear_preview()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// The skill being previewed, if any.
    pub fn previewed(&self) -> Option<SkillId> {
        self.preview.as_ref().map(|preview| preview.skill)
    }

    /// Restore whatever the active preview painted over.
    pub(super) fn clear_preview(&mut self) -> Result<()> {
        let Some(preview) = self.preview.take() else {
            return Ok(());
        };
        for (a, b, state) in preview.connectors.into_iter().rev() {
            self.store_mut().set_connector_state(a, b, state);
        }
        for (skill, state) in preview.nodes.into_iter().rev() {
            self.store_mut()
                .update_node(skill, NodePatch::new().state(state))?;
        }
        trace!(skill = %preview.skill, "preview ended");
        Ok(())
    }

    fn allocated_anchor(&self, skill: SkillId) -> Result<Option<SkillId>> {
        for &other in self.store().get_node(skill)?.neighbors() {
            let neighbor = self.store().get_node(other)?;
            if neighbor.is_allocated() && !neighbor.is_mastery() {
                return Ok(Some(other));
            }
        }
        Ok(None)
    }
}
