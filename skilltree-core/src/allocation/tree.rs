//! Allocation Session
//!
//! [`SkillTree`] owns a loaded graph and applies allocation changes to it.
//!
//! # How It Works
//!
//! 1. `allocate`/`unallocate` flip one node and fix up the visual state of
//!    the node, its neighbors and the connectors between them. They do not
//!    touch distances or dependents.
//!
//! 2. `click`, `reset` and `import` batch several of those flips, then run
//!    one recompute cycle and notify listeners.
//!
//! 3. Clicking an unallocated node buys its whole path. Clicking an
//!    allocated node removes it together with everything that depends on it,
//!    farthest from the start first.
//!
//! The start node is allocated at construction and can never be removed.

use std::cmp::Reverse;

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::TreeConfig;
use crate::engine::{self, CycleReport};
use crate::error::{Result, TreeError};
use crate::graph::{
    self, GraphStore, Group, Node, NodePatch, NodeState, NodeView, SkillId, TreeDefinition,
};

use super::events::{AllocationEvent, AllocationEventKind, AllocationEvents};
use super::preview::Preview;

/// Result of a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// These skills were allocated, nearest to the allocated set first.
    Allocated(Vec<SkillId>),
    /// These skills were removed, farthest from the start first.
    Unallocated(Vec<SkillId>),
    /// Nothing changed: the node is the start, a mastery, or unreachable.
    Ignored,
}

impl ClickOutcome {
    /// Skills whose allocation changed.
    pub fn changed(&self) -> &[SkillId] {
        match self {
            Self::Allocated(skills) | Self::Unallocated(skills) => skills,
            Self::Ignored => &[],
        }
    }
}

/// An editable allocation over one skill tree.
#[derive(Debug)]
pub struct SkillTree {
    store: GraphStore,
    start: SkillId,
    groups: Vec<Group>,
    config: TreeConfig,
    events: AllocationEvents,

    /// Sorted allocated set at the last save.
    saved: Vec<SkillId>,

    pub(super) preview: Option<Preview>,
}

impl SkillTree {
    /// Start a session over `store`, allocating the start node.
    pub fn new(store: GraphStore, start: SkillId, config: TreeConfig) -> Result<Self> {
        if !store.get_node(start)?.is_start_point() {
            return Err(TreeError::InvalidDefinition(format!(
                "skill {start} is not flagged as a start point"
            )));
        }

        let mut tree = Self {
            store,
            start,
            groups: Vec::new(),
            config,
            events: AllocationEvents::new(),
            saved: Vec::new(),
            preview: None,
        };
        tree.allocate(start)?;
        tree.recompute()?;
        tree.mark_saved();
        Ok(tree)
    }

    /// Load a tree definition and start a session over it.
    pub fn from_definition(definition: &TreeDefinition, mut config: TreeConfig) -> Result<Self> {
        let loaded = graph::load(definition, &config)?;
        if config.total_points == 0 {
            config.total_points = loaded.total_points.unwrap_or(0);
        }
        let mut tree = Self::new(loaded.store, loaded.start, config)?;
        tree.groups = loaded.groups;
        Ok(tree)
    }

    /// Parse a JSON tree definition and start a session over it.
    pub fn from_json(json: &str, config: TreeConfig) -> Result<Self> {
        Self::from_definition(&TreeDefinition::from_json(json)?, config)
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub(super) fn store_mut(&mut self) -> &mut GraphStore {
        &mut self.store
    }

    pub fn node(&self, skill: SkillId) -> Result<&Node> {
        self.store.get_node(skill)
    }

    pub fn start(&self) -> SkillId {
        self.start
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Listener registry for allocation changes.
    pub fn events(&self) -> &AllocationEvents {
        &self.events
    }

    /// Every allocated skill, in table order.
    pub fn allocated(&self) -> Vec<SkillId> {
        self.store.allocated_skills()
    }

    /// Serializable state of every node, in table order.
    pub fn snapshot(&self) -> Vec<NodeView> {
        self.store.nodes().map(NodeView::from).collect()
    }

    /// Allocate a single node and update the states around it.
    ///
    /// Ends any active preview. Distances and dependents are stale until
    /// [`SkillTree::recompute`].
    pub fn allocate(&mut self, skill: SkillId) -> Result<()> {
        self.clear_preview()?;
        let node = self.store.get_node(skill)?;
        let neighbors = node.neighbors().to_vec();
        let notable = node.is_notable();
        let group = node.group();

        self.store.update_node(
            skill,
            NodePatch::new()
                .allocated(true)
                .can_allocate(false)
                .state(NodeState::Active),
        )?;

        for other in neighbors {
            let neighbor = self.store.get_node(other)?;
            if !neighbor.is_allocated() && !neighbor.is_mastery() {
                self.store.update_node(
                    other,
                    NodePatch::new()
                        .can_allocate(true)
                        .state(NodeState::Intermediate),
                )?;
            }
        }
        self.sync_connectors(skill)?;

        if notable {
            self.set_masteries(group, true)?;
        }
        Ok(())
    }

    /// Unallocate a single node and update the states around it.
    ///
    /// The start node is never unallocated. Ends any active preview.
    /// Distances and dependents are stale until [`SkillTree::recompute`].
    pub fn unallocate(&mut self, skill: SkillId) -> Result<()> {
        self.clear_preview()?;
        if skill == self.start {
            debug!(%skill, "refusing to unallocate the start node");
            return Ok(());
        }
        let node = self.store.get_node(skill)?;
        if !node.is_allocated() {
            return Ok(());
        }
        let neighbors = node.neighbors().to_vec();
        let notable = node.is_notable();
        let group = node.group();

        let reachable = self.has_allocated_neighbor(skill)?;
        self.store.update_node(
            skill,
            NodePatch::new()
                .allocated(false)
                .can_allocate(reachable)
                .state(if reachable {
                    NodeState::Intermediate
                } else {
                    NodeState::Default
                })
                .dependency_of(Vec::new()),
        )?;

        for other in neighbors {
            let neighbor = self.store.get_node(other)?;
            if neighbor.is_allocated() || neighbor.is_mastery() {
                continue;
            }
            if !self.has_allocated_neighbor(other)? {
                self.store.update_node(
                    other,
                    NodePatch::new().can_allocate(false).state(NodeState::Default),
                )?;
            }
        }
        self.sync_connectors(skill)?;

        if notable && !self.group_has_allocated_notable(group) {
            self.set_masteries(group, false)?;
        }
        Ok(())
    }

    /// Rebuild distances, paths and dependents of every node.
    pub fn recompute(&mut self) -> Result<CycleReport> {
        engine::recompute(&mut self.store, self.start)
    }

    /// Toggle a node the way a user click does.
    pub fn click(&mut self, skill: SkillId) -> Result<ClickOutcome> {
        self.clear_preview()?;

        let node = self.store.get_node(skill)?;
        if node.is_start_point() || node.is_mastery() {
            return Ok(ClickOutcome::Ignored);
        }

        let outcome = if node.is_allocated() {
            let mut batch: Vec<SkillId> = node
                .dependency_of()
                .iter()
                .copied()
                .filter(|&dependent| dependent != self.start)
                .collect();
            batch.sort_by_key(|&dependent| {
                Reverse(
                    self.store
                        .get_node(dependent)
                        .map(Node::distance_to_start)
                        .unwrap_or(0),
                )
            });
            for &dependent in &batch {
                self.unallocate(dependent)?;
            }
            ClickOutcome::Unallocated(batch)
        } else {
            if node.path_distance() >= self.store.sentinel() {
                return Ok(ClickOutcome::Ignored);
            }
            let batch: Vec<SkillId> = node.path().iter().rev().copied().collect();
            for &step in &batch {
                self.allocate(step)?;
            }
            ClickOutcome::Allocated(batch)
        };

        self.recompute()?;
        self.emit(AllocationEventKind::Click);
        Ok(outcome)
    }

    /// Remove every allocation except the start node.
    pub fn reset(&mut self) -> Result<()> {
        self.clear_preview()?;
        self.clear_allocation()?;
        self.recompute()?;
        info!(start = %self.start, "tree reset");
        self.emit(AllocationEventKind::Reset);
        Ok(())
    }

    /// Encode the current allocation. Masteries follow their notables and
    /// are left out.
    pub fn export(&self) -> Result<String> {
        let skills = self
            .store
            .nodes()
            .filter(|node| node.is_allocated() && !node.is_mastery())
            .map(Node::skill);
        Ok(codec::encode(skills, self.start)?)
    }

    /// Replace the current allocation with an encoded one.
    ///
    /// Decoding and validation finish before anything changes, so a rejected
    /// payload leaves the session untouched. Nodes that end up cut off from
    /// the start are dropped and returned.
    pub fn import(&mut self, encoded: &str) -> Result<Vec<SkillId>> {
        let skills = codec::decode(encoded)?;
        if let Some(&missing) = skills.iter().find(|&&skill| !self.store.contains(skill)) {
            return Err(TreeError::NotFound(missing));
        }

        self.clear_preview()?;
        self.clear_allocation()?;
        for &skill in &skills {
            if skill != self.start && !self.store.get_node(skill)?.is_mastery() {
                self.allocate(skill)?;
            }
        }
        let pruned = self.prune_orphans()?;
        if !pruned.is_empty() {
            warn!(count = pruned.len(), "pruned skills unreachable from the start");
        }
        self.sync_masteries()?;

        self.recompute()?;
        info!(allocated = self.store.allocated_skills().len(), "tree imported");
        self.emit(AllocationEventKind::Import);
        Ok(pruned)
    }

    /// Remember the current allocation as saved.
    pub fn mark_saved(&mut self) {
        self.saved = self.sorted_allocated();
    }

    /// Check whether the allocation changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.saved != self.sorted_allocated()
    }

    /// Points spent: allocated skills other than the start and masteries.
    pub fn points_used(&self) -> u32 {
        self.store
            .nodes()
            .filter(|node| node.is_allocated() && !node.is_start_point() && !node.is_mastery())
            .count() as u32
    }

    /// Check the advisory point budget. Never blocks allocation.
    pub fn is_over_budget(&self) -> bool {
        self.config.total_points > 0 && self.points_used() > self.config.total_points
    }

    fn sorted_allocated(&self) -> Vec<SkillId> {
        let mut allocated = self.allocated();
        allocated.sort_unstable();
        allocated
    }

    fn emit(&self, kind: AllocationEventKind) {
        self.events.emit(&AllocationEvent {
            kind,
            allocated: self.allocated(),
        });
    }

    fn clear_allocation(&mut self) -> Result<()> {
        for skill in self.allocated() {
            if skill != self.start {
                self.unallocate(skill)?;
            }
        }
        self.allocate(self.start)
    }

    fn has_allocated_neighbor(&self, skill: SkillId) -> Result<bool> {
        for &other in self.store.get_node(skill)?.neighbors() {
            let neighbor = self.store.get_node(other)?;
            if neighbor.is_allocated() && !neighbor.is_mastery() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn group_has_allocated_notable(&self, group: u32) -> bool {
        self.store
            .any_node(|node| node.group() == group && node.is_notable() && node.is_allocated())
    }

    /// Set every connector of `skill` from the allocation of its endpoints.
    pub(super) fn sync_connectors(&mut self, skill: SkillId) -> Result<()> {
        let node = self.store.get_node(skill)?;
        let allocated = node.is_allocated();
        let neighbors = node.neighbors().to_vec();
        for other in neighbors {
            let state = match (allocated, self.store.get_node(other)?.is_allocated()) {
                (true, true) => NodeState::Active,
                (true, false) | (false, true) => NodeState::Intermediate,
                (false, false) => NodeState::Default,
            };
            self.store.set_connector_state(skill, other, state);
        }
        Ok(())
    }

    fn set_masteries(&mut self, group: u32, active: bool) -> Result<()> {
        let masteries: Vec<SkillId> = self
            .store
            .filter_nodes(|node| {
                node.is_mastery() && node.group() == group && node.is_allocated() != active
            })
            .into_iter()
            .map(Node::skill)
            .collect();

        for mastery in masteries {
            let patch = if active {
                NodePatch::new().allocated(true).state(NodeState::Active)
            } else {
                NodePatch::new()
                    .allocated(false)
                    .state(NodeState::Default)
                    .dependency_of(Vec::new())
            };
            self.store.update_node(mastery, patch)?;
            self.sync_connectors(mastery)?;
        }
        Ok(())
    }

    fn sync_masteries(&mut self) -> Result<()> {
        let mut groups: Vec<u32> = self
            .store
            .filter_nodes(Node::is_mastery)
            .into_iter()
            .map(Node::group)
            .collect();
        groups.sort_unstable();
        groups.dedup();

        for group in groups {
            let active = self.group_has_allocated_notable(group);
            self.set_masteries(group, active)?;
        }
        Ok(())
    }

    /// Unallocate every node the start cannot reach through allocated nodes.
    fn prune_orphans(&mut self) -> Result<Vec<SkillId>> {
        let connected = engine::distance::allocated_distances_from(&self.store, self.start)?;
        let orphans: Vec<SkillId> = self
            .store
            .filter_nodes(|node| {
                node.is_allocated() && !node.is_mastery() && !connected.contains_key(&node.skill())
            })
            .into_iter()
            .map(Node::skill)
            .collect();

        for &orphan in &orphans {
            self.unallocate(orphan)?;
        }
        Ok(orphans)
    }
}

// ----------------------------------------------------------------------------
// Python Bindings
// ----------------------------------------------------------------------------

fn to_py_err(err: TreeError) -> PyErr {
    match err {
        TreeError::NotFound(_) => PyKeyError::new_err(err.to_string()),
        _ => PyValueError::new_err(err.to_string()),
    }
}

fn raw_ids(skills: &[SkillId]) -> Vec<u32> {
    skills.iter().map(SkillId::raw).collect()
}

/// Python-exposed allocation session.
#[pyclass(name = "SkillTree")]
pub struct PySkillTree {
    inner: SkillTree,
}

#[pymethods]
impl PySkillTree {
    /// Load a tree definition, optionally with a JSON configuration.
    #[staticmethod]
    #[pyo3(signature = (definition, config = None))]
    fn from_json(definition: &str, config: Option<&str>) -> PyResult<Self> {
        let config = match config {
            Some(json) => TreeConfig::from_json(json).map_err(|e| to_py_err(e.into()))?,
            None => TreeConfig::default(),
        };
        let inner = SkillTree::from_json(definition, config).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Click a skill. Returns the skills whose allocation changed.
    fn click(&mut self, skill: u32) -> PyResult<Vec<u32>> {
        let outcome = self.inner.click(SkillId::new(skill)).map_err(to_py_err)?;
        Ok(raw_ids(outcome.changed()))
    }

    fn reset(&mut self) -> PyResult<()> {
        self.inner.reset().map_err(to_py_err)
    }

    fn allocated(&self) -> Vec<u32> {
        raw_ids(&self.inner.allocated())
    }

    fn path_distance(&self, skill: u32) -> PyResult<u32> {
        let node = self.inner.node(SkillId::new(skill)).map_err(to_py_err)?;
        Ok(node.path_distance())
    }

    fn path(&self, skill: u32) -> PyResult<Vec<u32>> {
        let node = self.inner.node(SkillId::new(skill)).map_err(to_py_err)?;
        Ok(raw_ids(node.path()))
    }

    fn dependents(&self, skill: u32) -> PyResult<Vec<u32>> {
        let node = self.inner.node(SkillId::new(skill)).map_err(to_py_err)?;
        Ok(raw_ids(node.dependency_of()))
    }

    fn export_tree(&self) -> PyResult<String> {
        self.inner.export().map_err(to_py_err)
    }

    /// Import an encoded tree. Returns the skills pruned as unreachable.
    fn import_tree(&mut self, encoded: &str) -> PyResult<Vec<u32>> {
        let pruned = self.inner.import(encoded).map_err(to_py_err)?;
        Ok(raw_ids(&pruned))
    }

    fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    fn mark_saved(&mut self) {
        self.inner.mark_saved();
    }

    fn __repr__(&self) -> String {
        format!(
            "SkillTree(nodes={}, allocated={}, start={})",
            self.inner.store().node_count(),
            self.inner.allocated().len(),
            self.inner.start()
        )
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
