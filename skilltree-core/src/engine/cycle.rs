//! Recompute Cycle
//!
//! After every allocation change the derived fields of all nodes are rebuilt
//! in a fixed sequence:
//!
//! 1. Reset distances, paths and dependents. Allocated nodes get distance 0
//!    and depend on themselves.
//! 2. Dependency analysis, ordered by the previous cycle's
//!    `distance_to_start`.
//! 3. Multi-source shortest paths.
//! 4. Snapshot `distance_to_start` for the next cycle.
//!
//! Steps 2 and 3 only read the store; their results are written back with
//! [`GraphStore::update_node`].

use std::time::{Duration, Instant};

use tracing::{debug, debug_span};

use crate::error::Result;
use crate::graph::{GraphStore, Node, NodePatch, SkillId};

use super::dependency;
use super::distance;

/// Summary of one recompute cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Allocated nodes after the cycle.
    pub allocated: usize,
    /// Unallocated nodes reachable from the allocated set.
    pub reachable: usize,
    /// Wall time of the cycle.
    pub elapsed: Duration,
}

/// Rebuild every derived node field of `store`.
pub fn recompute(store: &mut GraphStore, start: SkillId) -> Result<CycleReport> {
    let _span = debug_span!("recompute", %start).entered();
    let began = Instant::now();
    let sentinel = store.sentinel();

    let snapshot: Vec<(SkillId, bool)> = store
        .nodes()
        .map(|node| (node.skill(), node.is_allocated()))
        .collect();
    for &(skill, allocated) in &snapshot {
        let patch = if allocated {
            NodePatch::new()
                .path_distance(0)
                .path(Vec::new())
                .dependency_of(vec![skill])
        } else {
            NodePatch::new()
                .path_distance(sentinel)
                .path(Vec::new())
                .dependency_of(Vec::new())
        };
        store.update_node(skill, patch)?;
    }

    let order = dependency::processing_order(store);
    let dependents = dependency::analyze(store, &order)?;
    for (skill, dependents) in dependents {
        store.update_node(skill, NodePatch::new().dependency_of(dependents))?;
    }

    let reachability = distance::shortest_paths(store)?;
    let reachable = reachability.reachable_count();
    let (distances, mut paths) = reachability.into_parts();
    for &(skill, _) in &snapshot {
        let patch = NodePatch::new()
            .path_distance(distances.get(&skill).copied().unwrap_or(sentinel))
            .path(paths.remove(&skill).unwrap_or_default());
        store.update_node(skill, patch)?;
    }

    let from_start = distance::allocated_distances_from(store, start)?;
    let mut allocated = 0;
    for &(skill, is_allocated) in &snapshot {
        let distance_to_start = if is_allocated {
            allocated += 1;
            from_start.get(&skill).copied().unwrap_or(sentinel)
        } else {
            store.get_node(skill).map(Node::path_distance)?
        };
        store.update_node(skill, NodePatch::new().distance_to_start(distance_to_start))?;
    }

    let report = CycleReport {
        allocated,
        reachable,
        elapsed: began.elapsed(),
    };
    debug!(
        allocated = report.allocated,
        reachable = report.reachable,
        elapsed_us = report.elapsed.as_micros() as u64,
        "recompute finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ConnectorKind, NodeFlags, NodeSpec};

    fn chain() -> GraphStore {
        let mut store = GraphStore::new(1000);
        for skill in 1..=4 {
            store.add_node(Node::new(
                NodeSpec {
                    skill: SkillId::new(skill),
                    flags: NodeFlags {
                        is_start_point: skill == 1,
                        ..NodeFlags::default()
                    },
                    ..NodeSpec::default()
                },
                1000,
            ));
        }
        for (a, b) in [(1, 2), (2, 3), (3, 4)] {
            store
                .add_edge(SkillId::new(a), SkillId::new(b), ConnectorKind::Line)
                .unwrap();
        }
        store
    }

    #[test]
    fn cycle_fills_every_derived_field() {
        let mut store = chain();
        for skill in [1, 2] {
            store
                .update_node(SkillId::new(skill), NodePatch::new().allocated(true))
                .unwrap();
        }

        let report = recompute(&mut store, SkillId::new(1)).unwrap();
        assert_eq!(report.allocated, 2);
        assert_eq!(report.reachable, 2);

        let two = store.get_node(SkillId::new(2)).unwrap();
        assert_eq!(two.path_distance(), 0);
        assert_eq!(two.distance_to_start(), 1);
        assert_eq!(two.dependency_of(), &[SkillId::new(2)]);

        let four = store.get_node(SkillId::new(4)).unwrap();
        assert_eq!(four.path_distance(), 2);
        assert_eq!(four.distance_to_start(), 2);
        assert_eq!(four.path(), &[SkillId::new(4), SkillId::new(3)]);
        assert!(four.dependency_of().is_empty());
    }

    #[test]
    fn cycle_clears_stale_results() {
        let mut store = chain();
        for skill in [1, 2, 3] {
            store
                .update_node(SkillId::new(skill), NodePatch::new().allocated(true))
                .unwrap();
        }
        recompute(&mut store, SkillId::new(1)).unwrap();
        assert_eq!(store.get_node(SkillId::new(2)).unwrap().dependency_of().len(), 2);

        store
            .update_node(SkillId::new(3), NodePatch::new().allocated(false))
            .unwrap();
        recompute(&mut store, SkillId::new(1)).unwrap();

        let three = store.get_node(SkillId::new(3)).unwrap();
        assert!(three.dependency_of().is_empty());
        assert_eq!(three.path_distance(), 1);
        assert_eq!(
            store.get_node(SkillId::new(2)).unwrap().dependency_of(),
            &[SkillId::new(2)]
        );
    }
}
