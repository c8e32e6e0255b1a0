//! Dependency Analysis
//!
//! For every allocated node `N` we find the allocated nodes that lose their
//! link to the start node once `N` is gone. The result drives removal: taking
//! `N` out also takes out everything that depends on it.
//!
//! # Algorithm
//!
//! Allocated nodes are processed nearest-to-start first, using the
//! `distance_to_start` snapshot left by the previous cycle. For a node `N`,
//! each allocated neighbor `O` that is not already known to depend on `N`
//! gets a depth-first search over allocated nodes, with `N` itself blocked:
//!
//! - if the search meets the start node, `O` survives without `N`;
//! - otherwise every node the search touched (including `O`) depends on `N`.
//!
//! Each search owns its visited set. Nothing is written to the shared node
//! records until the whole analysis is done.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::graph::{GraphStore, Node, SkillId};

/// Allocated nodes in the order the analysis visits them.
///
/// Ties keep table order.
pub fn processing_order(store: &GraphStore) -> Vec<SkillId> {
    let mut allocated: Vec<&Node> = store
        .nodes()
        .filter(|node| node.is_allocated() && !node.is_mastery())
        .collect();
    allocated.sort_by_key(|node| node.distance_to_start());
    allocated.into_iter().map(Node::skill).collect()
}

/// Compute the dependents of every node in `order`.
///
/// Every entry of the result starts with the node itself.
pub fn analyze(store: &GraphStore, order: &[SkillId]) -> Result<HashMap<SkillId, Vec<SkillId>>> {
    let mut result = HashMap::with_capacity(order.len());

    for &skill in order {
        let node = store.get_node(skill)?;
        let mut dependents = vec![skill];
        let mut recorded: HashSet<SkillId> = HashSet::from([skill]);

        for &other in node.neighbors() {
            let neighbor = store.get_node(other)?;
            if !neighbor.is_allocated() || neighbor.is_mastery() || recorded.contains(&other) {
                continue;
            }
            if neighbor.is_start_point() {
                continue;
            }

            let mut visited = Vec::new();
            if !reaches_start(store, skill, other, &mut visited)? {
                for dependent in visited {
                    if recorded.insert(dependent) {
                        dependents.push(dependent);
                    }
                }
            }
        }

        result.insert(skill, dependents);
    }

    Ok(result)
}

/// Search from `from` over allocated nodes, never entering `blocked`, until
/// the start node shows up. Every node entered is appended to `visited`.
fn reaches_start(
    store: &GraphStore,
    blocked: SkillId,
    from: SkillId,
    visited: &mut Vec<SkillId>,
) -> Result<bool> {
    let mut seen: HashSet<SkillId> = HashSet::from([blocked, from]);
    let mut stack = vec![from];
    visited.push(from);

    while let Some(current) = stack.pop() {
        for &next in store.get_node(current)?.neighbors() {
            if seen.contains(&next) {
                continue;
            }
            let node = store.get_node(next)?;
            if !node.is_allocated() || node.is_mastery() {
                continue;
            }
            if node.is_start_point() {
                return Ok(true);
            }
            seen.insert(next);
            visited.push(next);
            stack.push(next);
        }
    }

    Ok(false)
}
