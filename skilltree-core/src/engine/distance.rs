//! Reachability and Distance
//!
//! Multi-source breadth-first search from the allocated set. For every node
//! we record the hop count to the nearest allocated node and the path that
//! gets there.
//!
//! # Algorithm
//!
//! Every allocated node (masteries excepted) starts a search of its own. A
//! neighbor is relaxed only when the new distance is strictly smaller than
//! the best one recorded so far, so a later source never undoes an earlier,
//! closer one. The combined result equals a single multi-source search.
//!
//! Mastery nodes are never relaxed and never start a search: they grant
//! bonuses, not connectivity.
//!
//! A relaxed node's path is the node itself followed by its predecessor's
//! path, so `path[0]` is always the node and the last entry sits next to an
//! allocated node.

use std::collections::{HashMap, VecDeque};

use tracing::trace;

use crate::error::Result;
use crate::graph::{GraphStore, Node, SkillId};

/// Distances and paths from one search over the graph.
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    distances: HashMap<SkillId, u32>,
    paths: HashMap<SkillId, Vec<SkillId>>,
    sentinel: u32,
}

impl Reachability {
    /// Distance of `skill` to the nearest allocated node.
    pub fn distance(&self, skill: SkillId) -> u32 {
        self.distances.get(&skill).copied().unwrap_or(self.sentinel)
    }

    /// Path from `skill` back toward the nearest allocated node.
    pub fn path(&self, skill: SkillId) -> &[SkillId] {
        self.paths.get(&skill).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of unallocated nodes some allocated node can reach.
    pub fn reachable_count(&self) -> usize {
        self.distances
            .values()
            .filter(|&&distance| distance > 0 && distance < self.sentinel)
            .count()
    }

    pub(crate) fn into_parts(self) -> (HashMap<SkillId, u32>, HashMap<SkillId, Vec<SkillId>>) {
        (self.distances, self.paths)
    }
}

/// Compute shortest distances from the allocated set to every node.
pub fn shortest_paths(store: &GraphStore) -> Result<Reachability> {
    let sentinel = store.sentinel();
    let mut distances: HashMap<SkillId, u32> = store
        .nodes()
        .map(|node| (node.skill(), if node.is_allocated() { 0 } else { sentinel }))
        .collect();
    let mut paths: HashMap<SkillId, Vec<SkillId>> = HashMap::new();

    let sources: Vec<SkillId> = store
        .nodes()
        .filter(|node| node.is_allocated() && !node.is_mastery())
        .map(Node::skill)
        .collect();

    let mut queue = VecDeque::new();
    for source in sources {
        queue.push_back(source);

        while let Some(current) = queue.pop_front() {
            let next = distances.get(&current).copied().unwrap_or(sentinel) + 1;

            for &other in store.get_node(current)?.neighbors() {
                if store.get_node(other)?.is_mastery() {
                    continue;
                }
                if next >= distances.get(&other).copied().unwrap_or(sentinel) {
                    continue;
                }

                let mut path = Vec::with_capacity(next as usize);
                path.push(other);
                if let Some(previous) = paths.get(&current) {
                    path.extend_from_slice(previous);
                }
                trace!(%source, skill = %other, distance = next, "relaxed");

                distances.insert(other, next);
                paths.insert(other, path);
                queue.push_back(other);
            }
        }
    }

    Ok(Reachability {
        distances,
        paths,
        sentinel,
    })
}

/// Hop distance from `start` to every allocated node it reaches through
/// allocated, non-mastery nodes.
pub fn allocated_distances_from(
    store: &GraphStore,
    start: SkillId,
) -> Result<HashMap<SkillId, u32>> {
    let mut distances = HashMap::new();
    if !store.get_node(start)?.is_allocated() {
        return Ok(distances);
    }

    let mut queue = VecDeque::from([start]);
    distances.insert(start, 0);
    while let Some(current) = queue.pop_front() {
        let next = distances[&current] + 1;
        for &other in store.get_node(current)?.neighbors() {
            let node = store.get_node(other)?;
            if !node.is_allocated() || node.is_mastery() || distances.contains_key(&other) {
                continue;
            }
            distances.insert(other, next);
            queue.push_back(other);
        }
    }
    Ok(distances)
}
