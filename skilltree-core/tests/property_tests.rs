//! Property-based tests for the allocation engine using proptest.
//!
//! Random connected graphs are driven through random click sequences, and
//! after every click the derived node fields are checked against a plain
//! breadth-first search computed here from scratch.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use proptest::prelude::*;
use proptest::sample::Index;

use skilltree_core::codec;
use skilltree_core::engine::dependency;
use skilltree_core::graph::{ConnectorKind, GraphStore, Node, NodeFlags, NodeSpec};
use skilltree_core::{NodeState, SkillId, SkillTree, TreeConfig};

const SENTINEL: u32 = 1000;
const START: SkillId = SkillId::new(1);

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// A random graph over skills `1..=size`, connected through a random
/// spanning tree, plus a click sequence to replay on it.
#[derive(Debug, Clone)]
struct Scenario {
    size: u32,
    parents: Vec<Index>,
    extra_edges: Vec<(u32, u32)>,
    masteries: Vec<bool>,
    clicks: Vec<u32>,
}

fn arb_scenario() -> impl Strategy<Value = Scenario> {
    (2u32..24).prop_flat_map(|size| {
        (
            Just(size),
            prop::collection::vec(any::<Index>(), (size - 1) as usize),
            prop::collection::vec((1..=size, 1..=size), 0..size as usize),
            prop::collection::vec(prop::bool::weighted(0.1), size as usize),
            prop::collection::vec(1..=size, 0..16),
        )
            .prop_map(|(size, parents, extra_edges, masteries, clicks)| Scenario {
                size,
                parents,
                extra_edges,
                masteries,
                clicks,
            })
    })
}

fn build(scenario: &Scenario) -> SkillTree {
    let mut store = GraphStore::new(SENTINEL);
    for raw in 1..=scenario.size {
        store.add_node(Node::new(
            NodeSpec {
                skill: SkillId::new(raw),
                group: 1,
                flags: NodeFlags {
                    is_start_point: raw == 1,
                    is_mastery: raw != 1 && scenario.masteries[(raw - 1) as usize],
                    ..NodeFlags::default()
                },
                ..NodeSpec::default()
            },
            SENTINEL,
        ));
    }

    let tree_edges = (2..=scenario.size)
        .zip(&scenario.parents)
        .map(|(child, parent)| (child, parent.index((child - 1) as usize) as u32 + 1));
    for (a, b) in tree_edges.chain(scenario.extra_edges.iter().copied()) {
        store
            .add_edge(SkillId::new(a), SkillId::new(b), ConnectorKind::Line)
            .unwrap();
    }

    SkillTree::new(store, START, TreeConfig::default()).unwrap()
}

// ---------------------------------------------------------------------------
// Ground truth
// ---------------------------------------------------------------------------

fn walkable(tree: &SkillTree, skill: SkillId) -> bool {
    !tree.node(skill).unwrap().is_mastery()
}

fn allocated_walkable(tree: &SkillTree) -> HashSet<SkillId> {
    tree.store()
        .nodes()
        .filter(|node| node.is_allocated() && !node.is_mastery())
        .map(Node::skill)
        .collect()
}

/// Hop distance from the allocated set to every node it reaches.
fn distances_from_allocated(tree: &SkillTree) -> HashMap<SkillId, u32> {
    let mut distances: HashMap<SkillId, u32> = HashMap::new();
    let mut queue = VecDeque::new();
    for skill in allocated_walkable(tree) {
        distances.insert(skill, 0);
        queue.push_back(skill);
    }
    while let Some(current) = queue.pop_front() {
        let next = distances[&current] + 1;
        for &other in tree.node(current).unwrap().neighbors() {
            if walkable(tree, other) && !distances.contains_key(&other) {
                distances.insert(other, next);
                queue.push_back(other);
            }
        }
    }
    distances
}

/// Skills in `allocated` that the start reaches without leaving it.
fn connected_to_start(tree: &SkillTree, allocated: &HashSet<SkillId>) -> HashSet<SkillId> {
    let mut seen = HashSet::new();
    if !allocated.contains(&START) {
        return seen;
    }
    let mut stack = vec![START];
    seen.insert(START);
    while let Some(current) = stack.pop() {
        for &other in tree.node(current).unwrap().neighbors() {
            if allocated.contains(&other) && seen.insert(other) {
                stack.push(other);
            }
        }
    }
    seen
}

fn adjacent(tree: &SkillTree, a: SkillId, b: SkillId) -> bool {
    tree.node(a).unwrap().neighbors().contains(&b)
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

fn check_states(tree: &SkillTree) -> Result<(), TestCaseError> {
    for node in tree.store().nodes() {
        prop_assert_eq!(
            node.is_allocated(),
            node.state() == NodeState::Active,
            "node {} state {:?}",
            node.skill(),
            node.state()
        );
    }
    for connector in tree.store().connectors() {
        let a = tree.node(connector.start_node()).unwrap().is_allocated();
        let b = tree.node(connector.end_node()).unwrap().is_allocated();
        prop_assert_eq!(connector.state() == NodeState::Active, a && b, "{}", connector.id());
        prop_assert_eq!(connector.state() == NodeState::Default, !a && !b, "{}", connector.id());
    }
    Ok(())
}

fn check_start(tree: &SkillTree) -> Result<(), TestCaseError> {
    let start = tree.node(START).unwrap();
    prop_assert!(start.is_allocated());
    prop_assert!(start.dependency_of().contains(&START));
    Ok(())
}

fn check_distances(tree: &SkillTree) -> Result<(), TestCaseError> {
    let truth = distances_from_allocated(tree);
    for node in tree.store().nodes().filter(|node| !node.is_allocated()) {
        let skill = node.skill();
        match truth.get(&skill) {
            Some(&expected) if !node.is_mastery() => {
                prop_assert_eq!(node.path_distance(), expected, "distance of {}", skill);

                let path = node.path();
                prop_assert_eq!(path.len() as u32, expected);
                prop_assert_eq!(path[0], skill);
                for pair in path.windows(2) {
                    prop_assert!(adjacent(tree, pair[0], pair[1]));
                    prop_assert!(!tree.node(pair[1]).unwrap().is_allocated());
                }
                let last = path[path.len() - 1];
                let anchored = tree
                    .node(last)
                    .unwrap()
                    .neighbors()
                    .iter()
                    .any(|&other| {
                        tree.node(other).unwrap().is_allocated() && walkable(tree, other)
                    });
                prop_assert!(
                    anchored,
                    "path of {} ends at {} with no allocated neighbor",
                    skill,
                    last
                );
            }
            _ => {
                prop_assert_eq!(node.path_distance(), SENTINEL, "distance of {}", skill);
                prop_assert!(node.path().is_empty());
            }
        }
    }
    Ok(())
}

/// Removing a node with its dependents orphans nothing, and the dependents
/// are exactly what would have been orphaned.
fn check_dependents(tree: &SkillTree) -> Result<(), TestCaseError> {
    let allocated = allocated_walkable(tree);
    prop_assert_eq!(connected_to_start(tree, &allocated), allocated.clone());

    for &skill in &allocated {
        if skill == START {
            continue;
        }
        let dependents: BTreeSet<SkillId> =
            tree.node(skill).unwrap().dependency_of().iter().copied().collect();
        prop_assert!(!dependents.contains(&START));

        let without: HashSet<SkillId> = allocated
            .iter()
            .copied()
            .filter(|other| !dependents.contains(other))
            .collect();
        prop_assert_eq!(connected_to_start(tree, &without), without.clone());

        let mut remaining = allocated.clone();
        remaining.remove(&skill);
        let kept = connected_to_start(tree, &remaining);
        let mut orphaned: BTreeSet<SkillId> =
            remaining.difference(&kept).copied().collect();
        orphaned.insert(skill);
        prop_assert_eq!(dependents, orphaned, "dependents of {}", skill);
    }
    Ok(())
}

fn check_all(tree: &SkillTree) -> Result<(), TestCaseError> {
    check_states(tree)?;
    check_start(tree)?;
    check_distances(tree)?;
    check_dependents(tree)
}

// ---------------------------------------------------------------------------
// Engine properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn invariants_hold_after_every_click(scenario in arb_scenario()) {
        let mut tree = build(&scenario);
        check_all(&tree)?;
        for &raw in &scenario.clicks {
            tree.click(SkillId::new(raw)).unwrap();
            check_all(&tree)?;
        }
    }

    #[test]
    fn start_is_never_in_a_removal_batch(scenario in arb_scenario()) {
        let mut tree = build(&scenario);
        for &raw in &scenario.clicks {
            let outcome = tree.click(SkillId::new(raw)).unwrap();
            prop_assert!(!outcome.changed().contains(&START));
            prop_assert!(tree.node(START).unwrap().is_allocated());
        }
    }

    #[test]
    fn reset_is_idempotent(scenario in arb_scenario()) {
        let mut tree = build(&scenario);
        for &raw in &scenario.clicks {
            tree.click(SkillId::new(raw)).unwrap();
        }
        tree.reset().unwrap();
        let first = tree.snapshot();
        prop_assert_eq!(tree.allocated(), vec![START]);
        tree.reset().unwrap();
        prop_assert_eq!(tree.allocated(), vec![START]);
        prop_assert_eq!(tree.snapshot(), first);
    }

    /// The analysis gives the same answer in any processing order.
    #[test]
    fn dependents_do_not_depend_on_order(
        scenario in arb_scenario(),
        seed in any::<u64>(),
    ) {
        let mut tree = build(&scenario);
        for &raw in &scenario.clicks {
            tree.click(SkillId::new(raw)).unwrap();
        }

        let order = dependency::processing_order(tree.store());
        let mut shuffled = order.clone();
        shuffled.sort_by_key(|skill| {
            u64::from(skill.raw())
                .wrapping_mul(seed | 1)
                .rotate_left(17)
        });

        let expected = dependency::analyze(tree.store(), &order).unwrap();
        let actual = dependency::analyze(tree.store(), &shuffled).unwrap();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn export_import_restores_the_session(scenario in arb_scenario()) {
        let mut tree = build(&scenario);
        for &raw in &scenario.clicks {
            tree.click(SkillId::new(raw)).unwrap();
        }
        let code = tree.export().unwrap();

        let mut other = build(&scenario);
        let pruned = other.import(&code).unwrap();
        prop_assert!(pruned.is_empty());
        prop_assert_eq!(other.snapshot(), tree.snapshot());
    }
}

// ---------------------------------------------------------------------------
// Codec properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn codec_round_trips_any_set(
        skills in prop::collection::btree_set(0u32..=65_535, 0..1000),
        start in 0u32..=65_535,
    ) {
        let start = SkillId::new(start);
        let encoded = codec::encode(skills.iter().copied().map(SkillId::new), start).unwrap();
        prop_assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '='));

        let expected: Vec<SkillId> = skills
            .iter()
            .copied()
            .map(SkillId::new)
            .filter(|&skill| skill != start)
            .collect();
        prop_assert_eq!(codec::decode(&encoded).unwrap(), expected);
    }

    #[test]
    fn decode_never_panics(input in "[A-Za-z0-9_=-]{0,64}") {
        let _ = codec::decode(&input);
    }
}
