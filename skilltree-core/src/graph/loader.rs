//! Tree Definition Loader
//!
//! Turns the JSON tree definition into a [`GraphStore`].
//!
//! # Geometry
//!
//! A node sits on a ring (orbit) around its group centre. Orbits with 16 and
//! 40 slots use fixed, irregular angle tables; every other orbit spaces its
//! slots evenly. With `angle` in radians:
//!
//! ```text
//! x = group.x - radius[orbit] * sin(-angle)
//! y = group.y - radius[orbit] * cos(-angle)
//! ```
//!
//! Nodes of group 0 are pinned to the origin.
//!
//! # Topology
//!
//! The definition lists neighbors as `out` and `in` strings. Both are folded
//! into one undirected neighbor list, and one connector is created per edge.
//! Proxy records and records without a skill or group never enter the graph.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::{TreeConfig, DEFAULT_START_SKILL};
use crate::error::{Result, TreeError};

use super::connector::ConnectorKind;
use super::node::{Node, NodeFlags, NodeSpec, Position, SkillId};
use super::store::GraphStore;

/// Skills per orbit when the definition carries no constants.
pub const DEFAULT_SKILLS_PER_ORBIT: [u32; 7] = [1, 6, 16, 16, 40, 72, 72];

/// Orbit radii when the definition carries no constants.
pub const DEFAULT_ORBIT_RADII: [f64; 7] = [0.0, 82.0, 162.0, 335.0, 493.0, 662.0, 846.0];

const SIXTEEN_SLOT_ANGLES: [f64; 16] = [
    0.0, 30.0, 45.0, 60.0, 90.0, 120.0, 135.0, 150.0, 180.0, 210.0, 225.0, 240.0, 270.0, 300.0,
    315.0, 330.0,
];

const FORTY_SLOT_ANGLES: [f64; 40] = [
    0.0, 10.0, 20.0, 30.0, 40.0, 45.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 120.0, 130.0,
    135.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0, 200.0, 210.0, 220.0, 225.0, 230.0, 240.0,
    250.0, 260.0, 270.0, 280.0, 290.0, 300.0, 310.0, 315.0, 320.0, 330.0, 340.0, 350.0,
];

/// Raw tree definition as shipped with the game data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDefinition {
    #[serde(default)]
    pub groups: HashMap<String, GroupDef>,
    #[serde(default)]
    pub nodes: IndexMap<String, NodeDef>,
    #[serde(default)]
    pub constants: Option<OrbitConstants>,
    #[serde(default)]
    pub points: Option<PointsDef>,
}

impl TreeDefinition {
    /// Parse a definition from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Position of a node cluster.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct GroupDef {
    pub x: f64,
    pub y: f64,
}

/// One node record of the definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub skill: Option<u32>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stats: Vec<String>,
    pub group: Option<u32>,
    #[serde(default)]
    pub orbit: u32,
    #[serde(default)]
    pub orbit_index: u32,
    #[serde(default)]
    pub out: Vec<String>,
    #[serde(default, rename = "in")]
    pub inbound: Vec<String>,
    #[serde(default)]
    pub is_notable: bool,
    #[serde(default)]
    pub is_keystone: bool,
    #[serde(default)]
    pub is_mastery: bool,
    #[serde(default)]
    pub is_jewel_socket: bool,
    #[serde(default)]
    pub is_start_point: bool,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default)]
    pub hidden: bool,
    pub class_start_index: Option<u32>,
    pub ascendancy_name: Option<String>,
}

/// Orbit layout constants.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrbitConstants {
    pub skills_per_orbit: Vec<u32>,
    pub orbit_radii: Vec<f64>,
}

impl Default for OrbitConstants {
    fn default() -> Self {
        Self {
            skills_per_orbit: DEFAULT_SKILLS_PER_ORBIT.to_vec(),
            orbit_radii: DEFAULT_ORBIT_RADII.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsDef {
    pub total_points: u32,
}

/// Read-only group geometry kept for renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group {
    pub id: u32,
    pub position: Position,
}

/// Result of loading a definition.
#[derive(Debug, Clone)]
pub struct LoadedTree {
    pub store: GraphStore,
    pub start: SkillId,
    pub groups: Vec<Group>,
    pub total_points: Option<u32>,
}

/// Compute the angle table, in degrees, of every orbit.
pub fn orbit_angles(skills_per_orbit: &[u32]) -> Vec<Vec<f64>> {
    skills_per_orbit
        .iter()
        .map(|&count| match count {
            16 => SIXTEEN_SLOT_ANGLES.to_vec(),
            40 => FORTY_SLOT_ANGLES.to_vec(),
            n => (0..n).map(|i| 360.0 * f64::from(i) / f64::from(n)).collect(),
        })
        .collect()
}

/// Compute a node's screen position from its group centre and orbit slot.
pub fn node_position(
    group_id: u32,
    group: Position,
    orbit: u32,
    orbit_index: u32,
    angles: &[Vec<f64>],
    radii: &[f64],
) -> Option<Position> {
    if group_id == 0 {
        return Some(Position::default());
    }
    let degrees = *angles.get(orbit as usize)?.get(orbit_index as usize)?;
    let radius = *radii.get(orbit as usize)?;
    let angle = degrees * PI / 180.0;
    Some(Position {
        x: group.x - radius * (-angle).sin(),
        y: group.y - radius * (-angle).cos(),
    })
}

fn is_loadable(def: &NodeDef) -> bool {
    def.skill.is_some() && def.group.is_some() && !def.is_proxy
}

fn pick_start(
    definition: &TreeDefinition,
    loaded: &HashSet<u32>,
    config: &TreeConfig,
) -> Result<SkillId> {
    if let Some(start) = config.start_skill {
        return if loaded.contains(&start.raw()) {
            Ok(start)
        } else {
            Err(TreeError::InvalidDefinition(format!(
                "configured start skill {start} is not in the tree"
            )))
        };
    }

    let loadable = || definition.nodes.values().filter(|def| is_loadable(def));
    loadable()
        .find(|def| def.is_start_point)
        .or_else(|| loadable().find(|def| def.class_start_index.is_some()))
        .and_then(|def| def.skill)
        .map(SkillId::new)
        .or_else(|| loaded.contains(&DEFAULT_START_SKILL.raw()).then_some(DEFAULT_START_SKILL))
        .ok_or_else(|| TreeError::InvalidDefinition("tree has no start node".to_string()))
}

/// Build the graph described by `definition`.
pub fn load(definition: &TreeDefinition, config: &TreeConfig) -> Result<LoadedTree> {
    let constants = definition.constants.clone().unwrap_or_default();
    let angles = orbit_angles(&constants.skills_per_orbit);

    let loaded: HashSet<u32> = definition
        .nodes
        .values()
        .filter(|def| is_loadable(def))
        .filter_map(|def| def.skill)
        .collect();
    let start = pick_start(definition, &loaded, config)?;

    let mut store = GraphStore::new(config.sentinel);
    let mut defs: HashMap<SkillId, &NodeDef> = HashMap::new();

    for def in definition.nodes.values().filter(|def| is_loadable(def)) {
        let (Some(raw), Some(group_id)) = (def.skill, def.group) else {
            continue;
        };
        let skill = SkillId::new(raw);
        let group = match definition.groups.get(&group_id.to_string()) {
            Some(group) => Position { x: group.x, y: group.y },
            None if group_id == 0 => Position::default(),
            None => {
                return Err(TreeError::InvalidDefinition(format!(
                    "skill {skill} references missing group {group_id}"
                )))
            }
        };
        let position = node_position(
            group_id,
            group,
            def.orbit,
            def.orbit_index,
            &angles,
            &constants.orbit_radii,
        )
        .ok_or_else(|| {
            TreeError::InvalidDefinition(format!(
                "skill {skill} has no slot {} on orbit {}",
                def.orbit_index, def.orbit
            ))
        })?;

        let is_start = skill == start;
        store.add_node(Node::new(
            NodeSpec {
                skill,
                name: def.name.clone(),
                stats: def.stats.clone(),
                group: group_id,
                orbit: def.orbit,
                orbit_index: def.orbit_index,
                position,
                flags: NodeFlags {
                    is_notable: def.is_notable,
                    is_keystone: def.is_keystone,
                    is_mastery: def.is_mastery,
                    is_jewel_socket: def.is_jewel_socket,
                    is_start_point: is_start,
                    is_proxy: false,
                    hidden: def.hidden || is_start,
                },
            },
            config.sentinel,
        ));
        defs.insert(skill, def);
    }

    let skills: Vec<SkillId> = store.nodes().map(Node::skill).collect();
    for skill in skills {
        let def = defs[&skill];
        for reference in def.out.iter().chain(def.inbound.iter()) {
            let Ok(raw) = reference.parse::<u32>() else {
                warn!(%skill, reference = %reference, "ignoring malformed neighbor reference");
                continue;
            };
            let other = SkillId::new(raw);
            let Some(other_def) = defs.get(&other) else {
                if definition.nodes.contains_key(reference) {
                    debug!(%skill, %other, "skipping link to filtered node");
                } else {
                    warn!(%skill, %other, "skipping link to unknown node");
                }
                continue;
            };
            if def.ascendancy_name != other_def.ascendancy_name {
                continue;
            }
            let kind = if def.group == other_def.group && def.orbit == other_def.orbit {
                ConnectorKind::Arc
            } else {
                ConnectorKind::Line
            };
            store.add_edge(skill, other, kind)?;
            if def.hidden || other_def.hidden || skill == start || other == start {
                store.set_connector_hidden(skill, other, true);
            }
        }
    }

    let mut groups: Vec<Group> = definition
        .groups
        .iter()
        .filter_map(|(id, group)| {
            id.parse::<u32>().ok().map(|id| Group {
                id,
                position: Position { x: group.x, y: group.y },
            })
        })
        .collect();
    groups.sort_by_key(|group| group.id);

    info!(
        nodes = store.node_count(),
        connectors = store.connector_count(),
        groups = groups.len(),
        %start,
        "tree loaded"
    );

    Ok(LoadedTree {
        store,
        start,
        groups,
        total_points: definition.points.map(|points| points.total_points),
    })
}
