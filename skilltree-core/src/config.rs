//! Engine Configuration
//!
//! Settings that vary between trees rather than between builds. Every field
//! has a default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::graph::SkillId;

/// Distance stored on nodes that no allocated node can reach.
pub const DEFAULT_SENTINEL: u32 = 1000;

/// Start node of the atlas tree, used when the definition flags none.
pub const DEFAULT_START_SKILL: SkillId = SkillId::new(29_045);

/// Configuration for a skill tree session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    /// Explicit start node. When unset the loader uses the node the
    /// definition marks as a start point.
    pub start_skill: Option<SkillId>,

    /// Advisory point budget. Zero means unlimited.
    pub total_points: u32,

    /// Distance recorded for unreachable nodes.
    pub sentinel: u32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            start_skill: None,
            total_points: 0,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

impl TreeConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_start_skill(mut self, skill: SkillId) -> Self {
        self.start_skill = Some(skill);
        self
    }

    pub fn with_total_points(mut self, points: u32) -> Self {
        self.total_points = points;
        self
    }
}
