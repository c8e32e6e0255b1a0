//! Allocated-Stat Summary
//!
//! Groups the stat lines of allocated nodes by their generic text and sums
//! the numbers. "+10% increased Damage" and "+5% increased Damage" both
//! become "+#% increased Damage" with a total of 15.
//!
//! Patterns are tried in order and only the first number of a line is
//! replaced:
//!
//! | pattern          | generic form | value          |
//! |------------------|--------------|----------------|
//! | `+N%` or `N%`    | `+#%`, `#%`  | N              |
//! | `an additional`  | `#`          | 1              |
//! | `+N`             | `+#`         | N              |
//! | `N`              | `#`          | N              |
//! | no number        | unchanged    | 1, not summed  |

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::allocation::SkillTree;
use crate::graph::GraphStore;

fn percent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\+?)(\d*\.?\d+)%").expect("percent pattern"))
}

fn additional() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"an additional").expect("additional pattern"))
}

fn plus_flat() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+(\d*\.?\d+)").expect("plus pattern"))
}

fn flat() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d*\.?\d+)").expect("flat pattern"))
}

/// Summed stats keyed by generic stat text, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StatSummary {
    totals: IndexMap<String, f64>,
}

impl StatSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one stat line into the summary.
    pub fn add_line(&mut self, line: &str) {
        match generalize(line) {
            Some((generic, value)) => *self.totals.entry(generic).or_insert(0.0) += value,
            None => {
                self.totals.entry(line.to_string()).or_insert(1.0);
            }
        }
    }

    pub fn get(&self, generic: &str) -> Option<f64> {
        self.totals.get(generic).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.totals.iter().map(|(text, &value)| (text.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}

/// Split a stat line into its generic text and value.
///
/// Returns `None` for lines that carry no number.
fn generalize(line: &str) -> Option<(String, f64)> {
    if let Some(caps) = percent().captures(line) {
        let value = caps[2].parse().ok()?;
        return Some((percent().replacen(line, 1, "$1#%").into_owned(), value));
    }
    if additional().is_match(line) {
        return Some((additional().replacen(line, 1, "#").into_owned(), 1.0));
    }
    if let Some(caps) = plus_flat().captures(line) {
        let value = caps[1].parse().ok()?;
        return Some((plus_flat().replacen(line, 1, "+#").into_owned(), value));
    }
    if let Some(caps) = flat().captures(line) {
        let value = caps[1].parse().ok()?;
        return Some((flat().replacen(line, 1, "#").into_owned(), value));
    }
    None
}

/// Summarize the stats of every allocated node, masteries included.
pub fn summarize(store: &GraphStore) -> StatSummary {
    let mut summary = StatSummary::new();
    for node in store.nodes().filter(|node| node.is_allocated()) {
        for line in node.stats() {
            summary.add_line(line);
        }
    }
    summary
}

impl SkillTree {
    /// Summarize the stats of the current allocation.
    pub fn summary(&self) -> StatSummary {
        summarize(self.store())
    }
}
