//! Allocation Engine
//!
//! Everything derived from the allocated set is recomputed here: distances
//! and preview paths from the allocated nodes, and for each allocated node
//! the set of nodes that would be orphaned without it.
//!
//! # Overview
//!
//! The engine works on a [`GraphStore`](crate::graph::GraphStore) and never
//! changes allocation itself. It runs once per allocation event, in time
//! linear in the size of the graph for the distance pass. It is not meant to
//! run per hover frame; previews read the stored results.

mod cycle;
pub mod dependency;
pub mod distance;

pub use cycle::{recompute, CycleReport};
pub use distance::Reachability;
