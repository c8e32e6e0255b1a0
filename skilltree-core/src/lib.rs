//! Skill Tree Core
//!
//! This crate provides the allocation engine for a passive skill tree editor.
//! It implements:
//!
//! - Loading a tree definition into an undirected skill graph
//! - Shortest paths from the allocated set to every other node
//! - Dependency analysis: which allocations would be orphaned by a removal
//! - Click, reset and import/export of allocations
//!
//! The crate is designed to be used both as a native Rust library and as a
//! Python extension module via PyO3.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Nodes, connectors, the node store and the definition loader
//! - `engine`: The recompute cycle (distances, paths, dependents)
//! - `allocation`: The editing session built on top of the engine
//! - `codec`: Shareable text encoding of an allocated set
//! - `summary`: Aggregated stats of the allocated nodes
//!
//! # Example
//!
//! ```rust,ignore
//! use skilltree_core::{SkillId, SkillTree, TreeConfig};
//!
//! let mut tree = SkillTree::from_json(&definition, TreeConfig::default())?;
//!
//! // Allocate a node together with its whole path
//! tree.click(SkillId::new(4))?;
//!
//! // Share the allocation
//! let code = tree.export()?;
//! ```

pub mod allocation;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod summary;

pub use allocation::{ClickOutcome, SkillTree};
pub use config::TreeConfig;
pub use error::{CodecError, Result, TreeError};
pub use graph::{NodeState, SkillId};

use pyo3::prelude::*;

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<allocation::PySkillTree>()?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
