//! Allocation
//!
//! The user-facing session over a loaded tree: clicking nodes, resetting,
//! sharing allocations as text, hover previews and change notifications.
//!
//! All mutation goes through [`SkillTree`]. Each batch of changes ends with a
//! single recompute cycle, so the derived fields of every node are current
//! whenever a public method returns.

mod events;
mod preview;
mod tree;

pub use events::{AllocationEvent, AllocationEventKind, AllocationEvents, ListenerId};
pub use preview::PreviewToken;
pub use tree::{ClickOutcome, PySkillTree, SkillTree};
