//! Allocation Events
//!
//! Listeners are told whenever a click, reset or import changes the
//! allocated set. Each notification carries the full allocated list, so a
//! listener never needs to query the tree back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::graph::SkillId;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// What caused the allocated set to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationEventKind {
    Click,
    Reset,
    Import,
}

/// Notification sent after the allocated set changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationEvent {
    pub kind: AllocationEventKind,
    /// Every allocated skill, start node included, in table order.
    pub allocated: Vec<SkillId>,
}

type Callback = Arc<dyn Fn(&AllocationEvent) + Send + Sync>;

/// Registry of allocation listeners.
///
/// Clones share the same registry, so a handle can be given to code that
/// does not own the tree.
#[derive(Clone, Default)]
pub struct AllocationEvents {
    listeners: Arc<RwLock<Vec<(ListenerId, Callback)>>>,
}

impl AllocationEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and return its ID.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AllocationEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::new();
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Notify every listener.
    pub fn emit(&self, event: &AllocationEvent) {
        // Release the lock before calling out so listeners may (un)subscribe.
        let callbacks: Vec<Callback> = self
            .listeners
            .read()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl fmt::Debug for AllocationEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllocationEvents")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}
