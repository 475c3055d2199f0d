//! Storage for resolved actions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::foundation::event::{Action, ActionId};

/// Keeps resolved actions by id so they can be looked up after dispatch.
pub trait ActionCache: Send + Sync + 'static {
    /// Stores `action`, replacing any action with the same id.
    fn put(&self, action: Action);

    fn get(&self, id: &ActionId) -> Option<Action>;

    fn remove(&self, id: &ActionId) -> Option<Action>;

    /// Every cached action, in no particular order.
    fn all(&self) -> Vec<Action>;
}

/// In-memory [`ActionCache`].
#[derive(Clone, Default)]
pub struct MemoryActionCache {
    actions: Arc<RwLock<HashMap<ActionId, Action>>>,
}

impl MemoryActionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }
}

impl ActionCache for MemoryActionCache {
    fn put(&self, action: Action) {
        self.actions.write().insert(action.id().clone(), action);
    }

    fn get(&self, id: &ActionId) -> Option<Action> {
        self.actions.read().get(id).cloned()
    }

    fn remove(&self, id: &ActionId) -> Option<Action> {
        self.actions.write().remove(id)
    }

    fn all(&self) -> Vec<Action> {
        self.actions.read().values().cloned().collect()
    }
}

impl fmt::Debug for MemoryActionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryActionCache")
            .field("len", &self.len())
            .finish()
    }
}
