use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::ability::AbilityOrchestrator;

/// Lookup table through which other host components discover a running ability.
///
/// Entries hold weak references, so a published ability is not kept alive by
/// the locator once its host component lets go of it.
#[derive(Clone, Default)]
pub struct AbilityLocator {
    entries: Arc<DashMap<String, Weak<AbilityOrchestrator>>>,
}

impl AbilityLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `ability` under `key`, replacing any previous entry.
    pub fn publish(&self, key: &str, ability: &Arc<AbilityOrchestrator>) {
        self.entries
            .insert(key.to_string(), Arc::downgrade(ability));
    }

    pub fn lookup(&self, key: &str) -> Option<Arc<AbilityOrchestrator>> {
        self.entries.get(key).and_then(|entry| entry.value().upgrade())
    }

    /// Removes the entry under `key` only if it still points at `ability`.
    pub fn withdraw(&self, key: &str, ability: &Weak<AbilityOrchestrator>) -> bool {
        self.entries
            .remove_if(key, |_, published| Weak::ptr_eq(published, ability))
            .is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
