use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use strata_plugin_api::Component;

use crate::types::CapabilityKind;

pub type ComponentInstance = Arc<dyn Component>;

#[derive(Clone)]
pub struct RegistryEntry {
    pub code: String,
    pub identity: String,
    pub instance: ComponentInstance,
}

#[derive(Default, Clone)]
struct RegistrySnapshot {
    by_kind: HashMap<CapabilityKind, Vec<RegistryEntry>>,
}

impl RegistrySnapshot {
    fn upsert(&mut self, kind: CapabilityKind, entry: RegistryEntry) {
        let entries = self.by_kind.entry(kind).or_default();
        match entries.iter_mut().find(|e| e.identity == entry.identity) {
            Some(slot) => *slot = entry,
            None => entries.push(entry),
        }
    }
}

/// Process-wide mapping from capability kind to the live instances serving
/// that kind.
///
/// Copy-on-write: readers load an immutable snapshot and never block;
/// writers are serialized and publish a whole batch in one swap, so readers
/// observe either none or all of an activation's entries. Entries are keyed
/// by `(kind, identity)`: an overwrite changes what future lookups resolve
/// to while instances already captured by callers stay valid.
pub struct CapabilityRegistry {
    write_lock: Mutex<()>,
    snapshot: ArcSwap<RegistrySnapshot>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self {
            write_lock: Mutex::new(()),
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::default()),
        }
    }

    /// Idempotent upsert of a single entry.
    pub fn register(&self, kind: CapabilityKind, entry: RegistryEntry) {
        self.apply(vec![(kind, entry)]);
    }

    /// Upserts a whole batch in one snapshot swap.
    pub fn apply(&self, batch: Vec<(CapabilityKind, RegistryEntry)>) {
        if batch.is_empty() {
            return;
        }
        let _guard = self.write_lock.lock().ok();
        let mut next = RegistrySnapshot::clone(&self.snapshot.load_full());
        for (kind, entry) in batch {
            next.upsert(kind, entry);
        }
        self.snapshot.store(Arc::new(next));
    }

    pub fn lookup(&self, kind: CapabilityKind) -> Vec<ComponentInstance> {
        let snapshot = self.snapshot.load();
        snapshot
            .by_kind
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.instance.clone()).collect())
            .unwrap_or_default()
    }

    /// The current winner for kinds expected to hold a singleton: the most
    /// recently registered instance, `None` when the kind is empty.
    pub fn lookup_one(&self, kind: CapabilityKind) -> Option<ComponentInstance> {
        let snapshot = self.snapshot.load();
        snapshot
            .by_kind
            .get(&kind)
            .and_then(|entries| entries.last())
            .map(|e| e.instance.clone())
    }

    pub fn entries(&self, kind: CapabilityKind) -> Vec<RegistryEntry> {
        let snapshot = self.snapshot.load();
        snapshot.by_kind.get(&kind).cloned().unwrap_or_default()
    }

    /// Total entry count across kinds.
    pub fn size(&self) -> usize {
        let snapshot = self.snapshot.load();
        snapshot.by_kind.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;
