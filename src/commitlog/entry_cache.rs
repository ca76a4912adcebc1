use crate::commitlog::{Index, LogEntry};
use dashmap::DashMap;
use std::sync::Arc;

/// EntryCache holds log entries that were appended by the leader but are not yet known to be
/// durable on every member, so replication streams can (re)send them without reading the
/// durable log.
///
/// Clones share the same underlying map. Eviction is driven by the owner of the log: entries are
/// removed once they are durable everywhere, and a reader that misses must fall back to the
/// durable log.
#[derive(Clone, Default)]
pub struct EntryCache {
    entries: Arc<DashMap<Index, LogEntry>>,
}

impl EntryCache {
    pub fn new() -> Self {
        EntryCache::default()
    }

    pub fn put(&self, index: Index, entry: LogEntry) {
        self.entries.insert(index, entry);
    }

    pub fn get(&self, index: Index) -> Option<LogEntry> {
        self.entries.get(&index).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, index: Index) -> Option<LogEntry> {
        self.entries.remove(&index).map(|(_, entry)| entry)
    }

    /// Evict every entry at or below `index`.
    pub fn prune_up_to(&self, index: Index) {
        self.entries.retain(|cached_index, _| *cached_index > index);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
