use crate::commitlog::{DurableLog, EntryCache, Index, LogEntry, Term};
use bytes::Bytes;
use std::io;
use std::sync::RwLock;

// Not durable at all. Good enough to stand in for the leader's log in tests and in-process
// wiring; a disk-backed log only needs to implement `DurableLog`.
pub struct InMemoryLog {
    entries: RwLock<Vec<LogEntry>>,
    // Written on every append so streams can ship new entries without touching the log.
    entry_cache: Option<EntryCache>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        InMemoryLog {
            entries: RwLock::new(Vec::new()),
            entry_cache: None,
        }
    }

    pub fn with_entry_cache(entry_cache: EntryCache) -> Self {
        InMemoryLog {
            entries: RwLock::new(Vec::new()),
            entry_cache: Some(entry_cache),
        }
    }

    /// Appends an entry at the next index and returns that index.
    pub fn append(&self, term: Term, payload: Bytes) -> Result<Index, io::Error> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let index = Index::new(entries.len() as u64 + 1);
        let entry = LogEntry::new(index, term, payload);

        if let Some(cache) = &self.entry_cache {
            cache.put(index, entry.clone());
        }
        entries.push(entry);

        Ok(index)
    }

    /// Removes `index` and everything after it.
    pub fn truncate(&self, index: Index) -> Result<(), io::Error> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let keep = index.as_u64().saturating_sub(1) as usize;

        if let Some(cache) = &self.entry_cache {
            for removed in entries.iter().skip(keep) {
                cache.remove(removed.index);
            }
        }
        entries.truncate(keep);

        Ok(())
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        InMemoryLog::new()
    }
}

impl DurableLog for InMemoryLog {
    fn entry_at(&self, index: Index) -> Result<Option<LogEntry>, io::Error> {
        if index.is_zero() {
            return Ok(None);
        }

        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(index.as_u64() as usize - 1).cloned())
    }

    fn last_index(&self) -> Index {
        match self.entries.read() {
            Ok(entries) => Index::new(entries.len() as u64),
            // A writer panicked mid-append. The vec itself is still intact.
            Err(poisoned) => Index::new(poisoned.into_inner().len() as u64),
        }
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "InMemoryLog lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_read() {
        let log = InMemoryLog::new();
        assert_eq!(log.last_index(), Index::zero());
        assert_eq!(log.entry_at(Index::zero()).unwrap(), None);
        assert_eq!(log.entry_at(Index::start_index()).unwrap(), None);

        let first = log.append(Term::new(1), Bytes::from("a")).unwrap();
        let second = log.append(Term::new(2), Bytes::from("b")).unwrap();

        assert_eq!(first, Index::new(1));
        assert_eq!(second, Index::new(2));
        assert_eq!(log.last_index(), Index::new(2));

        let entry = log.entry_at(second).unwrap().unwrap();
        assert_eq!(entry.index, second);
        assert_eq!(entry.term, Term::new(2));
        assert_eq!(entry.payload, Bytes::from("b"));
        assert_eq!(log.entry_at(Index::new(3)).unwrap(), None);
    }

    #[test]
    fn append_populates_entry_cache() {
        let cache = EntryCache::new();
        let log = InMemoryLog::with_entry_cache(cache.clone());

        let index = log.append(Term::new(3), Bytes::from("x")).unwrap();

        assert_eq!(cache.get(index), log.entry_at(index).unwrap());
    }

    #[test]
    fn truncate_removes_suffix_from_log_and_cache() {
        let cache = EntryCache::new();
        let log = InMemoryLog::with_entry_cache(cache.clone());
        for _ in 0..5 {
            log.append(Term::new(1), Bytes::new()).unwrap();
        }

        log.truncate(Index::new(3)).unwrap();

        assert_eq!(log.last_index(), Index::new(2));
        assert_eq!(log.entry_at(Index::new(3)).unwrap(), None);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(Index::new(3)).is_none());

        let index = log.append(Term::new(2), Bytes::new()).unwrap();
        assert_eq!(index, Index::new(3));
    }
}
