use bytes::Bytes;
use std::{fmt, io};

/// Index is the position of an entry in the replicated log.
///
/// The first entry is written at index 1. Index 0 is the empty prefix in front of the first
/// entry; every log trivially contains it, which is what lets a mismatch search always terminate.
#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct Index(u64);

impl Index {
    pub fn new(index: u64) -> Self {
        Index(index)
    }

    /// The empty prefix of the log.
    pub fn zero() -> Self {
        Index(0)
    }

    pub fn start_index() -> Self {
        Index(1)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn plus(&self, delta: u64) -> Index {
        Index(self.0.saturating_add(delta))
    }

    pub fn saturating_minus(&self, delta: u64) -> Index {
        Index(self.0.saturating_sub(delta))
    }

    /// Number of indexes in `(other, self]`, or 0 if `other` is ahead of `self`.
    pub fn distance_from(&self, other: Index) -> u64 {
        self.0.saturating_sub(other.0)
    }
}

impl fmt::Debug for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Default, PartialOrd, PartialEq, Ord, Eq, Hash)]
pub struct Term(u64);

impl Term {
    pub fn new(term: u64) -> Self {
        Term(term)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single replicated log record. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub index: Index,
    pub term: Term,
    pub payload: Bytes,
}

impl LogEntry {
    pub fn new(index: Index, term: Term, payload: Bytes) -> Self {
        LogEntry { index, term, payload }
    }
}

/// DurableLog is the read side of the leader's append-only replicated log.
///
/// Implementations are shared between the log-append path and every replication stream, so they
/// must be internally synchronized.
pub trait DurableLog: Send + Sync {
    /// Read the entry at `index`. Returns `Ok(None)` if no entry is stored there, either because it
    /// hasn't been appended yet or because it has been compacted away.
    fn entry_at(&self, index: Index) -> Result<Option<LogEntry>, io::Error>;

    /// Index of the last appended entry, or `Index::zero()` for an empty log.
    fn last_index(&self) -> Index;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_arithmetic_saturates() {
        assert_eq!(Index::new(3).plus(2), Index::new(5));
        assert_eq!(Index::new(u64::MAX - 1).plus(u64::MAX), Index::new(u64::MAX));
        assert_eq!(Index::new(2).saturating_minus(5), Index::zero());
        assert_eq!(Index::new(7).distance_from(Index::new(3)), 4);
        assert_eq!(Index::new(3).distance_from(Index::new(7)), 0);
    }
}
