use crate::commitlog::Index;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum LogReadError {
    #[error("Failed to read log entry {0:?}: {1:?}")]
    Io(Index, io::Error),

    // Not in the cache, and the durable log has nothing there either. Most likely the entry was
    // compacted, or `NewEntries` ran ahead of the append path.
    #[error("Log entry {0:?} is neither cached nor in the durable log")]
    MissingEntry(Index),
}

#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("Skipped send this cycle: {0}")]
    LogRead(#[from] LogReadError),
}
