mod entry_cache;
mod in_memory;
mod log;

pub use entry_cache::EntryCache;
pub use in_memory::InMemoryLog;
pub use log::DurableLog;
pub use log::Index;
pub use log::LogEntry;
pub use log::Term;
