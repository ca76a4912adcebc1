mod command;
mod error;
mod manager;
mod stream;

pub use command::LeaderContext;
pub use command::ReplicationCommand;
pub use error::LogReadError;
pub use error::ShippingError;
pub(crate) use manager::ReplicationManager;
pub(crate) use stream::ReplicationStream;
pub(crate) use stream::StreamConfig;
pub(crate) use stream::StreamResources;
pub use stream::StreamMode;
pub use stream::StreamStatus;
