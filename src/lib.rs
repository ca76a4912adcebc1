mod actor;
mod api;
mod cluster;
mod commitlog;
mod shipping;
mod timers;
mod transport;

pub use api::create_stdout_logger;
pub use api::try_create_log_shipper;
pub use api::LogShipper;
pub use api::LogShipperConfig;
pub use api::LogShipperCreationError;
pub use api::LogShipperError;
pub use api::ShippingOptions;
pub use cluster::cluster_membership;
pub use cluster::ClusterMembership;
pub use cluster::MemberId;
pub use cluster::MembershipChangeListener;
pub use cluster::MembershipProvider;
pub use commitlog::DurableLog;
pub use commitlog::EntryCache;
pub use commitlog::InMemoryLog;
pub use commitlog::Index;
pub use commitlog::LogEntry;
pub use commitlog::Term;
pub use shipping::LeaderContext;
pub use shipping::LogReadError;
pub use shipping::ReplicationCommand;
pub use shipping::ShippingError;
pub use shipping::StreamMode;
pub use shipping::StreamStatus;
pub use transport::channel_transport;
pub use transport::AppendEntriesRequest;
pub use transport::ChannelTransport;
pub use transport::Heartbeat;
pub use transport::OutboundMessage;
pub use transport::OutboundQueue;
pub use transport::ShippingMessage;
pub use transport::Transport;

// `crate::{root_mod}` holds no code, only `mod` and `pub use` statements. No `mod` is `pub`;
// everything public is exported through an individual `use`.
