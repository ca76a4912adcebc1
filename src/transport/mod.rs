mod channel;
mod message;

pub use channel::channel_transport;
pub use channel::ChannelTransport;
pub use channel::OutboundMessage;
pub use channel::OutboundQueue;
pub use message::AppendEntriesRequest;
pub use message::Heartbeat;
pub use message::ShippingMessage;

use crate::cluster::MemberId;

/// Transport delivers messages to a peer. Sending is fire-and-forget: it must not block, and
/// there is no delivery or ordering guarantee. Lost messages are recovered by retries.
pub trait Transport: Send + Sync {
    fn send(&self, to: &MemberId, message: ShippingMessage);
}
