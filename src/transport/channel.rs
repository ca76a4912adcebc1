use crate::cluster::MemberId;
use crate::transport::{ShippingMessage, Transport};
use tokio::sync::mpsc;

pub fn channel_transport() -> (ChannelTransport, OutboundQueue) {
    let (sender, receiver) = mpsc::unbounded_channel();

    (ChannelTransport { sender }, OutboundQueue { receiver })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: MemberId,
    pub message: ShippingMessage,
}

/// In-process `Transport` that queues every message for whoever holds the `OutboundQueue`.
#[derive(Clone)]
pub struct ChannelTransport {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl Transport for ChannelTransport {
    fn send(&self, to: &MemberId, message: ShippingMessage) {
        // Once the queue is gone the message is lost, like any other dropped packet.
        let _ = self.sender.send(OutboundMessage {
            to: to.clone(),
            message,
        });
    }
}

pub struct OutboundQueue {
    receiver: mpsc::UnboundedReceiver<OutboundMessage>,
}

impl OutboundQueue {
    /// Waits for the next message. Returns `None` once every `ChannelTransport` has been dropped.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<OutboundMessage> {
        self.receiver.try_recv().ok()
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&mut self) -> Vec<OutboundMessage> {
        let mut messages = Vec::new();
        while let Some(message) = self.try_recv() {
            messages.push(message);
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitlog::{Index, Term};
    use crate::transport::Heartbeat;

    fn heartbeat(commit: u64) -> ShippingMessage {
        ShippingMessage::Heartbeat(Heartbeat {
            leader: MemberId::new("leader"),
            term: Term::new(1),
            leader_commit: Index::new(commit),
        })
    }

    #[test]
    fn messages_are_queued_in_send_order() {
        let (transport, mut queue) = channel_transport();

        transport.send(&MemberId::new("b"), heartbeat(1));
        transport.send(&MemberId::new("c"), heartbeat(2));

        let messages = queue.drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].to, MemberId::new("b"));
        assert_eq!(messages[1].message.leader_commit(), Index::new(2));
        assert!(queue.try_recv().is_none());
    }

    #[test]
    fn send_after_queue_dropped_is_silently_lost() {
        let (transport, queue) = channel_transport();
        drop(queue);

        transport.send(&MemberId::new("b"), heartbeat(1));
    }
}
