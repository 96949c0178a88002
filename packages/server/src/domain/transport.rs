//! Delivery primitives the core requires from the transport layer.

use async_trait::async_trait;

use super::{ConnectionId, Delivery, PresenceSnapshot};

/// Events the core hands to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// First event of a session, tells the client its own id
    Connected(ConnectionId),
    PresenceUpdate(PresenceSnapshot),
    ChatMessage(Delivery),
}

impl OutboundEvent {
    /// Whether a broadcast of this event is meant for `id`.
    ///
    /// A presence update goes to the connections in its snapshot. A public
    /// chat message goes to the connections open when it was routed.
    pub fn is_addressed_to(&self, id: &ConnectionId) -> bool {
        match self {
            Self::Connected(own) => own == id,
            Self::PresenceUpdate(snapshot) => snapshot.contains(id),
            Self::ChatMessage(delivery) => delivery
                .audience
                .as_ref()
                .is_none_or(|audience| audience.contains(id)),
        }
    }
}

/// One-to-one and one-to-all delivery.
///
/// Both primitives are fire-and-forget: they hand the event off and return.
/// Events for unknown or closing connections are silently discarded.
/// `send_to_all` only reaches connections the event is addressed to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to_one(&self, id: &ConnectionId, event: OutboundEvent);

    async fn send_to_all(&self, event: OutboundEvent);
}
