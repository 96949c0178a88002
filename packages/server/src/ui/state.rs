//! Server state and connection management.

use std::sync::Arc;

use crate::{
    common::clock::MessageClock,
    domain::{ConnectionRegistry, PresenceOutbox},
    infrastructure::{repository::InMemoryConnectionRegistry, transport::WebSocketTransport},
    usecase::PresenceBroadcaster,
};

/// Shared application state
pub struct AppState {
    /// Registry（データアクセス層の抽象化）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// WebSocket sender channels for delivery
    pub transport: Arc<WebSocketTransport>,
    /// Presence broadcaster (shares the transport)
    pub broadcaster: Arc<PresenceBroadcaster>,
    /// Message timestamps
    pub clock: Arc<MessageClock>,
}

impl AppState {
    /// Wire an empty registry, the WebSocket transport and the broadcaster together.
    ///
    /// The registry feeds committed snapshots to the broadcaster through the outbox.
    pub fn new() -> Self {
        let transport = Arc::new(WebSocketTransport::new());
        let (outbox, inbox) = PresenceOutbox::channel();
        let broadcaster = Arc::new(PresenceBroadcaster::new(transport.clone(), inbox));
        Self {
            registry: Arc::new(InMemoryConnectionRegistry::new(outbox)),
            transport,
            broadcaster,
            clock: Arc::new(MessageClock::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
