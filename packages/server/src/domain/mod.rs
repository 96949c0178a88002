//! Domain layer for the presence-aware router.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod factory;
pub mod outbox;
pub mod repository;
pub mod transport;
pub mod value_object;

pub use entity::{ChatMessage, Connection, ConnectionTable, Delivery, MessageBody, PresenceSnapshot};
pub use error::{RegistryError, RoutingError, ValueObjectError};
pub use factory::ConnectionIdFactory;
pub use outbox::{PresenceInbox, PresenceOutbox};
pub use repository::ConnectionRegistry;
pub use transport::{OutboundEvent, Transport};
pub use value_object::{
    ConnectionId, DEFAULT_DISPLAY_NAME, DisplayName, FileReference, MessageKind, Timestamp,
};

#[cfg(test)]
pub use transport::MockTransport;
