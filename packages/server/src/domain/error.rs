//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::ConnectionId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// FileReference without a location
    #[error("FileReference url cannot be empty")]
    FileReferenceUrlEmpty,
}

/// Errors raised by the connection registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The transport reported an open for an id that is already registered.
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),

    /// The connection is not (or no longer) registered.
    #[error("connection '{0}' is not registered")]
    UnknownConnection(ConnectionId),
}

/// Errors raised while routing a chat message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// The message kind is not one of the recognized kinds, or its body does
    /// not match the kind.
    #[error("invalid message kind: '{0}'")]
    InvalidMessageKind(String),

    /// The private message target is not registered at routing time.
    #[error("private message target '{0}' is not connected")]
    MissingPrivateTarget(String),
}
