//! Core domain models for the presence-aware router.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use super::{
    error::RegistryError,
    value_object::{ConnectionId, DisplayName, FileReference, MessageKind, Timestamp},
};

/// A live client session known to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Transport-assigned identifier
    pub id: ConnectionId,
    /// Current display name ("Anonymous" until the client registers one)
    pub display_name: DisplayName,
    /// Timestamp when the connection was opened
    pub connected_at: Timestamp,
}

impl Connection {
    /// Create a new connection with the default display name
    pub fn new(id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            id,
            display_name: DisplayName::default(),
            connected_at,
        }
    }
}

/// Point-in-time copy of who is online.
///
/// `revision` is the commit number of the registry mutation that produced the
/// snapshot. Snapshots taken without a mutation carry the latest revision.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub revision: u64,
    pub participants: BTreeMap<ConnectionId, DisplayName>,
}

impl PresenceSnapshot {
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn display_name(&self, id: &ConnectionId) -> Option<&DisplayName> {
        self.participants.get(id)
    }
}

/// Table of open connections.
///
/// Pure state: callers are responsible for serializing access.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    connections: HashMap<ConnectionId, Connection>,
    revision: u64,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened connection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateConnection` if the id is already
    /// registered; the existing record is left untouched.
    pub fn open(&mut self, connection: Connection) -> Result<PresenceSnapshot, RegistryError> {
        if self.connections.contains_key(&connection.id) {
            return Err(RegistryError::DuplicateConnection(connection.id));
        }
        self.connections.insert(connection.id.clone(), connection);
        Ok(self.commit())
    }

    /// Overwrite the display name of a connection.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::UnknownConnection` if the id is not registered.
    pub fn set_name(
        &mut self,
        id: &ConnectionId,
        name: DisplayName,
    ) -> Result<PresenceSnapshot, RegistryError> {
        let Some(connection) = self.connections.get_mut(id) else {
            return Err(RegistryError::UnknownConnection(id.clone()));
        };
        connection.display_name = name;
        Ok(self.commit())
    }

    /// Remove a connection. Returns `None` when nothing was removed.
    pub fn close(&mut self, id: &ConnectionId) -> Option<PresenceSnapshot> {
        self.connections.remove(id)?;
        Some(self.commit())
    }

    pub fn snapshot(&self) -> PresenceSnapshot {
        PresenceSnapshot {
            revision: self.revision,
            participants: self
                .connections
                .values()
                .map(|c| (c.id.clone(), c.display_name.clone()))
                .collect(),
        }
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit(&mut self) -> PresenceSnapshot {
        self.revision += 1;
        self.snapshot()
    }
}

/// Body of a chat message, resolved once from the raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    Text(String),
    FileReference(FileReference),
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::FileReference(_) => MessageKind::File,
        }
    }
}

/// A routed chat message.
///
/// Built by the router and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub body: MessageBody,
    pub sender_id: ConnectionId,
    pub sender_name: DisplayName,
    /// Present for strict-private messages
    pub target_id: Option<ConnectionId>,
    pub timestamp: Timestamp,
}

impl ChatMessage {
    pub fn new(
        body: MessageBody,
        sender_id: ConnectionId,
        sender_name: DisplayName,
        target_id: Option<ConnectionId>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            body,
            sender_id,
            sender_name,
            target_id,
            timestamp,
        }
    }

    pub fn is_private(&self) -> bool {
        self.target_id.is_some()
    }

    /// Wrap the message into a shareable, read-only delivery copy.
    pub fn into_delivery(self) -> Delivery {
        let private = self.is_private();
        Delivery {
            message: Arc::new(self),
            private,
            audience: None,
        }
    }

    /// Like `into_delivery`, but a broadcast only reaches `audience`.
    pub fn into_delivery_for(self, audience: BTreeSet<ConnectionId>) -> Delivery {
        Delivery {
            audience: Some(Arc::new(audience)),
            ..self.into_delivery()
        }
    }
}

/// One outbound copy of a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message: Arc<ChatMessage>,
    pub private: bool,
    /// Connections open when a public message was routed
    pub audience: Option<Arc<BTreeSet<ConnectionId>>>,
}
