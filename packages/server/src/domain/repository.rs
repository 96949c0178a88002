//! Repository trait for the connection registry.
//!
//! The domain layer owns the abstraction; the infrastructure layer provides
//! the implementation (dependency inversion).

use async_trait::async_trait;

use super::{ConnectionId, DisplayName, PresenceSnapshot, RegistryError, Timestamp};

/// Process-wide mapping of connection id to presence record.
///
/// Every method is serialized with respect to every other: mutations return
/// the snapshot taken under the same critical section as the change.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register a newly opened connection with the default display name.
    async fn open(
        &self,
        id: ConnectionId,
        connected_at: Timestamp,
    ) -> Result<PresenceSnapshot, RegistryError>;

    /// Overwrite the display name of a registered connection.
    async fn set_name(
        &self,
        id: &ConnectionId,
        name: DisplayName,
    ) -> Result<PresenceSnapshot, RegistryError>;

    /// Remove a connection. `None` if it was not registered.
    async fn close(&self, id: &ConnectionId) -> Option<PresenceSnapshot>;

    /// Point-in-time copy of the whole registry.
    async fn snapshot(&self) -> PresenceSnapshot;

    async fn exists(&self, id: &ConnectionId) -> bool;

    /// Current display name of a connection.
    async fn lookup(&self, id: &ConnectionId) -> Option<DisplayName>;
}
