//! HTTP API response DTOs for the presence-aware router.

use serde::{Deserialize, Serialize};

/// Presence snapshot for the presence endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceDto {
    pub revision: u64,
    pub participants: Vec<ParticipantDto>,
}

/// One online connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantDto {
    pub connection_id: String,
    pub display_name: String,
}
