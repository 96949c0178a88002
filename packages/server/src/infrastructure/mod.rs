//! Infrastructure layer: DTOs, registry storage and the WebSocket transport.

pub mod dto;
pub mod repository;
pub mod transport;
