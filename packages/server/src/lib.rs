//! Kehai: a presence-aware message router.
//!
//! Tracks who is connected, broadcasts ordered presence snapshots and routes
//! public or private chat messages over WebSocket.

pub mod common;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::run as run_server;
