//! Transport Adapter 実装

pub mod websocket;

pub use websocket::{ClientInfo, WebSocketTransport};
