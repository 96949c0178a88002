//! Shared utilities for Kehai.

pub mod logger;
pub mod time;
