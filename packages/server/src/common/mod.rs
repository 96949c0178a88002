//! Helpers shared across layers.

pub mod clock;

pub use kehai_shared::time;
