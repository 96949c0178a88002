//! Monotonic message clock.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::{common::time::get_jst_timestamp, domain::Timestamp};

/// Hands out strictly increasing millisecond timestamps.
///
/// Follows wall-clock time while it moves forward; when two messages land in
/// the same millisecond, or the wall clock steps back, the previous value is
/// bumped by one instead.
#[derive(Debug, Default)]
pub struct MessageClock {
    last: AtomicI64,
}

impl MessageClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp, taken from the current time.
    pub fn now(&self) -> Timestamp {
        self.next_after(get_jst_timestamp())
    }

    fn next_after(&self, wall: i64) -> Timestamp {
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return Timestamp::new(next),
                Err(actual) => last = actual,
            }
        }
    }
}
