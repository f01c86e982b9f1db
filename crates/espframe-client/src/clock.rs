//! Wall-clock source for time sync requests.

use std::sync::atomic::{AtomicI64, Ordering};

/// Epoch-millisecond clock that never goes backwards within a session.
///
/// The wall clock can be stepped back by NTP or the user; the device only
/// ever sees the latest value sent, clamped to be non-decreasing.
#[derive(Debug)]
pub struct SessionClock {
    last_ms: AtomicI64,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    /// Creates a clock with no history.
    pub fn new() -> Self {
        Self {
            last_ms: AtomicI64::new(i64::MIN),
        }
    }

    /// Returns the current time in milliseconds since the Unix epoch.
    pub fn now_ms(&self) -> i64 {
        self.observe(chrono::Utc::now().timestamp_millis())
    }

    fn observe(&self, now_ms: i64) -> i64 {
        let prev = self.last_ms.fetch_max(now_ms, Ordering::SeqCst);
        now_ms.max(prev)
    }
}
