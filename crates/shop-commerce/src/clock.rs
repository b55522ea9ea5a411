//! Wall-clock access.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current Unix timestamp in seconds.
///
/// Time-sensitive checks (promotion windows) take a timestamp parameter so
/// tests can pin the clock; this is the value callers pass in production.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
