//! Header attached to every event flowing through the core.

use serde::{Deserialize, Serialize};

/// Receive/exchange timestamps and routing metadata carried by every event.
///
/// `receive_time` is monotonic per `source`; callers (the event source) are
/// responsible for that guarantee. [`TimeChecker`](crate::tick::TimeChecker)
/// asserts it in debug builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Monotonic local receive clock, in nanoseconds.
    pub receive_time: u64,
    /// Wall-clock receive time (UTC), in nanoseconds since epoch.
    pub receive_time_utc: u64,
    /// Small integer identifying the upstream source/connection.
    pub source: u8,
    pub stream_id: u32,
}

impl MessageInfo {
    pub fn new(receive_time: u64, receive_time_utc: u64, source: u8, stream_id: u32) -> Self {
        Self {
            receive_time,
            receive_time_utc,
            source,
            stream_id,
        }
    }
}
