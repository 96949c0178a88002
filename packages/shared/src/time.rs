//! Time helpers. All timestamps in Kehai are Unix milliseconds taken in JST.

use chrono::{DateTime, FixedOffset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap() // JST is UTC+9
}

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst());
    now_jst.timestamp_millis()
}

/// Format a Unix millisecond timestamp as an RFC 3339 string in JST.
///
/// Returns `None` if the timestamp is outside the range chrono can represent.
pub fn timestamp_to_jst_rfc3339(timestamp_millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|utc| utc.with_timezone(&jst()).to_rfc3339())
}
