// A simple module to define the time types used in the project
//
// IMPORTANT:
// get_current_time_in_seconds() reads SystemTime::now() and is only meant for
// tooling (default `--now` values, report headers). Sale admission always uses
// the timestamp supplied by the host in the CallContext.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// Seconds timestamps used to determine it using its type
pub type TimestampSeconds = u64;

// Length of one sale day in seconds
pub const SECONDS_PER_DAY: TimestampSeconds = 86_400;

#[inline]
pub fn get_current_time() -> Duration {
    // A clock set before 1970 is reported as the epoch itself
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
}

// Return timestamp in seconds
pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}
