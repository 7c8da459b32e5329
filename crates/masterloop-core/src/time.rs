//! Timestamp conversions used on the wire.
//!
//! Two encodings exist:
//!
//! - **Unix seconds**: unsigned 32-bit seconds since `1970-01-01T00:00:00Z`.
//! - **Ticks**: signed 64-bit counts of 100 ns intervals since
//!   `0001-01-01T00:00:00Z`, taken directly as a UTC instant.
//!
//! The two epochs differ, so a stored `0` means a different instant in each
//! encoding. Decoders must keep that asymmetry.

use chrono::{DateTime, Utc};

use crate::error::{CodecError, CodecResult};

/// Number of ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Nanoseconds per tick.
const NANOS_PER_TICK: i64 = 100;

/// Unix timestamp (seconds) of the tick epoch `0001-01-01T00:00:00Z`.
pub const TICK_EPOCH_UNIX_SECONDS: i64 = -62_135_596_800;

/// Convert 32-bit Unix seconds to a UTC instant.
pub fn from_unix_seconds(seconds: u32) -> DateTime<Utc> {
    // Every u32 second count is inside chrono's range.
    DateTime::from_timestamp(i64::from(seconds), 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Convert a UTC instant to 32-bit Unix seconds, truncating sub-second precision.
pub fn to_unix_seconds(timestamp: &DateTime<Utc>) -> CodecResult<u32> {
    u32::try_from(timestamp.timestamp()).map_err(|_| {
        CodecError::timestamp_out_of_range(format!(
            "{} is not representable as 32-bit Unix seconds",
            timestamp.to_rfc3339()
        ))
    })
}

/// Convert a raw tick count to a UTC instant.
pub fn from_ticks(ticks: i64) -> CodecResult<DateTime<Utc>> {
    let seconds = ticks.div_euclid(TICKS_PER_SECOND) + TICK_EPOCH_UNIX_SECONDS;
    let nanos = ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK;
    DateTime::from_timestamp(seconds, nanos as u32).ok_or_else(|| {
        CodecError::timestamp_out_of_range(format!("{} ticks is outside the calendar range", ticks))
    })
}

/// Convert a UTC instant to a raw tick count, truncating below 100 ns.
pub fn to_ticks(timestamp: &DateTime<Utc>) -> CodecResult<i64> {
    let out_of_range = || {
        CodecError::timestamp_out_of_range(format!(
            "{} is not representable as ticks",
            timestamp.to_rfc3339()
        ))
    };
    let seconds = timestamp.timestamp() - TICK_EPOCH_UNIX_SECONDS;
    if seconds < 0 {
        return Err(out_of_range());
    }
    seconds
        .checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(i64::from(timestamp.timestamp_subsec_nanos()) / NANOS_PER_TICK))
        .ok_or_else(out_of_range)
}
