//! Section timestamps and per-observation deltas.
//!
//! Without `64BIT_TIMESTAMPS` a timestamp is a `u32` of Unix seconds and a
//! delta is a `u16` of seconds. With it, a timestamp is an `i64` raw tick
//! count and a delta is an `i64` tick count.

use chrono::{DateTime, Utc};
use masterloop_core::{time, BigEndianReader, BigEndianWriter, CodecError, CodecResult};

use crate::header::HeaderFlags;

/// A timestamp as it appears on the wire, before conversion to an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireTimestamp {
    /// 32-bit Unix seconds.
    Seconds(u32),
    /// 64-bit ticks since `0001-01-01T00:00:00Z`.
    Ticks(i64),
}

impl WireTimestamp {
    /// Convert an instant to its wire form under `flags`.
    pub fn from_datetime(timestamp: &DateTime<Utc>, flags: HeaderFlags) -> CodecResult<Self> {
        if flags.timestamps_64bit() {
            Ok(WireTimestamp::Ticks(time::to_ticks(timestamp)?))
        } else {
            Ok(WireTimestamp::Seconds(time::to_unix_seconds(timestamp)?))
        }
    }

    /// Read a timestamp of the width selected by `flags`.
    pub fn read(reader: &mut BigEndianReader<'_>, flags: HeaderFlags) -> CodecResult<Self> {
        if flags.timestamps_64bit() {
            Ok(WireTimestamp::Ticks(reader.read_i64()?))
        } else {
            Ok(WireTimestamp::Seconds(reader.read_u32()?))
        }
    }

    /// Write this timestamp.
    pub fn write(&self, writer: &mut BigEndianWriter) {
        match *self {
            WireTimestamp::Seconds(s) => writer.write_u32(s),
            WireTimestamp::Ticks(t) => writer.write_i64(t),
        }
    }

    /// Read a delta of the width selected by `flags` and apply it.
    pub fn read_delta(
        &self,
        reader: &mut BigEndianReader<'_>,
        flags: HeaderFlags,
    ) -> CodecResult<DateTime<Utc>> {
        match *self {
            WireTimestamp::Ticks(base) if flags.timestamps_64bit() => {
                let delta = reader.read_i64()?;
                let ticks = base.checked_add(delta).ok_or_else(|| {
                    CodecError::timestamp_out_of_range(format!(
                        "tick delta {} overflows section timestamp {}",
                        delta, base
                    ))
                })?;
                time::from_ticks(ticks)
            }
            WireTimestamp::Seconds(base) if !flags.timestamps_64bit() => {
                let delta = reader.read_u16()?;
                let seconds = i64::from(base) + i64::from(delta);
                DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
                    CodecError::timestamp_out_of_range(format!("{} seconds", seconds))
                })
            }
            _ => Err(CodecError::invalid_format(
                "timestamp width does not match header flags",
            )),
        }
    }

    /// Convert to a UTC instant.
    pub fn to_datetime(&self) -> CodecResult<DateTime<Utc>> {
        match *self {
            WireTimestamp::Seconds(s) => Ok(time::from_unix_seconds(s)),
            WireTimestamp::Ticks(t) => time::from_ticks(t),
        }
    }
}

/// Write an instant in the width selected by `flags`.
pub fn write_timestamp(
    writer: &mut BigEndianWriter,
    timestamp: &DateTime<Utc>,
    flags: HeaderFlags,
) -> CodecResult<()> {
    WireTimestamp::from_datetime(timestamp, flags)?.write(writer);
    Ok(())
}

/// Read an instant in the width selected by `flags`.
pub fn read_timestamp(
    reader: &mut BigEndianReader<'_>,
    flags: HeaderFlags,
) -> CodecResult<DateTime<Utc>> {
    WireTimestamp::read(reader, flags)?.to_datetime()
}
