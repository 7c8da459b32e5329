//! Type-specific observation payloads.
//!
//! Sizing and writing are separate functions: [`payload_size`] computes the
//! exact number of bytes [`write_payload`] will emit for a value, so buffers
//! can be sized up front and sizes can be checked without a writer.
//!
//! | Wire type  | Payload                                                    |
//! |------------|------------------------------------------------------------|
//! | Boolean    | u8 (0/1)                                                   |
//! | Double     | f64                                                        |
//! | Float      | f32                                                        |
//! | Int8..Int32| narrowest of i8/u8/i16/u16/i32                             |
//! | Position2D | f32 lat, f32 lon                                           |
//! | Position3D | f32 lat, f32 lon, f32 alt                                  |
//! | Ascii/Utf8 | u16 byte length + bytes                                    |
//! | Binary     | u32 byte length + bytes (v2)                               |
//! | Statistics | u8 sub-flags, i32 count, f64 mean/min/max, optionals (v2)  |

use masterloop_core::{
    BigEndianReader, BigEndianWriter, CodecError, CodecResult, DataType, ObservationValue,
    Position, Statistics, TimeRange,
};

use crate::constants::*;
use crate::descriptor::CosObservationType;
use crate::header::HeaderFlags;
use crate::timestamp::{read_timestamp, write_timestamp};

/// Check that `data_type` can be carried by documents of `version`.
pub fn check_version_support(version: u8, data_type: DataType) -> CodecResult<()> {
    let supported = match data_type {
        DataType::Boolean
        | DataType::Double
        | DataType::Integer
        | DataType::Position
        | DataType::String => version == COS_VERSION_1 || version == COS_VERSION_2,
        DataType::Binary | DataType::Statistics => version == COS_VERSION_2,
        DataType::Undefined => false,
    };
    if supported {
        Ok(())
    } else {
        Err(CodecError::unsupported_data_type(format!(
            "{} in COS version {}",
            data_type, version
        )))
    }
}

/// Exact encoded size of the payload for `value`.
pub fn payload_size(value: &ObservationValue, flags: HeaderFlags) -> usize {
    match value {
        ObservationValue::Boolean(_) => 1,
        ObservationValue::Double(_) => 8,
        ObservationValue::Integer(v) => match CosObservationType::for_integer(*v) {
            CosObservationType::Int8 | CosObservationType::UInt8 => 1,
            CosObservationType::Int16 | CosObservationType::UInt16 => 2,
            _ => 4,
        },
        ObservationValue::Position(_) => 12,
        ObservationValue::String(s) => 2 + s.len(),
        ObservationValue::Binary(b) => 4 + b.len(),
        ObservationValue::Statistics(stats) => {
            let mut size = 1 + 4 + 8 * 3;
            if stats.time_range.is_some() {
                size += 2 * flags.timestamp_size();
            }
            if stats.std_dev.is_some() {
                size += 8;
            }
            if stats.median.is_some() {
                size += 8;
            }
            size
        }
    }
}

/// Write the payload for `value` using the wire type [`CosObservationType::for_value`] selects.
pub fn write_payload(
    writer: &mut BigEndianWriter,
    value: &ObservationValue,
    flags: HeaderFlags,
) -> CodecResult<()> {
    match value {
        ObservationValue::Boolean(v) => writer.write_bool(*v),
        ObservationValue::Double(v) => writer.write_f64(*v),
        ObservationValue::Integer(v) => write_integer(writer, *v),
        ObservationValue::Position(p) => {
            writer.write_f32(p.latitude as f32);
            writer.write_f32(p.longitude as f32);
            writer.write_f32(p.altitude as f32);
        }
        ObservationValue::String(s) => {
            let length = u16::try_from(s.len()).map_err(|_| CodecError::LengthOverflow {
                length: s.len(),
                max: u16::MAX as usize,
            })?;
            writer.write_u16(length);
            writer.write_bytes(s.as_bytes());
        }
        ObservationValue::Binary(b) => {
            let length = u32::try_from(b.len()).map_err(|_| CodecError::LengthOverflow {
                length: b.len(),
                max: u32::MAX as usize,
            })?;
            writer.write_u32(length);
            writer.write_bytes(b);
        }
        ObservationValue::Statistics(stats) => write_statistics(writer, stats, flags)?,
    }
    Ok(())
}

fn write_integer(writer: &mut BigEndianWriter, value: i32) {
    match CosObservationType::for_integer(value) {
        CosObservationType::Int8 => writer.write_i8(value as i8),
        CosObservationType::UInt8 => writer.write_u8(value as u8),
        CosObservationType::Int16 => writer.write_i16(value as i16),
        CosObservationType::UInt16 => writer.write_u16(value as u16),
        _ => writer.write_i32(value),
    }
}

fn write_statistics(
    writer: &mut BigEndianWriter,
    stats: &Statistics,
    flags: HeaderFlags,
) -> CodecResult<()> {
    let mut sub_flags = 0u8;
    if stats.time_range.is_some() {
        sub_flags |= STATS_HAS_TIMERANGE;
    }
    if stats.std_dev.is_some() {
        sub_flags |= STATS_HAS_STDDEV;
    }
    if stats.median.is_some() {
        sub_flags |= STATS_HAS_MEDIAN;
    }

    writer.write_u8(sub_flags);
    writer.write_i32(stats.count);
    writer.write_f64(stats.mean);
    writer.write_f64(stats.minimum);
    writer.write_f64(stats.maximum);
    if let Some(range) = &stats.time_range {
        write_timestamp(writer, &range.from, flags)?;
        write_timestamp(writer, &range.to, flags)?;
    }
    if let Some(std_dev) = stats.std_dev {
        writer.write_f64(std_dev);
    }
    if let Some(median) = stats.median {
        writer.write_f64(median);
    }
    Ok(())
}

/// Read a payload of the given wire type.
pub fn read_payload(
    reader: &mut BigEndianReader<'_>,
    observation_type: CosObservationType,
    flags: HeaderFlags,
) -> CodecResult<ObservationValue> {
    let value = match observation_type {
        CosObservationType::Boolean => ObservationValue::Boolean(reader.read_bool()?),
        CosObservationType::Double => ObservationValue::Double(reader.read_f64()?),
        CosObservationType::Float => ObservationValue::Double(f64::from(reader.read_f32()?)),
        CosObservationType::Int32 => ObservationValue::Integer(reader.read_i32()?),
        CosObservationType::Int16 => ObservationValue::Integer(i32::from(reader.read_i16()?)),
        CosObservationType::UInt16 => ObservationValue::Integer(i32::from(reader.read_u16()?)),
        CosObservationType::Int8 => ObservationValue::Integer(i32::from(reader.read_i8()?)),
        CosObservationType::UInt8 => ObservationValue::Integer(i32::from(reader.read_u8()?)),
        CosObservationType::Position2D => {
            let latitude = f64::from(reader.read_f32()?);
            let longitude = f64::from(reader.read_f32()?);
            ObservationValue::Position(Position::new(latitude, longitude, 0.0))
        }
        CosObservationType::Position3D => {
            let latitude = f64::from(reader.read_f32()?);
            let longitude = f64::from(reader.read_f32()?);
            let altitude = f64::from(reader.read_f32()?);
            ObservationValue::Position(Position::new(latitude, longitude, altitude))
        }
        CosObservationType::Ascii => {
            let length = reader.read_u16()?;
            ObservationValue::String(reader.read_chars(usize::from(length))?)
        }
        CosObservationType::Utf8 => {
            let length = reader.read_u16()?;
            ObservationValue::String(reader.read_utf8(usize::from(length))?)
        }
        CosObservationType::Binary => {
            let length = reader.read_u32()? as usize;
            ObservationValue::Binary(reader.read_bytes(length)?.to_vec())
        }
        CosObservationType::Statistics => {
            ObservationValue::Statistics(read_statistics(reader, flags)?)
        }
    };
    Ok(value)
}

fn read_statistics(reader: &mut BigEndianReader<'_>, flags: HeaderFlags) -> CodecResult<Statistics> {
    let sub_flags = reader.read_u8()?;
    let mut stats = Statistics::new(
        reader.read_i32()?,
        reader.read_f64()?,
        reader.read_f64()?,
        reader.read_f64()?,
    );
    if sub_flags & STATS_HAS_TIMERANGE != 0 {
        let from = read_timestamp(reader, flags)?;
        let to = read_timestamp(reader, flags)?;
        stats.time_range = Some(TimeRange { from, to });
    }
    if sub_flags & STATS_HAS_STDDEV != 0 {
        stats.std_dev = Some(reader.read_f64()?);
    }
    if sub_flags & STATS_HAS_MEDIAN != 0 {
        stats.median = Some(reader.read_f64()?);
    }
    Ok(stats)
}
