//! Field encodings shared by DevSync requests and responses.
//!
//! DevSync uses fixed widths for every value, unlike COS integer narrowing:
//!
//! | Data type | Request (device)         | Response settings        |
//! |-----------|--------------------------|--------------------------|
//! | Boolean   | u8                       | u8                       |
//! | Double    | f32                      | f32                      |
//! | Integer   | i32                      | i32                      |
//! | Position  | 3 x f32                  | 3 x f32                  |
//! | String    | u16 length + UTF-8       | u8 length + UTF-8        |

use chrono::{DateTime, Utc};
use masterloop_core::{
    time, BigEndianReader, BigEndianWriter, CodecError, CodecResult, DataType, ObservationValue,
    Position,
};
use tracing::warn;

use crate::constants::MAX_SHORT_STRING_LENGTH;

/// Write an instant as 32-bit Unix seconds.
pub(crate) fn write_unix_seconds(
    writer: &mut BigEndianWriter,
    timestamp: &DateTime<Utc>,
) -> CodecResult<()> {
    writer.write_u32(time::to_unix_seconds(timestamp)?);
    Ok(())
}

/// Read 32-bit Unix seconds.
pub(crate) fn read_unix_seconds(reader: &mut BigEndianReader<'_>) -> CodecResult<DateTime<Utc>> {
    Ok(time::from_unix_seconds(reader.read_u32()?))
}

/// Write a string with a 1-byte length prefix.
///
/// Strings longer than 255 bytes are sent as empty.
pub(crate) fn write_short_string(writer: &mut BigEndianWriter, value: &str, field: &str) {
    if value.len() > MAX_SHORT_STRING_LENGTH {
        warn!(
            field,
            length = value.len(),
            "string exceeds {} bytes, sending empty value",
            MAX_SHORT_STRING_LENGTH
        );
        writer.write_u8(0);
        return;
    }
    writer.write_u8(value.len() as u8);
    writer.write_bytes(value.as_bytes());
}

/// Read a string with a 1-byte length prefix.
pub(crate) fn read_short_string(reader: &mut BigEndianReader<'_>) -> CodecResult<String> {
    let length = reader.read_u8()?;
    reader.read_utf8(usize::from(length))
}

fn write_position(writer: &mut BigEndianWriter, position: &Position) {
    writer.write_f32(position.latitude as f32);
    writer.write_f32(position.longitude as f32);
    writer.write_f32(position.altitude as f32);
}

fn read_position(reader: &mut BigEndianReader<'_>) -> CodecResult<Position> {
    let latitude = f64::from(reader.read_f32()?);
    let longitude = f64::from(reader.read_f32()?);
    let altitude = f64::from(reader.read_f32()?);
    Ok(Position::new(latitude, longitude, altitude))
}

/// Read a request observation value of the template-declared type.
///
/// Returns `None` for empty strings, which are not reported as observations.
pub(crate) fn read_request_value(
    reader: &mut BigEndianReader<'_>,
    data_type: DataType,
) -> CodecResult<Option<ObservationValue>> {
    let value = match data_type {
        DataType::Boolean => ObservationValue::Boolean(reader.read_bool()?),
        DataType::Double => ObservationValue::Double(f64::from(reader.read_f32()?)),
        DataType::Integer => ObservationValue::Integer(reader.read_i32()?),
        DataType::Position => ObservationValue::Position(read_position(reader)?),
        DataType::String => {
            let length = reader.read_u16()?;
            let text = reader.read_utf8(usize::from(length))?;
            if text.is_empty() {
                return Ok(None);
            }
            ObservationValue::String(text)
        }
        DataType::Binary | DataType::Statistics | DataType::Undefined => {
            return Err(CodecError::unsupported_data_type(format!(
                "{} in DevSync request",
                data_type
            )))
        }
    };
    Ok(Some(value))
}

/// Write a request observation value.
#[cfg(test)]
pub(crate) fn write_request_value(
    writer: &mut BigEndianWriter,
    value: &ObservationValue,
) -> CodecResult<()> {
    match value {
        ObservationValue::Boolean(v) => writer.write_bool(*v),
        ObservationValue::Double(v) => writer.write_f32(*v as f32),
        ObservationValue::Integer(v) => writer.write_i32(*v),
        ObservationValue::Position(p) => write_position(writer, p),
        ObservationValue::String(s) => {
            let length = u16::try_from(s.len()).map_err(|_| CodecError::LengthOverflow {
                length: s.len(),
                max: u16::MAX as usize,
            })?;
            writer.write_u16(length);
            writer.write_bytes(s.as_bytes());
        }
        ObservationValue::Binary(_) | ObservationValue::Statistics(_) => {
            return Err(CodecError::unsupported_data_type(format!(
                "{} in DevSync request",
                value.data_type()
            )))
        }
    }
    Ok(())
}

/// Write a setting value in the fixed response encoding.
pub(crate) fn write_setting_value(
    writer: &mut BigEndianWriter,
    id: u16,
    value: &ObservationValue,
) -> CodecResult<()> {
    match value {
        ObservationValue::Boolean(v) => writer.write_bool(*v),
        ObservationValue::Double(v) => writer.write_f32(*v as f32),
        ObservationValue::Integer(v) => writer.write_i32(*v),
        ObservationValue::Position(p) => write_position(writer, p),
        ObservationValue::String(s) => write_short_string(writer, s, &format!("setting {}", id)),
        ObservationValue::Binary(_) | ObservationValue::Statistics(_) => {
            return Err(CodecError::unsupported_data_type(format!(
                "{} in DevSync setting {}",
                value.data_type(),
                id
            )))
        }
    }
    Ok(())
}

/// Read a setting value of the declared type.
pub(crate) fn read_setting_value(
    reader: &mut BigEndianReader<'_>,
    data_type: DataType,
) -> CodecResult<ObservationValue> {
    let value = match data_type {
        DataType::Boolean => ObservationValue::Boolean(reader.read_bool()?),
        DataType::Double => ObservationValue::Double(f64::from(reader.read_f32()?)),
        DataType::Integer => ObservationValue::Integer(reader.read_i32()?),
        DataType::Position => ObservationValue::Position(read_position(reader)?),
        DataType::String => ObservationValue::String(read_short_string(reader)?),
        DataType::Binary | DataType::Statistics | DataType::Undefined => {
            return Err(CodecError::unsupported_data_type(format!(
                "{} in DevSync setting",
                data_type
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_string_cap() {
        let mut writer = BigEndianWriter::new();
        write_short_string(&mut writer, &"a".repeat(255), "test");
        write_short_string(&mut writer, &"b".repeat(256), "test");
        write_short_string(&mut writer, "", "test");
        let bytes = writer.into_vec();
        assert_eq!(bytes.len(), 1 + 255 + 1 + 1);

        let mut reader = BigEndianReader::new(&bytes);
        assert_eq!(read_short_string(&mut reader).unwrap().len(), 255);
        assert_eq!(read_short_string(&mut reader).unwrap(), "");
        assert_eq!(read_short_string(&mut reader).unwrap(), "");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_setting_values_roundtrip() {
        let values = [
            ObservationValue::Boolean(true),
            ObservationValue::Double(0.25),
            ObservationValue::Integer(-100_000),
            ObservationValue::position(1.5, 2.5, -3.5),
            ObservationValue::from("interval=60"),
        ];
        for value in values {
            let mut writer = BigEndianWriter::new();
            write_setting_value(&mut writer, 1, &value).unwrap();
            let bytes = writer.into_vec();
            let mut reader = BigEndianReader::new(&bytes);
            assert_eq!(read_setting_value(&mut reader, value.data_type()).unwrap(), value);
        }
    }

    #[test]
    fn test_double_is_sent_as_float() {
        let mut writer = BigEndianWriter::new();
        write_setting_value(&mut writer, 1, &ObservationValue::Double(0.1)).unwrap();
        assert_eq!(writer.as_slice(), &0.1f32.to_be_bytes());
    }

    #[test]
    fn test_unsupported_setting_types() {
        let mut writer = BigEndianWriter::new();
        let err = write_setting_value(&mut writer, 9, &ObservationValue::Binary(vec![1])).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedDataType(_)));

        let mut reader = BigEndianReader::new(&[0u8; 8]);
        assert!(read_setting_value(&mut reader, DataType::Statistics).is_err());
        assert!(read_request_value(&mut reader, DataType::Binary).is_err());
    }

    #[test]
    fn test_request_empty_string_skipped() {
        let data = [0x00, 0x00];
        let mut reader = BigEndianReader::new(&data);
        assert_eq!(read_request_value(&mut reader, DataType::String).unwrap(), None);
        assert!(reader.is_empty());
    }
}
