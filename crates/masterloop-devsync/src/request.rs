//! Device-to-cloud request decoding.
//!
//! ## Request Format
//!
//! ```text
//! "MDRQ"                    magic
//! u16   version             (3)
//! u32   settings timestamp  (Unix seconds)
//! i32   firmware release id
//! u8    use delta patches   (1 = true)
//! repeat:
//!   u16 observation id      (0 terminates)
//!   u32 timestamp           (Unix seconds, 0 = now)
//!   value                   (template-declared type; one ignored byte for the terminator)
//! repeat:
//!   u16 command id          (0 terminates)
//!   u32 command timestamp
//!   u32 delivered at
//!   u8  accepted
//! ```

use bytes::Bytes;
use chrono::{DateTime, Utc};
use masterloop_core::{
    BigEndianReader, CodecError, CodecResult, DeviceTemplate, IdentifiedObservation,
};
use tracing::{debug, trace, warn};

use crate::constants::*;
use crate::fields::{read_request_value, read_unix_seconds};
use crate::types::{CommandResponse, DevSyncRequest};

/// Decode a request, resolving observation types through `template`.
///
/// Observations with a zero timestamp are stamped with the current time.
pub fn decode_request(data: &[u8], template: &DeviceTemplate) -> CodecResult<DevSyncRequest> {
    decode_request_with_clock(data, template, Utc::now)
}

/// Decode a request, using `clock` for observations with a zero timestamp.
pub fn decode_request_with_clock<F>(
    data: &[u8],
    template: &DeviceTemplate,
    clock: F,
) -> CodecResult<DevSyncRequest>
where
    F: Fn() -> DateTime<Utc>,
{
    let mut reader = BigEndianReader::new(data);

    let magic = reader.read_bytes(MAGIC_SIZE)?;
    if magic != REQUEST_MAGIC.as_bytes() {
        return Err(CodecError::invalid_format(format!(
            "expected request magic {:?}, got {:02X?}",
            REQUEST_MAGIC, magic
        )));
    }
    let version = reader.read_u16()?;
    if version != PROTOCOL_VERSION_3 {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let settings_timestamp = read_unix_seconds(&mut reader)?;
    let firmware_release_id = reader.read_i32()?;
    let firmware_use_delta = reader.read_u8()? == 1;

    let observations = read_observations(&mut reader, template, &clock)?;
    let command_responses = read_command_responses(&mut reader)?;

    debug!(
        template = %template.id,
        observations = observations.len(),
        command_responses = command_responses.len(),
        firmware_release_id,
        "decoded DevSync request"
    );
    Ok(DevSyncRequest {
        version,
        settings_timestamp,
        firmware_release_id,
        firmware_use_delta,
        observations,
        command_responses,
    })
}

fn read_observations<F>(
    reader: &mut BigEndianReader<'_>,
    template: &DeviceTemplate,
    clock: &F,
) -> CodecResult<Vec<IdentifiedObservation>>
where
    F: Fn() -> DateTime<Utc>,
{
    let mut observations = Vec::new();
    loop {
        let id = reader.read_u16()?;
        let seconds = reader.read_u32()?;
        if id == LIST_TERMINATOR_ID {
            // Terminator record still carries a one-byte value.
            reader.read_u8()?;
            break;
        }

        let data_type = template
            .observation_type(id)
            .ok_or(CodecError::UnknownObservationId(id))?;
        let timestamp = if seconds == 0 {
            clock()
        } else {
            masterloop_core::time::from_unix_seconds(seconds)
        };

        match read_request_value(reader, data_type)? {
            Some(value) => {
                trace!(id, %data_type, "read observation");
                observations.push(IdentifiedObservation {
                    id,
                    timestamp,
                    value,
                });
            }
            None => warn!(id, "skipping empty string observation"),
        }
    }
    Ok(observations)
}

fn read_command_responses(reader: &mut BigEndianReader<'_>) -> CodecResult<Vec<CommandResponse>> {
    let mut responses = Vec::new();
    loop {
        let id = reader.read_u16()?;
        if id == LIST_TERMINATOR_ID {
            break;
        }
        let timestamp = read_unix_seconds(reader)?;
        let delivered_at = read_unix_seconds(reader)?;
        let accepted = reader.read_bool()?;
        trace!(id, accepted, "read command response");
        responses.push(CommandResponse {
            id,
            timestamp,
            delivered_at,
            accepted,
        });
    }
    Ok(responses)
}

/// Encode a request.
///
/// The device-side request layout beyond the magic and version header has no
/// agreed definition yet, so this always fails.
pub fn encode_request(_request: &DevSyncRequest) -> CodecResult<Bytes> {
    Err(CodecError::RequestEncodingUnsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::write_request_value;
    use chrono::TimeZone;
    use masterloop_core::{BigEndianWriter, DataType, ObservationValue};

    fn template() -> DeviceTemplate {
        DeviceTemplate::new("TPL")
            .with_observation(1, "Door", DataType::Boolean)
            .with_observation(2, "Temperature", DataType::Double)
            .with_observation(3, "Counter", DataType::Integer)
            .with_observation(4, "Location", DataType::Position)
            .with_observation(5, "Status", DataType::String)
            .with_observation(6, "Blob", DataType::Binary)
    }

    fn header(writer: &mut BigEndianWriter) {
        writer.write_chars(REQUEST_MAGIC).unwrap();
        writer.write_u16(PROTOCOL_VERSION_3);
        writer.write_u32(1_700_000_000);
        writer.write_i32(42);
        writer.write_u8(1);
    }

    fn observation(writer: &mut BigEndianWriter, id: u16, seconds: u32, value: &ObservationValue) {
        writer.write_u16(id);
        writer.write_u32(seconds);
        write_request_value(writer, value).unwrap();
    }

    fn terminators(writer: &mut BigEndianWriter) {
        writer.write_u16(0);
        writer.write_u32(0);
        writer.write_u8(0);
        writer.write_u16(0);
    }

    fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_decode_all_types() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        observation(&mut writer, 1, 1_700_000_001, &ObservationValue::Boolean(true));
        observation(&mut writer, 2, 1_700_000_002, &ObservationValue::Double(21.5));
        observation(&mut writer, 3, 1_700_000_003, &ObservationValue::Integer(-7));
        observation(&mut writer, 4, 1_700_000_004, &ObservationValue::position(63.5, 10.25, 5.0));
        observation(&mut writer, 5, 1_700_000_005, &ObservationValue::from("ok"));
        terminators(&mut writer);
        let bytes = writer.into_vec();

        let request = decode_request_with_clock(&bytes, &template(), fixed_clock).unwrap();
        assert_eq!(request.version, 3);
        assert_eq!(request.settings_timestamp.timestamp(), 1_700_000_000);
        assert_eq!(request.firmware_release_id, 42);
        assert!(request.firmware_use_delta);
        assert_eq!(request.observations.len(), 5);
        assert_eq!(request.observations[1].value, ObservationValue::Double(21.5));
        assert_eq!(
            request.observations[3].value,
            ObservationValue::position(63.5, 10.25, 5.0)
        );
        assert_eq!(request.observations[4].timestamp.timestamp(), 1_700_000_005);
        assert!(request.command_responses.is_empty());
    }

    #[test]
    fn test_zero_timestamp_uses_clock() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        observation(&mut writer, 3, 0, &ObservationValue::Integer(1));
        terminators(&mut writer);
        let bytes = writer.into_vec();

        let request = decode_request_with_clock(&bytes, &template(), fixed_clock).unwrap();
        assert_eq!(request.observations[0].timestamp, fixed_clock());
    }

    #[test]
    fn test_empty_strings_skipped() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        observation(&mut writer, 5, 1_700_000_000, &ObservationValue::from(""));
        observation(&mut writer, 5, 1_700_000_000, &ObservationValue::from("x"));
        terminators(&mut writer);
        let bytes = writer.into_vec();

        let request = decode_request(&bytes, &template()).unwrap();
        assert_eq!(request.observations.len(), 1);
        assert_eq!(request.observations[0].value, ObservationValue::from("x"));
    }

    #[test]
    fn test_command_responses() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        writer.write_u16(0);
        writer.write_u32(0);
        writer.write_u8(0);
        for (id, accepted) in [(10u16, true), (11, false)] {
            writer.write_u16(id);
            writer.write_u32(1_700_000_100);
            writer.write_u32(1_700_000_200);
            writer.write_bool(accepted);
        }
        writer.write_u16(0);
        let bytes = writer.into_vec();

        let request = decode_request(&bytes, &template()).unwrap();
        assert!(request.observations.is_empty());
        assert_eq!(request.command_responses.len(), 2);
        assert_eq!(request.command_responses[0].id, 10);
        assert!(request.command_responses[0].accepted);
        assert_eq!(request.command_responses[1].delivered_at.timestamp(), 1_700_000_200);
        assert!(!request.command_responses[1].accepted);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = b"MDRS".to_vec();
        bytes.extend_from_slice(&[0x00, 0x03]);
        assert!(matches!(
            decode_request(&bytes, &template()),
            Err(CodecError::InvalidDataFormat(_))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = b"MDRQ".to_vec();
        bytes.extend_from_slice(&[0x00, 0x02]);
        assert_eq!(
            decode_request(&bytes, &template()).unwrap_err(),
            CodecError::UnsupportedVersion(2)
        );
    }

    #[test]
    fn test_binary_template_type_rejected() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        writer.write_u16(6);
        writer.write_u32(1);
        writer.write_u32(0);
        let bytes = writer.into_vec();
        assert!(matches!(
            decode_request(&bytes, &template()),
            Err(CodecError::UnsupportedDataType(_))
        ));
    }

    #[test]
    fn test_missing_terminator() {
        let mut writer = BigEndianWriter::new();
        header(&mut writer);
        observation(&mut writer, 1, 1, &ObservationValue::Boolean(false));
        let bytes = writer.into_vec();
        assert!(matches!(
            decode_request(&bytes, &template()),
            Err(CodecError::UnexpectedEndOfData { .. })
        ));
    }

    #[test]
    fn test_encode_request_unsupported() {
        let request = DevSyncRequest {
            version: PROTOCOL_VERSION_3,
            settings_timestamp: fixed_clock(),
            firmware_release_id: 0,
            firmware_use_delta: false,
            observations: Vec::new(),
            command_responses: Vec::new(),
        };
        assert_eq!(
            encode_request(&request).unwrap_err(),
            CodecError::RequestEncodingUnsupported
        );
    }
}
