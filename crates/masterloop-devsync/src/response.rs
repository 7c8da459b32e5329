//! Cloud-to-device response encoding and decoding.
//!
//! ## Response Format
//!
//! ```text
//! "MDRS"                      magic
//! u16  version                (3)
//! u32  settings offset        ┐
//! u32  settings length        │
//! u32  commands offset        │ region table, back-patched
//! u32  commands length        │ once every region is written
//! u8   firmware type          │
//! u32  firmware offset        │
//! u32  firmware length        │
//! u32  server time            ┘
//! settings region:  repeat { u16 id, u8 data type, value }
//! commands region:  repeat { u16 id, u32 timestamp, u32 expiry (0 = none),
//!                            u16 argument count, repeat { u16 id, u8 length, UTF-8 } }
//! firmware region:  none    -> empty
//!                   patch   -> i32 from, i32 to, u32 release date, u8 length + encoding,
//!                              16-byte firmware MD5, 16-byte patch MD5, u32 length + blob
//!                   release -> i32 release id, u32 release date, 16-byte firmware MD5,
//!                              u32 length + blob
//! ```
//!
//! Offsets are absolute positions from the start of the message.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use masterloop_core::{
    time, BigEndianReader, BigEndianWriter, CodecError, CodecResult, DataType,
};
use tracing::{debug, trace};

use crate::constants::*;
use crate::fields::*;
use crate::types::*;

// ============================================================================
// Encoding
// ============================================================================

/// Encode a response, stamping it with the current server time.
pub fn encode_response(response: &DevSyncResponse) -> CodecResult<Bytes> {
    encode_response_with_clock(response, Utc::now)
}

/// Encode a response, stamping it with the time returned by `clock`.
///
/// The clock is read after every region has been written so the device sees
/// a server time as close to transmission as possible.
pub fn encode_response_with_clock<F>(response: &DevSyncResponse, clock: F) -> CodecResult<Bytes>
where
    F: FnOnce() -> DateTime<Utc>,
{
    let mut writer = BigEndianWriter::new();
    writer.write_chars(RESPONSE_MAGIC)?;
    writer.write_u16(PROTOCOL_VERSION_3);

    // Region table placeholders
    for _ in 0..4 {
        writer.write_u32(0);
    }
    writer.write_u8(FIRMWARE_TYPE_NONE);
    for _ in 0..3 {
        writer.write_u32(0);
    }

    let settings = write_region(&mut writer, |w| write_settings(w, &response.settings))?;
    let commands = write_region(&mut writer, |w| write_commands(w, &response.commands))?;
    let firmware = write_region(&mut writer, |w| write_firmware(w, &response.firmware))?;

    writer.patch_u32(SETTINGS_OFFSET_FIELD, settings.0)?;
    writer.patch_u32(SETTINGS_LENGTH_FIELD, settings.1)?;
    writer.patch_u32(COMMANDS_OFFSET_FIELD, commands.0)?;
    writer.patch_u32(COMMANDS_LENGTH_FIELD, commands.1)?;
    writer.patch_u8(FIRMWARE_TYPE_FIELD, response.firmware.type_code())?;
    writer.patch_u32(FIRMWARE_OFFSET_FIELD, firmware.0)?;
    writer.patch_u32(FIRMWARE_LENGTH_FIELD, firmware.1)?;

    let server_time = clock();
    writer.patch_u32(SERVER_TIME_FIELD, time::to_unix_seconds(&server_time)?)?;

    debug!(
        settings = response.settings.len(),
        commands = response.commands.len(),
        firmware_type = response.firmware.type_code(),
        bytes = writer.position(),
        "encoded DevSync response"
    );
    Ok(writer.into_bytes())
}

/// Run `write` and return the (offset, length) of what it wrote.
fn write_region<F>(writer: &mut BigEndianWriter, write: F) -> CodecResult<(u32, u32)>
where
    F: FnOnce(&mut BigEndianWriter) -> CodecResult<()>,
{
    let start = writer.position();
    write(writer)?;
    let length = writer.position() - start;
    let to_u32 = |v: usize| {
        u32::try_from(v).map_err(|_| CodecError::LengthOverflow {
            length: v,
            max: u32::MAX as usize,
        })
    };
    Ok((to_u32(start)?, to_u32(length)?))
}

fn write_settings(writer: &mut BigEndianWriter, settings: &[Setting]) -> CodecResult<()> {
    for setting in settings {
        let Some(value) = &setting.value else {
            trace!(id = setting.id, "skipping setting without value");
            continue;
        };
        writer.write_u16(setting.id);
        writer.write_u8(value.data_type().as_u8());
        write_setting_value(writer, setting.id, value)?;
    }
    Ok(())
}

fn write_commands(writer: &mut BigEndianWriter, commands: &[Command]) -> CodecResult<()> {
    for command in commands {
        writer.write_u16(command.id);
        write_unix_seconds(writer, &command.timestamp)?;
        match &command.expires_at {
            Some(expires_at) => write_unix_seconds(writer, expires_at)?,
            None => writer.write_u32(0),
        }
        let count = u16::try_from(command.arguments.len()).map_err(|_| {
            CodecError::LengthOverflow {
                length: command.arguments.len(),
                max: u16::MAX as usize,
            }
        })?;
        writer.write_u16(count);
        for argument in &command.arguments {
            writer.write_u16(argument.id);
            write_short_string(
                writer,
                &argument.value,
                &format!("command {} argument {}", command.id, argument.id),
            );
        }
    }
    Ok(())
}

fn write_firmware(writer: &mut BigEndianWriter, firmware: &FirmwareUpdate) -> CodecResult<()> {
    match firmware {
        FirmwareUpdate::None => {}
        FirmwareUpdate::Patch(patch) => {
            writer.write_i32(patch.from_release_id);
            writer.write_i32(patch.to_release_id);
            write_unix_seconds(writer, &patch.release_date)?;
            write_short_string(writer, &patch.encoding, "firmware encoding");
            writer.write_bytes(&md5_from_base64(&patch.firmware_md5)?);
            writer.write_bytes(&md5_from_base64(&patch.patch_md5)?);
            write_blob(writer, &patch.blob)?;
        }
        FirmwareUpdate::Release(release) => {
            writer.write_i32(release.release_id);
            write_unix_seconds(writer, &release.release_date)?;
            writer.write_bytes(&md5_from_base64(&release.firmware_md5)?);
            write_blob(writer, &release.blob)?;
        }
    }
    Ok(())
}

fn write_blob(writer: &mut BigEndianWriter, blob: &[u8]) -> CodecResult<()> {
    let length = u32::try_from(blob.len()).map_err(|_| CodecError::LengthOverflow {
        length: blob.len(),
        max: u32::MAX as usize,
    })?;
    writer.write_u32(length);
    writer.write_bytes(blob);
    Ok(())
}

/// Decode a base64 MD5 digest to its raw 16 bytes.
fn md5_from_base64(text: &str) -> CodecResult<[u8; MD5_DIGEST_SIZE]> {
    let raw = BASE64
        .decode(text.trim())
        .map_err(|e| CodecError::invalid_format(format!("MD5 digest is not base64: {}", e)))?;
    raw.as_slice().try_into().map_err(|_| {
        CodecError::invalid_format(format!(
            "MD5 digest must be {} bytes, got {}",
            MD5_DIGEST_SIZE,
            raw.len()
        ))
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a response as the device would.
pub fn decode_response(data: &[u8]) -> CodecResult<ReceivedResponse> {
    let mut reader = BigEndianReader::new(data);

    let magic = reader.read_bytes(MAGIC_SIZE)?;
    if magic != RESPONSE_MAGIC.as_bytes() {
        return Err(CodecError::invalid_format(format!(
            "expected response magic {:?}, got {:02X?}",
            RESPONSE_MAGIC, magic
        )));
    }
    let version = reader.read_u16()?;
    if version != PROTOCOL_VERSION_3 {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let settings_offset = reader.read_u32()?;
    let settings_length = reader.read_u32()?;
    let commands_offset = reader.read_u32()?;
    let commands_length = reader.read_u32()?;
    let firmware_type = reader.read_u8()?;
    let firmware_offset = reader.read_u32()?;
    let firmware_length = reader.read_u32()?;
    let server_time = time::from_unix_seconds(reader.read_u32()?);

    let settings = read_settings(region(data, "settings", settings_offset, settings_length)?)?;
    let commands = read_commands(region(data, "commands", commands_offset, commands_length)?)?;
    let firmware = read_firmware(
        region(data, "firmware", firmware_offset, firmware_length)?,
        firmware_type,
    )?;

    debug!(
        settings = settings.len(),
        commands = commands.len(),
        firmware_type,
        "decoded DevSync response"
    );
    Ok(ReceivedResponse {
        server_time,
        response: DevSyncResponse {
            settings,
            commands,
            firmware,
        },
    })
}

/// Slice out a region, validating it against the message bounds.
fn region<'a>(data: &'a [u8], name: &str, offset: u32, length: u32) -> CodecResult<&'a [u8]> {
    let start = offset as usize;
    let end = start.checked_add(length as usize);
    match end {
        Some(end) if start >= REGIONS_OFFSET && end <= data.len() => Ok(&data[start..end]),
        _ => Err(CodecError::invalid_format(format!(
            "{} region [{}, +{}) lies outside the {}-byte message",
            name,
            offset,
            length,
            data.len()
        ))),
    }
}

fn read_settings(data: &[u8]) -> CodecResult<Vec<Setting>> {
    let mut reader = BigEndianReader::new(data);
    let mut settings = Vec::new();
    while !reader.is_empty() {
        let id = reader.read_u16()?;
        let code = reader.read_u8()?;
        let data_type = DataType::from_u8(code)
            .ok_or_else(|| CodecError::unsupported_data_type(format!("code {}", code)))?;
        let value = read_setting_value(&mut reader, data_type)?;
        settings.push(Setting {
            id,
            value: Some(value),
        });
    }
    Ok(settings)
}

fn read_commands(data: &[u8]) -> CodecResult<Vec<Command>> {
    let mut reader = BigEndianReader::new(data);
    let mut commands = Vec::new();
    while !reader.is_empty() {
        let id = reader.read_u16()?;
        let timestamp = read_unix_seconds(&mut reader)?;
        let expires_at = match reader.read_u32()? {
            0 => None,
            seconds => Some(time::from_unix_seconds(seconds)),
        };
        let count = reader.read_u16()?;
        let mut arguments = Vec::new();
        for _ in 0..count {
            let id = reader.read_u16()?;
            let value = read_short_string(&mut reader)?;
            arguments.push(CommandArgument { id, value });
        }
        commands.push(Command {
            id,
            timestamp,
            expires_at,
            arguments,
        });
    }
    Ok(commands)
}

fn read_firmware(data: &[u8], firmware_type: u8) -> CodecResult<FirmwareUpdate> {
    let mut reader = BigEndianReader::new(data);
    let firmware = match firmware_type {
        FIRMWARE_TYPE_NONE => FirmwareUpdate::None,
        FIRMWARE_TYPE_PATCH => FirmwareUpdate::Patch(FirmwarePatch {
            from_release_id: reader.read_i32()?,
            to_release_id: reader.read_i32()?,
            release_date: read_unix_seconds(&mut reader)?,
            encoding: read_short_string(&mut reader)?,
            firmware_md5: BASE64.encode(reader.read_array::<MD5_DIGEST_SIZE>()?),
            patch_md5: BASE64.encode(reader.read_array::<MD5_DIGEST_SIZE>()?),
            blob: read_blob(&mut reader)?,
        }),
        FIRMWARE_TYPE_RELEASE => FirmwareUpdate::Release(FirmwareRelease {
            release_id: reader.read_i32()?,
            release_date: read_unix_seconds(&mut reader)?,
            firmware_md5: BASE64.encode(reader.read_array::<MD5_DIGEST_SIZE>()?),
            blob: read_blob(&mut reader)?,
        }),
        other => {
            return Err(CodecError::invalid_format(format!(
                "unknown firmware type {}",
                other
            )))
        }
    };
    Ok(firmware)
}

fn read_blob(reader: &mut BigEndianReader<'_>) -> CodecResult<Vec<u8>> {
    let length = reader.read_u32()? as usize;
    Ok(reader.read_bytes(length)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use masterloop_core::ObservationValue;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    // MD5("") = d41d8cd98f00b204e9800998ecf8427e
    const EMPTY_MD5: &str = "1B2M2Y8AsgTpgAmY7PhCfg==";

    #[test]
    fn test_empty_response_layout() {
        let bytes = encode_response_with_clock(&DevSyncResponse::default(), || at(1_700_000_000))
            .unwrap();
        assert_eq!(bytes.len(), REGIONS_OFFSET);
        assert_eq!(&bytes[..4], b"MDRS");
        assert_eq!(&bytes[4..6], &[0x00, 0x03]);

        let mut reader = BigEndianReader::new(&bytes[TABLE_OFFSET..]);
        assert_eq!(reader.read_u32().unwrap(), REGIONS_OFFSET as u32);
        assert_eq!(reader.read_u32().unwrap(), 0);
        assert_eq!(reader.read_u32().unwrap(), REGIONS_OFFSET as u32);
        assert_eq!(reader.read_u32().unwrap(), 0);
        assert_eq!(reader.read_u8().unwrap(), FIRMWARE_TYPE_NONE);
        assert_eq!(reader.read_u32().unwrap(), REGIONS_OFFSET as u32);
        assert_eq!(reader.read_u32().unwrap(), 0);
        assert_eq!(reader.read_u32().unwrap(), 1_700_000_000);
    }

    #[test]
    fn test_settings_region() {
        let response = DevSyncResponse {
            settings: vec![
                Setting::new(1, true),
                Setting { id: 2, value: None },
                Setting::new(3, 1000),
            ],
            ..Default::default()
        };
        let bytes = encode_response_with_clock(&response, || at(0)).unwrap();
        let region = &bytes[REGIONS_OFFSET..];
        assert_eq!(
            region,
            &[
                0x00, 0x01, DataType::Boolean.as_u8(), 0x01, // setting 1
                0x00, 0x03, DataType::Integer.as_u8(), 0x00, 0x00, 0x03, 0xE8, // setting 3
            ]
        );

        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(
            decoded.response.settings,
            vec![Setting::new(1, true), Setting::new(3, 1000)]
        );
    }

    #[test]
    fn test_commands_roundtrip() {
        let response = DevSyncResponse {
            commands: vec![
                Command {
                    id: 7,
                    timestamp: at(1_700_000_000),
                    expires_at: Some(at(1_700_003_600)),
                    arguments: vec![
                        CommandArgument { id: 1, value: "on".to_string() },
                        CommandArgument { id: 2, value: String::new() },
                    ],
                },
                Command {
                    id: 8,
                    timestamp: at(1_700_000_001),
                    expires_at: None,
                    arguments: Vec::new(),
                },
            ],
            ..Default::default()
        };
        let bytes = encode_response_with_clock(&response, || at(1_700_000_002)).unwrap();
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.response, response);
        assert_eq!(decoded.server_time, at(1_700_000_002));
    }

    #[test]
    fn test_long_argument_blanked() {
        let response = DevSyncResponse {
            commands: vec![Command {
                id: 1,
                timestamp: at(1),
                expires_at: None,
                arguments: vec![CommandArgument { id: 1, value: "x".repeat(300) }],
            }],
            ..Default::default()
        };
        let bytes = encode_response_with_clock(&response, || at(1)).unwrap();
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.response.commands[0].arguments[0].value, "");
    }

    #[test]
    fn test_firmware_release() {
        let response = DevSyncResponse {
            firmware: FirmwareUpdate::Release(FirmwareRelease {
                release_id: 12,
                release_date: at(1_690_000_000),
                firmware_md5: EMPTY_MD5.to_string(),
                blob: vec![0xDE, 0xAD, 0xBE, 0xEF],
            }),
            ..Default::default()
        };
        let bytes = encode_response_with_clock(&response, || at(1)).unwrap();
        assert_eq!(bytes[FIRMWARE_TYPE_FIELD], FIRMWARE_TYPE_RELEASE);

        let region = &bytes[REGIONS_OFFSET..];
        assert_eq!(&region[0..4], &12i32.to_be_bytes());
        assert_eq!(
            &region[8..24],
            hex::decode("d41d8cd98f00b204e9800998ecf8427e").unwrap().as_slice()
        );
        assert_eq!(&region[24..28], &4u32.to_be_bytes());

        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.response, response);
    }

    #[test]
    fn test_firmware_patch() {
        let response = DevSyncResponse {
            firmware: FirmwareUpdate::Patch(FirmwarePatch {
                from_release_id: 11,
                to_release_id: 12,
                release_date: at(1_690_000_000),
                encoding: "bsdiff".to_string(),
                firmware_md5: EMPTY_MD5.to_string(),
                patch_md5: "AAECAwQFBgcICQoLDA0ODw==".to_string(),
                blob: vec![1, 2, 3],
            }),
            ..Default::default()
        };
        let bytes = encode_response_with_clock(&response, || at(1)).unwrap();
        let decoded = decode_response(&bytes).unwrap();
        assert_eq!(decoded.response, response);
    }

    #[test]
    fn test_invalid_md5() {
        for md5 in ["not base64!", "AAEC"] {
            let response = DevSyncResponse {
                firmware: FirmwareUpdate::Release(FirmwareRelease {
                    release_id: 1,
                    release_date: at(1),
                    firmware_md5: md5.to_string(),
                    blob: Vec::new(),
                }),
                ..Default::default()
            };
            assert!(matches!(
                encode_response_with_clock(&response, || at(1)),
                Err(CodecError::InvalidDataFormat(_))
            ));
        }
    }

    #[test]
    fn test_binary_setting_rejected() {
        let response = DevSyncResponse {
            settings: vec![Setting::new(1, ObservationValue::Binary(vec![1]))],
            ..Default::default()
        };
        assert!(matches!(
            encode_response(&response),
            Err(CodecError::UnsupportedDataType(_))
        ));
    }

    #[test]
    fn test_decode_bad_region() {
        let mut bytes = encode_response_with_clock(&DevSyncResponse::default(), || at(1))
            .unwrap()
            .to_vec();
        bytes[SETTINGS_LENGTH_FIELD + 3] = 10;
        assert!(matches!(
            decode_response(&bytes),
            Err(CodecError::InvalidDataFormat(_))
        ));
    }

    #[test]
    fn test_decode_bad_magic() {
        let mut bytes = encode_response(&DevSyncResponse::default()).unwrap().to_vec();
        bytes[3] = b'Q';
        assert!(matches!(
            decode_response(&bytes),
            Err(CodecError::InvalidDataFormat(_))
        ));
    }

    #[test]
    fn test_decode_argument_count_exceeds_region() {
        let response = DevSyncResponse {
            commands: vec![Command {
                id: 1,
                timestamp: at(1),
                expires_at: None,
                arguments: Vec::new(),
            }],
            ..Default::default()
        };
        let mut bytes = encode_response_with_clock(&response, || at(1))
            .unwrap()
            .to_vec();
        let count_at = REGIONS_OFFSET + 2 + 4 + 4;
        bytes[count_at..count_at + 2].copy_from_slice(&u16::MAX.to_be_bytes());
        assert!(matches!(
            decode_response(&bytes),
            Err(CodecError::UnexpectedEndOfData { .. })
        ));
    }
}
