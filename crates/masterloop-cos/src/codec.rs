//! COS document encoding and decoding.
//!
//! ## Document Format
//!
//! ```text
//! u8   version               (1 or 2)
//! u8   header flags          (0x20 multi-obs, 0x40 multi-ts, 0x80 64-bit ts)
//! u16  section count
//! repeat section count times:
//!   [if !multi-obs] u16 descriptor
//!   timestamp                (u32 Unix seconds, or i64 ticks if 64-bit)
//!   u16 observation count
//!   repeat observation count times:
//!     [if multi-obs] u16 descriptor
//!     [if multi-ts]  delta   (u16 seconds, or i64 ticks if 64-bit)
//!     payload
//! ```
//!
//! The encoder writes one section per observation, so the section count always
//! equals the number of observations. The decoder accepts every layout the
//! header flags describe.

use bytes::Bytes;
use masterloop_core::{
    BigEndianReader, BigEndianWriter, CodecError, CodecResult, IdentifiedObservation,
};
use tracing::{debug, trace};

use crate::constants::*;
use crate::descriptor::{CosObservationType, Descriptor};
use crate::document::{CosDocument, CosOptions};
use crate::header::HeaderFlags;
use crate::payload::{check_version_support, payload_size, read_payload, write_payload};
use crate::timestamp::{write_timestamp, WireTimestamp};

// ============================================================================
// Encoding
// ============================================================================

/// Exact encoded size of a document, as written by [`encode_document`].
pub fn document_size(document: &CosDocument) -> usize {
    let section_overhead =
        DESCRIPTOR_SIZE + document.flags.timestamp_size() + SECTION_COUNT_SIZE;
    DOCUMENT_HEADER_SIZE
        + document
            .observations
            .iter()
            .map(|o| section_overhead + payload_size(&o.value, document.flags))
            .sum::<usize>()
}

/// Encode a list of observations with the given options.
pub fn encode_observations(
    observations: &[IdentifiedObservation],
    options: &CosOptions,
) -> CodecResult<Bytes> {
    let document = CosDocument::with_options(*options, observations.to_vec());
    encode_document(&document)
}

/// Encode a document.
pub fn encode_document(document: &CosDocument) -> CodecResult<Bytes> {
    if document.version != COS_VERSION_1 && document.version != COS_VERSION_2 {
        return Err(CodecError::UnsupportedVersion(u16::from(document.version)));
    }
    let flags = document.flags;
    if flags.to_byte() & !ENCODER_SUPPORTED_FLAGS != 0 {
        return Err(CodecError::UnsupportedHeaderFlags(flags.to_byte()));
    }
    if document.observations.len() > MAX_SECTION_ENTRIES {
        return Err(CodecError::LengthOverflow {
            length: document.observations.len(),
            max: MAX_SECTION_ENTRIES,
        });
    }

    let mut writer = BigEndianWriter::with_capacity(document_size(document));
    writer.write_u8(document.version);
    writer.write_u8(flags.to_byte());
    writer.write_u16(document.observations.len() as u16);

    // TODO: group observations by id into shared sections with timestamp deltas;
    // that layout needs a new format version.
    for observation in &document.observations {
        check_version_support(document.version, observation.data_type())?;
        let descriptor = Descriptor::new(CosObservationType::for_value(&observation.value), observation.id)?;
        trace!(
            id = observation.id,
            observation_type = %descriptor.observation_type,
            "writing section"
        );

        writer.write_u16(descriptor.encode());
        write_timestamp(&mut writer, &observation.timestamp, flags)?;
        writer.write_u16(1);
        write_payload(&mut writer, &observation.value, flags)?;
    }

    debug!(
        version = document.version,
        flags = %flags,
        observations = document.observations.len(),
        bytes = writer.position(),
        "encoded COS document"
    );
    Ok(writer.into_bytes())
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a document.
pub fn decode_document(data: &[u8]) -> CodecResult<CosDocument> {
    let mut reader = BigEndianReader::new(data);

    let version = reader.read_u8()?;
    if version != COS_VERSION_1 && version != COS_VERSION_2 {
        return Err(CodecError::UnsupportedVersion(u16::from(version)));
    }
    let flags = HeaderFlags::from_byte(reader.read_u8()?);
    let section_count = reader.read_u16()?;

    let mut observations = Vec::new();
    for section in 0..section_count {
        decode_section(&mut reader, version, flags, &mut observations)
            .map_err(|e| {
                debug!(section, offset = reader.position(), error = %e, "COS section decode failed");
                e
            })?;
    }

    debug!(
        version,
        flags = %flags,
        sections = section_count,
        observations = observations.len(),
        "decoded COS document"
    );
    Ok(CosDocument {
        version,
        flags,
        observations,
    })
}

fn decode_section(
    reader: &mut BigEndianReader<'_>,
    version: u8,
    flags: HeaderFlags,
    observations: &mut Vec<IdentifiedObservation>,
) -> CodecResult<()> {
    let section_descriptor = if flags.multi_observations() {
        None
    } else {
        Some(read_descriptor(reader, version)?)
    };
    let section_timestamp = WireTimestamp::read(reader, flags)?;
    let count = reader.read_u16()?;
    trace!(?section_timestamp, count, "reading section");

    for _ in 0..count {
        let descriptor = match section_descriptor {
            Some(d) => d,
            None => read_descriptor(reader, version)?,
        };
        let timestamp = if flags.multi_timestamps() {
            section_timestamp.read_delta(reader, flags)?
        } else {
            section_timestamp.to_datetime()?
        };
        let value = read_payload(reader, descriptor.observation_type, flags)?;
        observations.push(IdentifiedObservation {
            id: descriptor.id,
            timestamp,
            value,
        });
    }
    Ok(())
}

fn read_descriptor(reader: &mut BigEndianReader<'_>, version: u8) -> CodecResult<Descriptor> {
    let descriptor = Descriptor::decode(reader.read_u16()?)?;
    if !descriptor.observation_type.supported_in(version) {
        return Err(CodecError::UnsupportedObservationType(
            descriptor.observation_type.as_u8(),
        ));
    }
    Ok(descriptor)
}
