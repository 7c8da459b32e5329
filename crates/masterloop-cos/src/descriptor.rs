//! Observation descriptors.
//!
//! A descriptor is a 16-bit word packing the wire observation type into the
//! top nibble and the observation id into the bottom 12 bits:
//!
//! ```text
//! +-----------+------------------------+
//! | type (4)  | observation id (12)    |
//! +-----------+------------------------+
//! ```

use masterloop_core::{CodecError, CodecResult, DataType, ObservationValue};

use crate::constants::{COS_VERSION_1, COS_VERSION_2, MAX_OBSERVATION_ID};

// ============================================================================
// Observation Type
// ============================================================================

/// Wire type of an observation, stored in the descriptor's top nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CosObservationType {
    /// 1-byte boolean.
    Boolean = 1,
    /// 8-byte IEEE 754 double.
    Double = 2,
    /// 4-byte IEEE 754 float, decoded as a double.
    Float = 3,
    /// Signed 32-bit integer.
    Int32 = 4,
    /// Signed 16-bit integer.
    Int16 = 5,
    /// Unsigned 16-bit integer.
    UInt16 = 6,
    /// Signed 8-bit integer.
    Int8 = 7,
    /// Unsigned 8-bit integer.
    UInt8 = 8,
    /// Latitude and longitude as 4-byte floats.
    Position2D = 9,
    /// Latitude, longitude and altitude as 4-byte floats.
    Position3D = 10,
    /// Length-prefixed ASCII text.
    Ascii = 11,
    /// Length-prefixed UTF-8 text.
    Utf8 = 12,
    /// Statistics record.
    Statistics = 13,
    /// Length-prefixed raw bytes.
    Binary = 14,
}

impl CosObservationType {
    /// Every defined wire type, in code order.
    pub const ALL: [CosObservationType; 14] = [
        CosObservationType::Boolean,
        CosObservationType::Double,
        CosObservationType::Float,
        CosObservationType::Int32,
        CosObservationType::Int16,
        CosObservationType::UInt16,
        CosObservationType::Int8,
        CosObservationType::UInt8,
        CosObservationType::Position2D,
        CosObservationType::Position3D,
        CosObservationType::Ascii,
        CosObservationType::Utf8,
        CosObservationType::Statistics,
        CosObservationType::Binary,
    ];

    /// Parse a wire type nibble. Code 0 is reserved and 15 is undefined.
    pub fn from_u8(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    /// Numeric code of this wire type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Data type a value of this wire type decodes to.
    pub fn data_type(self) -> DataType {
        match self {
            CosObservationType::Boolean => DataType::Boolean,
            CosObservationType::Double | CosObservationType::Float => DataType::Double,
            CosObservationType::Int32
            | CosObservationType::Int16
            | CosObservationType::UInt16
            | CosObservationType::Int8
            | CosObservationType::UInt8 => DataType::Integer,
            CosObservationType::Position2D | CosObservationType::Position3D => DataType::Position,
            CosObservationType::Ascii | CosObservationType::Utf8 => DataType::String,
            CosObservationType::Statistics => DataType::Statistics,
            CosObservationType::Binary => DataType::Binary,
        }
    }

    /// Whether documents of `version` may carry this wire type.
    ///
    /// Version 1 carries positions only in 3D form and has no Binary or
    /// Statistics.
    pub fn supported_in(self, version: u8) -> bool {
        match self {
            CosObservationType::Position2D
            | CosObservationType::Statistics
            | CosObservationType::Binary => version == COS_VERSION_2,
            _ => version == COS_VERSION_1 || version == COS_VERSION_2,
        }
    }

    /// Narrowest integer wire type able to carry `value`.
    ///
    /// Ranges are tested in the order Int8, UInt8, Int16, UInt16, so small
    /// non-negative values prefer the signed form.
    pub fn for_integer(value: i32) -> Self {
        if (-128..=127).contains(&value) {
            CosObservationType::Int8
        } else if (0..=255).contains(&value) {
            CosObservationType::UInt8
        } else if (-32768..=32767).contains(&value) {
            CosObservationType::Int16
        } else if (0..=65535).contains(&value) {
            CosObservationType::UInt16
        } else {
            CosObservationType::Int32
        }
    }

    /// Wire type the encoder emits for `value`.
    pub fn for_value(value: &ObservationValue) -> Self {
        match value {
            ObservationValue::Boolean(_) => CosObservationType::Boolean,
            ObservationValue::Double(_) => CosObservationType::Double,
            ObservationValue::Integer(v) => Self::for_integer(*v),
            ObservationValue::Position(_) => CosObservationType::Position3D,
            ObservationValue::String(_) => CosObservationType::Utf8,
            ObservationValue::Binary(_) => CosObservationType::Binary,
            ObservationValue::Statistics(_) => CosObservationType::Statistics,
        }
    }
}

impl std::fmt::Display for CosObservationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// Packed (wire type, observation id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Wire type of the observation payload.
    pub observation_type: CosObservationType,
    /// Observation id, at most 4095.
    pub id: u16,
}

impl Descriptor {
    /// Create a descriptor, validating the id range.
    pub fn new(observation_type: CosObservationType, id: u16) -> CodecResult<Self> {
        if id > MAX_OBSERVATION_ID {
            return Err(CodecError::InvalidObservationId(id));
        }
        Ok(Descriptor {
            observation_type,
            id,
        })
    }

    /// Pack into the 16-bit wire word.
    pub fn encode(&self) -> u16 {
        (u16::from(self.observation_type.as_u8()) << 12) | (self.id & MAX_OBSERVATION_ID)
    }

    /// Unpack a 16-bit wire word.
    pub fn decode(word: u16) -> CodecResult<Self> {
        let code = (word >> 12) as u8;
        let observation_type = CosObservationType::from_u8(code)
            .ok_or(CodecError::UnsupportedObservationType(code))?;
        Ok(Descriptor {
            observation_type,
            id: word & MAX_OBSERVATION_ID,
        })
    }
}
