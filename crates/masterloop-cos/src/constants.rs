//! COS format constants.

// ============================================================================
// Versions
// ============================================================================

/// Version 1: Boolean, Double, Integer, Position and String observations.
pub const COS_VERSION_1: u8 = 1;
/// Version 2: adds Binary and Statistics observations.
pub const COS_VERSION_2: u8 = 2;

// ============================================================================
// Header Flags
// ============================================================================

/// A section may contain more than one observation, each with its own descriptor.
pub const FLAG_MULTI_OBSERVATIONS: u8 = 0x20;
/// Each observation in a section carries a delta from the section timestamp.
pub const FLAG_MULTI_TIMESTAMPS: u8 = 0x40;
/// Timestamps are 64-bit tick counts instead of 32-bit Unix seconds.
pub const FLAG_64BIT_TIMESTAMPS: u8 = 0x80;

/// Flags the encoder is able to emit.
pub const ENCODER_SUPPORTED_FLAGS: u8 = FLAG_64BIT_TIMESTAMPS;

// ============================================================================
// Statistics Sub-Flags
// ============================================================================

/// Statistics payload carries a `[from, to]` time range.
pub const STATS_HAS_TIMERANGE: u8 = 0x01;
/// Statistics payload carries a standard deviation.
pub const STATS_HAS_STDDEV: u8 = 0x02;
/// Statistics payload carries a median.
pub const STATS_HAS_MEDIAN: u8 = 0x04;

// ============================================================================
// Layout
// ============================================================================

/// version(1) + flags(1) + section count(2)
pub const DOCUMENT_HEADER_SIZE: usize = 4;
/// Size of a packed observation descriptor.
pub const DESCRIPTOR_SIZE: usize = 2;
/// Size of the per-section observation count.
pub const SECTION_COUNT_SIZE: usize = 2;
/// Largest observation id the 12-bit descriptor field can carry.
pub const MAX_OBSERVATION_ID: u16 = 0x0FFF;
/// Largest section count / observations-per-section value.
pub const MAX_SECTION_ENTRIES: usize = u16::MAX as usize;
