//! DevSync protocol constants.

// ============================================================================
// Message Identification
// ============================================================================

/// Magic identifier of a device-to-cloud request.
pub const REQUEST_MAGIC: &str = "MDRQ";
/// Magic identifier of a cloud-to-device response.
pub const RESPONSE_MAGIC: &str = "MDRS";
/// Length of the magic identifier.
pub const MAGIC_SIZE: usize = 4;
/// The only protocol version currently spoken.
pub const PROTOCOL_VERSION_3: u16 = 3;

// ============================================================================
// Response Table
// ============================================================================

/// Offset of the region table, right after magic and version.
pub const TABLE_OFFSET: usize = MAGIC_SIZE + 2;
/// Offset of the settings region offset field.
pub const SETTINGS_OFFSET_FIELD: usize = TABLE_OFFSET;
/// Offset of the settings region length field.
pub const SETTINGS_LENGTH_FIELD: usize = TABLE_OFFSET + 4;
/// Offset of the commands region offset field.
pub const COMMANDS_OFFSET_FIELD: usize = TABLE_OFFSET + 8;
/// Offset of the commands region length field.
pub const COMMANDS_LENGTH_FIELD: usize = TABLE_OFFSET + 12;
/// Offset of the firmware type byte.
pub const FIRMWARE_TYPE_FIELD: usize = TABLE_OFFSET + 16;
/// Offset of the firmware region offset field.
pub const FIRMWARE_OFFSET_FIELD: usize = TABLE_OFFSET + 17;
/// Offset of the firmware region length field.
pub const FIRMWARE_LENGTH_FIELD: usize = TABLE_OFFSET + 21;
/// Offset of the server timestamp field.
pub const SERVER_TIME_FIELD: usize = TABLE_OFFSET + 25;
/// Size of the region table: 4 x u32, u8, 3 x u32.
pub const TABLE_SIZE: usize = 29;
/// Offset of the first region.
pub const REGIONS_OFFSET: usize = TABLE_OFFSET + TABLE_SIZE;

// ============================================================================
// Firmware Types
// ============================================================================

/// No firmware update.
pub const FIRMWARE_TYPE_NONE: u8 = 0;
/// Delta patch from one release to another.
pub const FIRMWARE_TYPE_PATCH: u8 = 1;
/// Full firmware release.
pub const FIRMWARE_TYPE_RELEASE: u8 = 2;

// ============================================================================
// Field Limits
// ============================================================================

/// Sentinel id terminating observation and command response lists.
pub const LIST_TERMINATOR_ID: u16 = 0;
/// Longest string a 1-byte length prefix can carry.
pub const MAX_SHORT_STRING_LENGTH: usize = u8::MAX as usize;
/// Size of a raw MD5 digest.
pub const MD5_DIGEST_SIZE: usize = 16;
