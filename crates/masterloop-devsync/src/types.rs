//! DevSync request and response types.

use chrono::{DateTime, Utc};
use masterloop_core::{IdentifiedObservation, ObservationValue};
use serde::{Deserialize, Serialize};

use crate::constants::*;

// ============================================================================
// Request (device -> cloud)
// ============================================================================

/// A device's answer to a previously delivered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    /// Command id.
    pub id: u16,
    /// Timestamp identifying the command instance.
    pub timestamp: DateTime<Utc>,
    /// When the device received the command.
    pub delivered_at: DateTime<Utc>,
    /// Whether the device accepted the command.
    pub accepted: bool,
}

/// A decoded device-to-cloud synchronization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevSyncRequest {
    /// Protocol version of the message.
    pub version: u16,
    /// Timestamp of the settings the device currently runs with.
    pub settings_timestamp: DateTime<Utc>,
    /// Firmware release the device currently runs.
    pub firmware_release_id: i32,
    /// Whether the device accepts delta patches.
    pub firmware_use_delta: bool,
    /// Observations reported by the device.
    pub observations: Vec<IdentifiedObservation>,
    /// Responses to delivered commands.
    pub command_responses: Vec<CommandResponse>,
}

impl DevSyncRequest {
    /// Settings timestamp as RFC 3339 text.
    pub fn settings_timestamp_iso(&self) -> String {
        self.settings_timestamp.to_rfc3339()
    }
}

// ============================================================================
// Response (cloud -> device)
// ============================================================================

/// A device setting. Settings without a value are not transmitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    /// Setting id.
    pub id: u16,
    /// Current value, if any.
    #[serde(default)]
    pub value: Option<ObservationValue>,
}

impl Setting {
    /// Create a setting with a value.
    pub fn new(id: u16, value: impl Into<ObservationValue>) -> Self {
        Setting {
            id,
            value: Some(value.into()),
        }
    }
}

/// A single command argument. Values travel as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgument {
    /// Argument id.
    pub id: u16,
    /// Argument value.
    pub value: String,
}

/// A command queued for the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Command id.
    pub id: u16,
    /// When the command was issued.
    pub timestamp: DateTime<Utc>,
    /// When the command stops being valid.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Arguments.
    #[serde(default)]
    pub arguments: Vec<CommandArgument>,
}

/// A delta patch between two firmware releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwarePatch {
    /// Release the patch applies to.
    pub from_release_id: i32,
    /// Release the patch produces.
    pub to_release_id: i32,
    /// Release date of the target release.
    pub release_date: DateTime<Utc>,
    /// Patch encoding name.
    pub encoding: String,
    /// Base64 MD5 digest of the resulting firmware.
    pub firmware_md5: String,
    /// Base64 MD5 digest of the patch blob.
    pub patch_md5: String,
    /// Patch blob.
    #[serde(default)]
    pub blob: Vec<u8>,
}

/// A complete firmware release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareRelease {
    /// Release id.
    pub release_id: i32,
    /// Release date.
    pub release_date: DateTime<Utc>,
    /// Base64 MD5 digest of the firmware.
    pub firmware_md5: String,
    /// Firmware blob.
    #[serde(default)]
    pub blob: Vec<u8>,
}

/// Firmware carried by a response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FirmwareUpdate {
    /// Nothing to install.
    #[default]
    None,
    /// Delta patch.
    Patch(FirmwarePatch),
    /// Full release.
    Release(FirmwareRelease),
}

impl FirmwareUpdate {
    /// Wire type byte.
    pub fn type_code(&self) -> u8 {
        match self {
            FirmwareUpdate::None => FIRMWARE_TYPE_NONE,
            FirmwareUpdate::Patch(_) => FIRMWARE_TYPE_PATCH,
            FirmwareUpdate::Release(_) => FIRMWARE_TYPE_RELEASE,
        }
    }
}

/// A cloud-to-device synchronization response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DevSyncResponse {
    /// Device settings.
    #[serde(default)]
    pub settings: Vec<Setting>,
    /// Pending commands.
    #[serde(default)]
    pub commands: Vec<Command>,
    /// Firmware update.
    #[serde(default)]
    pub firmware: FirmwareUpdate,
}

/// A response as seen by the device, including the server clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedResponse {
    /// Server time captured at the end of encoding.
    pub server_time: DateTime<Utc>,
    /// Response content.
    #[serde(flatten)]
    pub response: DevSyncResponse,
}
