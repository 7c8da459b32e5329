//! COS header flags.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// The header flag byte of a COS document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    /// No flags: one observation per section, 32-bit Unix-second timestamps.
    pub const NONE: HeaderFlags = HeaderFlags(0);
    /// See [`FLAG_MULTI_OBSERVATIONS`].
    pub const MULTI_OBSERVATIONS: HeaderFlags = HeaderFlags(FLAG_MULTI_OBSERVATIONS);
    /// See [`FLAG_MULTI_TIMESTAMPS`].
    pub const MULTI_TIMESTAMPS: HeaderFlags = HeaderFlags(FLAG_MULTI_TIMESTAMPS);
    /// See [`FLAG_64BIT_TIMESTAMPS`].
    pub const TIMESTAMPS_64BIT: HeaderFlags = HeaderFlags(FLAG_64BIT_TIMESTAMPS);

    /// Wrap a raw flag byte.
    pub const fn from_byte(byte: u8) -> Self {
        HeaderFlags(byte)
    }

    /// The raw flag byte.
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: HeaderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sections may hold several observations with their own descriptors.
    pub const fn multi_observations(self) -> bool {
        self.contains(Self::MULTI_OBSERVATIONS)
    }

    /// Observations carry timestamp deltas.
    pub const fn multi_timestamps(self) -> bool {
        self.contains(Self::MULTI_TIMESTAMPS)
    }

    /// Timestamps are 64-bit ticks.
    pub const fn timestamps_64bit(self) -> bool {
        self.contains(Self::TIMESTAMPS_64BIT)
    }

    /// Wire size of a section timestamp under these flags.
    pub const fn timestamp_size(self) -> usize {
        if self.timestamps_64bit() {
            8
        } else {
            4
        }
    }

    /// Wire size of a per-observation timestamp delta under these flags.
    pub const fn delta_size(self) -> usize {
        if self.timestamps_64bit() {
            8
        } else {
            2
        }
    }
}

impl std::ops::BitOr for HeaderFlags {
    type Output = HeaderFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        HeaderFlags(self.0 | rhs.0)
    }
}

impl std::fmt::Display for HeaderFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.multi_observations() {
            names.push("MULTI_OBSERVATIONS");
        }
        if self.multi_timestamps() {
            names.push("MULTI_TIMESTAMPS");
        }
        if self.timestamps_64bit() {
            names.push("64BIT_TIMESTAMPS");
        }
        if names.is_empty() {
            write!(f, "0x{:02X}", self.0)
        } else {
            write!(f, "0x{:02X} ({})", self.0, names.join(" | "))
        }
    }
}
