//! COS documents and encoder options.

use masterloop_core::IdentifiedObservation;
use serde::{Deserialize, Serialize};

use crate::constants::COS_VERSION_2;
use crate::header::HeaderFlags;

/// Options controlling how observations are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CosOptions {
    /// Format version (1 or 2).
    pub version: u8,
    /// Header flags. Only `64BIT_TIMESTAMPS` can be encoded.
    pub flags: HeaderFlags,
}

impl Default for CosOptions {
    fn default() -> Self {
        CosOptions {
            version: COS_VERSION_2,
            flags: HeaderFlags::NONE,
        }
    }
}

impl CosOptions {
    /// Options for the given version and flags.
    pub fn new(version: u8, flags: HeaderFlags) -> Self {
        CosOptions { version, flags }
    }

    /// Use 64-bit tick timestamps.
    pub fn with_64bit_timestamps(mut self) -> Self {
        self.flags = self.flags | HeaderFlags::TIMESTAMPS_64BIT;
        self
    }
}

/// An ordered batch of observations with its format version and header flags.
///
/// The data type of each entry is carried by its [`masterloop_core::ObservationValue`]
/// variant, so the type tag can never disagree with the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosDocument {
    /// Format version (1 or 2).
    pub version: u8,
    /// Header flags.
    pub flags: HeaderFlags,
    /// Observations in wire order.
    pub observations: Vec<IdentifiedObservation>,
}

impl CosDocument {
    /// Create an empty document.
    pub fn new(version: u8, flags: HeaderFlags) -> Self {
        CosDocument {
            version,
            flags,
            observations: Vec::new(),
        }
    }

    /// Create a document from options and observations.
    pub fn with_options(options: CosOptions, observations: Vec<IdentifiedObservation>) -> Self {
        CosDocument {
            version: options.version,
            flags: options.flags,
            observations,
        }
    }

    /// Append an observation.
    pub fn push(&mut self, observation: IdentifiedObservation) {
        self.observations.push(observation);
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the document holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The options this document encodes with.
    pub fn options(&self) -> CosOptions {
        CosOptions::new(self.version, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = CosOptions::default();
        assert_eq!(options.version, 2);
        assert_eq!(options.flags, HeaderFlags::NONE);
        assert!(options.with_64bit_timestamps().flags.timestamps_64bit());
    }

    #[test]
    fn test_options_from_json() {
        let options: CosOptions = serde_json::from_str(r#"{"flags":128}"#).unwrap();
        assert_eq!(options.version, 2);
        assert!(options.flags.timestamps_64bit());
    }
}
