//! Device template metadata.
//!
//! A template maps observation ids to their declared [`DataType`]. The DevSync
//! request wire format does not carry types, so the decoder resolves every id
//! through the template of the sending device.

use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Declaration of a single observation in a device template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationTemplate {
    /// Observation id.
    pub id: u16,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Declared data type.
    pub data_type: DataType,
}

/// Template describing the observations a device type reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTemplate {
    /// Template identifier.
    #[serde(default)]
    pub id: String,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    /// Declared observations.
    #[serde(default)]
    pub observations: Vec<ObservationTemplate>,
}

impl DeviceTemplate {
    /// Create an empty template.
    pub fn new(id: impl Into<String>) -> Self {
        DeviceTemplate {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Add an observation declaration.
    pub fn with_observation(
        mut self,
        id: u16,
        name: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        self.observations.push(ObservationTemplate {
            id,
            name: name.into(),
            data_type,
        });
        self
    }

    /// Look up an observation declaration by id.
    pub fn observation(&self, id: u16) -> Option<&ObservationTemplate> {
        self.observations.iter().find(|o| o.id == id)
    }

    /// Declared data type of an observation id.
    pub fn observation_type(&self, id: u16) -> Option<DataType> {
        self.observation(id).map(|o| o.data_type)
    }
}
