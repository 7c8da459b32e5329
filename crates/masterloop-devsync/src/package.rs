//! Compact JSON packaging of decoded request observations.
//!
//! Observations are grouped by id in order of first appearance, with short
//! field names:
//!
//! ```json
//! {"o":[{"i":2,"d":"double","v":[{"t":"2024-01-01T00:00:00Z","v":21.5}]}]}
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use masterloop_core::{DataType, IdentifiedObservation, ObservationValue};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::types::DevSyncRequest;

/// One timestamped value within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagedValue {
    /// When the value was observed.
    #[serde(rename = "t", serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Value as plain JSON.
    #[serde(rename = "v")]
    pub value: Value,
}

/// All values of a single observation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationGroup {
    /// Observation id.
    #[serde(rename = "i")]
    pub id: u16,
    /// Declared data type.
    #[serde(rename = "d")]
    pub data_type: DataType,
    /// Values in arrival order.
    #[serde(rename = "v")]
    pub values: Vec<PackagedValue>,
}

/// Observations grouped by id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservationPackage {
    /// Groups in order of first appearance.
    #[serde(rename = "o")]
    pub groups: Vec<ObservationGroup>,
}

impl ObservationPackage {
    /// Group observations by id, keeping first-appearance order.
    pub fn from_observations(observations: &[IdentifiedObservation]) -> Self {
        let mut groups: Vec<ObservationGroup> = Vec::new();
        for observation in observations {
            let packaged = PackagedValue {
                timestamp: observation.timestamp,
                value: json_value(&observation.value),
            };
            match groups.iter_mut().find(|g| g.id == observation.id) {
                Some(group) => group.values.push(packaged),
                None => groups.push(ObservationGroup {
                    id: observation.id,
                    data_type: observation.data_type(),
                    values: vec![packaged],
                }),
            }
        }
        ObservationPackage { groups }
    }

    /// Total number of values across all groups.
    pub fn value_count(&self) -> usize {
        self.groups.iter().map(|g| g.values.len()).sum()
    }

    /// Compact JSON text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl DevSyncRequest {
    /// The request's observations grouped by id.
    pub fn observation_package(&self) -> ObservationPackage {
        ObservationPackage::from_observations(&self.observations)
    }

    /// The request's observations as compact JSON.
    pub fn observation_package_json(&self) -> serde_json::Result<String> {
        self.observation_package().to_json()
    }
}

fn json_value(value: &ObservationValue) -> Value {
    match value {
        ObservationValue::Boolean(v) => Value::Bool(*v),
        ObservationValue::Double(v) => Value::from(*v),
        ObservationValue::Integer(v) => Value::from(*v),
        ObservationValue::String(s) => Value::String(s.clone()),
        ObservationValue::Binary(b) => Value::String(BASE64.encode(b)),
        ObservationValue::Position(p) => serde_json::to_value(p).unwrap_or(Value::Null),
        ObservationValue::Statistics(s) => serde_json::to_value(s).unwrap_or(Value::Null),
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}
