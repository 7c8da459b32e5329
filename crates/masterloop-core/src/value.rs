//! Observation value model.
//!
//! This module provides:
//! - [`DataType`] - The declared type of an observation, setting or argument
//! - [`ObservationValue`] - The tagged union of all value kinds
//! - [`Position`], [`Statistics`], [`TimeRange`] - Compound value payloads
//! - [`IdentifiedObservation`] - A timestamped value paired with its observation id

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Data Type
// ============================================================================

/// Declared data type of an observation or setting.
///
/// The discriminants are the values carried in DevSync `declared-data-type` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DataType {
    /// No type declared.
    Undefined = 0,
    /// Raw byte sequence.
    Binary = 1,
    /// True/false.
    Boolean = 2,
    /// 64-bit floating point.
    Double = 3,
    /// 32-bit signed integer.
    Integer = 4,
    /// Latitude/longitude/altitude.
    Position = 5,
    /// UTF-8 text.
    String = 6,
    /// Aggregated statistics.
    Statistics = 7,
}

impl DataType {
    /// Parse a data type from its numeric code.
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(DataType::Undefined),
            1 => Some(DataType::Binary),
            2 => Some(DataType::Boolean),
            3 => Some(DataType::Double),
            4 => Some(DataType::Integer),
            5 => Some(DataType::Position),
            6 => Some(DataType::String),
            7 => Some(DataType::Statistics),
            _ => None,
        }
    }

    /// Numeric code of this data type.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase name of this data type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DataType::Undefined => "undefined",
            DataType::Binary => "binary",
            DataType::Boolean => "boolean",
            DataType::Double => "double",
            DataType::Integer => "integer",
            DataType::Position => "position",
            DataType::String => "string",
            DataType::Statistics => "statistics",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Compound Payloads
// ============================================================================

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Position {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Closed time interval covered by a statistics value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the interval.
    pub from: DateTime<Utc>,
    /// End of the interval.
    pub to: DateTime<Utc>,
}

/// Aggregated statistics over a series of samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Number of samples.
    pub count: i32,
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest sample.
    pub minimum: f64,
    /// Largest sample.
    pub maximum: f64,
    /// Interval the samples were taken in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Standard deviation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std_dev: Option<f64>,
    /// Median.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
}

impl Statistics {
    /// Create statistics without any of the optional fields.
    pub fn new(count: i32, mean: f64, minimum: f64, maximum: f64) -> Self {
        Statistics {
            count,
            mean,
            minimum,
            maximum,
            time_range: None,
            std_dev: None,
            median: None,
        }
    }

    /// Attach the sampled interval.
    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.time_range = Some(TimeRange { from, to });
        self
    }

    /// Attach the standard deviation.
    pub fn with_std_dev(mut self, std_dev: f64) -> Self {
        self.std_dev = Some(std_dev);
        self
    }

    /// Attach the median.
    pub fn with_median(mut self, median: f64) -> Self {
        self.median = Some(median);
        self
    }
}

// ============================================================================
// Observation Value
// ============================================================================

/// The value of a single observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", content = "value", rename_all = "lowercase")]
pub enum ObservationValue {
    /// Boolean value.
    Boolean(bool),
    /// Floating point value.
    Double(f64),
    /// Integer value.
    Integer(i32),
    /// Geographic position.
    Position(Position),
    /// Text value.
    String(String),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Aggregated statistics.
    Statistics(Statistics),
}

impl ObservationValue {
    /// The data type tag matching this value.
    pub fn data_type(&self) -> DataType {
        match self {
            ObservationValue::Boolean(_) => DataType::Boolean,
            ObservationValue::Double(_) => DataType::Double,
            ObservationValue::Integer(_) => DataType::Integer,
            ObservationValue::Position(_) => DataType::Position,
            ObservationValue::String(_) => DataType::String,
            ObservationValue::Binary(_) => DataType::Binary,
            ObservationValue::Statistics(_) => DataType::Statistics,
        }
    }

    /// Create a position value.
    pub fn position(latitude: f64, longitude: f64, altitude: f64) -> Self {
        ObservationValue::Position(Position::new(latitude, longitude, altitude))
    }
}

impl From<bool> for ObservationValue {
    fn from(v: bool) -> Self {
        ObservationValue::Boolean(v)
    }
}

impl From<f64> for ObservationValue {
    fn from(v: f64) -> Self {
        ObservationValue::Double(v)
    }
}

impl From<i32> for ObservationValue {
    fn from(v: i32) -> Self {
        ObservationValue::Integer(v)
    }
}

impl From<&str> for ObservationValue {
    fn from(v: &str) -> Self {
        ObservationValue::String(v.to_string())
    }
}

impl From<String> for ObservationValue {
    fn from(v: String) -> Self {
        ObservationValue::String(v)
    }
}

impl From<Vec<u8>> for ObservationValue {
    fn from(v: Vec<u8>) -> Self {
        ObservationValue::Binary(v)
    }
}

impl From<Position> for ObservationValue {
    fn from(v: Position) -> Self {
        ObservationValue::Position(v)
    }
}

impl From<Statistics> for ObservationValue {
    fn from(v: Statistics) -> Self {
        ObservationValue::Statistics(v)
    }
}

// ============================================================================
// Identified Observation
// ============================================================================

/// A timestamped observation value paired with its observation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedObservation {
    /// Observation id as declared by the device template.
    pub id: u16,
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// The observed value.
    #[serde(flatten)]
    pub value: ObservationValue,
}

impl IdentifiedObservation {
    /// Create a new identified observation.
    pub fn new(id: u16, timestamp: DateTime<Utc>, value: impl Into<ObservationValue>) -> Self {
        IdentifiedObservation {
            id,
            timestamp,
            value: value.into(),
        }
    }

    /// The data type of the carried value.
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}
