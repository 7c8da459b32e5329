//! Shared building blocks for the Masterloop binary codecs.
//!
//! This crate provides the pieces both the COS and DevSync codecs sit on:
//!
//! - [`BigEndianReader`] / [`BigEndianWriter`] - network byte order primitives
//! - [`ObservationValue`] and friends - the observation value model
//! - [`DeviceTemplate`] - observation id to data type metadata
//! - [`time`] - Unix-second and tick timestamp conversions
//! - [`CodecError`] - the error taxonomy shared by every codec
//!
//! Everything here is synchronous and free of shared state; independent
//! buffers can be encoded and decoded concurrently without locking.

mod bigendian;
mod error;
mod template;
pub mod time;
mod value;

pub use bigendian::*;
pub use error::*;
pub use template::*;
pub use value::*;
