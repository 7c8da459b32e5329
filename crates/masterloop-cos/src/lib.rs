//! Compact Observation Stream (COS)
//!
//! COS is a versioned, section-based binary format for batches of timestamped
//! device observations. Each observation is tagged with a 16-bit
//! [`Descriptor`] packing a 4-bit wire type and a 12-bit observation id, and
//! integers are written in the narrowest width that fits.
//!
//! # Versions
//!
//! - **1**: Boolean, Double, Integer, Position and String
//! - **2**: adds Binary and Statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use masterloop_core::IdentifiedObservation;
//! use masterloop_cos::{decode_document, encode_observations, CosOptions};
//!
//! let observations = vec![IdentifiedObservation::new(5, Utc::now(), true)];
//! let bytes = encode_observations(&observations, &CosOptions::default())?;
//! let document = decode_document(&bytes)?;
//! ```

mod codec;
mod constants;
mod descriptor;
mod document;
mod header;
mod payload;
mod timestamp;

pub use codec::*;
pub use constants::*;
pub use descriptor::*;
pub use document::*;
pub use header::*;
pub use payload::*;
pub use timestamp::*;
