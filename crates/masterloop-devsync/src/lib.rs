//! DevSync Protocol
//!
//! DevSync is the binary synchronization exchange between a device and the
//! Masterloop cloud. The device sends a request (`MDRQ`) carrying its
//! observations and command responses; the cloud answers with a response
//! (`MDRS`) carrying settings, pending commands and an optional firmware
//! update, laid out in regions addressed by an offset table.
//!
//! Request observations carry no type information, so decoding resolves each
//! id through the device's [`DeviceTemplate`](masterloop_core::DeviceTemplate).
//!
//! # Example
//!
//! ```rust,ignore
//! use masterloop_devsync::{decode_request, encode_response, DevSyncResponse};
//!
//! let request = decode_request(&bytes, &template)?;
//! println!("{}", request.observation_package_json()?);
//! let reply = encode_response(&DevSyncResponse::default())?;
//! ```

mod constants;
mod fields;
mod package;
mod request;
mod response;
mod types;

pub use constants::*;
pub use package::*;
pub use request::*;
pub use response::*;
pub use types::*;
