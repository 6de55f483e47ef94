//! Core types for FSUIPC data exchange.
//!
//! - [`ValueType`] describes how the bytes at an offset are interpreted
//! - [`Value`] holds a decoded value
//! - [`ErrorCode`] and [`Simulator`] mirror the SDK's constant tables
//! - [`Versions`] carries the version fields captured on open, with
//!   [`FsuipcVersion`] and [`LibraryVersion`] formatting them

mod error_code;
mod simulator;
mod update_rate;
mod value;
mod value_type;
mod version;

pub use error_code::ErrorCode;
pub use simulator::Simulator;
pub use update_rate::UpdateRate;
pub use value::Value;
pub use value_type::{MAX_STRING_LENGTH, ValueType};
pub use version::{FsuipcVersion, LibraryVersion, Versions};
