//! Error types for FSUIPC operations.
//!
//! Failures reported by the FSUIPC SDK are surfaced verbatim as
//! [`FsuipcError::Native`] carrying the SDK's [`ErrorCode`]. The marshaling
//! layer adds its own categories for problems detected before anything is
//! handed to the SDK.
//!
//! ## Error Categories
//!
//! - **Native Errors**: Codes returned by the FSUIPC link (no simulator, timeout, ...)
//! - **Specification Errors**: Malformed data specifications
//! - **Conversion Errors**: Values that do not fit the declared offset type
//! - **Usage Errors**: Length mismatches and reads through write-only data
//! - **Config Errors**: YAML configuration that cannot be loaded
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use fsuipc::{ErrorCode, FsuipcError};
//!
//! let error = FsuipcError::native(ErrorCode::NoFs);
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ErrorCode;

/// Result type alias for FSUIPC operations.
pub type Result<T, E = FsuipcError> = std::result::Result<T, E>;

/// Main error type for FSUIPC operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FsuipcError {
    #[error("FSUIPC error: {} ({})", code.raw(), code.description())]
    Native { code: ErrorCode },

    #[error("Invalid data specification at element {index}: {reason}")]
    Specification { index: usize, reason: String },

    #[error("Type conversion error at element {index}: {details}")]
    TypeConversion { index: usize, details: String },

    #[error("Data list should contain {expected} elements, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Prepared data is for writing only")]
    WriteOnly,

    #[error("Configuration error in {}: {details}", path.display())]
    Config { path: PathBuf, details: String },

    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Monitor failed: {reason}")]
    Monitor { reason: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },
}

impl FsuipcError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            FsuipcError::Native { code } => code.is_transient(),
            FsuipcError::Monitor { .. } => true,
            FsuipcError::Specification { .. } => false,
            FsuipcError::TypeConversion { .. } => false,
            FsuipcError::LengthMismatch { .. } => false,
            FsuipcError::WriteOnly => false,
            FsuipcError::Config { .. } => false,
            FsuipcError::Io { .. } => false,
            FsuipcError::UnsupportedPlatform { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            FsuipcError::Native { code } => match code {
                ErrorCode::NoFs | ErrorCode::Running => vec![
                    "Ensure the flight simulator is running with FSUIPC installed",
                    "If using WideClient, check the server connection",
                ],
                ErrorCode::Open => vec!["Close the existing connection before opening another"],
                ErrorCode::Version | ErrorCode::WrongFs => vec![
                    "Check the simulator filter passed to open",
                    "Update FSUIPC to a compatible version",
                ],
                ErrorCode::NotOpen => vec!["Open the connection before reading or writing"],
                ErrorCode::Timeout | ErrorCode::SendMsg => vec![
                    "Check the simulator is responsive",
                    "Retry the request",
                ],
                ErrorCode::Size => vec![
                    "Split the request into smaller data specifications",
                ],
                _ => vec![
                    "Restart the simulator and the client",
                    "Check Windows permissions for shared memory access",
                ],
            },
            FsuipcError::Specification { .. } => vec![
                "Use one of the type letters b, c, h, H, d, u, l, L, f, F",
                "Use a non-zero integer tag for strings",
                "Provide at least one field",
            ],
            FsuipcError::TypeConversion { .. } => vec![
                "Check the value type matches the declared offset type",
                "Check integer values fit the declared width",
            ],
            FsuipcError::LengthMismatch { .. } => {
                vec!["Provide exactly one value per specification field"]
            }
            FsuipcError::WriteOnly => vec!["Prepare the data with for_reading set to true"],
            FsuipcError::Config { .. } => vec![
                "Check the YAML syntax of the configuration file",
                "Verify every field has an offset and a type",
            ],
            FsuipcError::Io { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            FsuipcError::Monitor { .. } => vec![
                "Check the simulator is still running",
                "Restart the monitor",
            ],
            FsuipcError::UnsupportedPlatform { .. } => vec![
                "Use platform-appropriate features",
                "Use MemoryLink for offline development and tests",
            ],
        }
    }

    /// Returns the SDK error code when this error came from the native link.
    pub fn native_code(&self) -> Option<ErrorCode> {
        match self {
            FsuipcError::Native { code } => Some(*code),
            _ => None,
        }
    }

    /// Helper constructor for native link errors.
    pub fn native(code: ErrorCode) -> Self {
        FsuipcError::Native { code }
    }

    /// Helper constructor for data specification errors.
    pub fn specification(index: usize, reason: impl Into<String>) -> Self {
        FsuipcError::Specification { index, reason: reason.into() }
    }

    /// Helper constructor for value conversion errors.
    pub fn type_conversion(index: usize, details: impl Into<String>) -> Self {
        FsuipcError::TypeConversion { index, details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        FsuipcError::Config { path: path.into(), details: details.into() }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        FsuipcError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<ErrorCode> for FsuipcError {
    fn from(code: ErrorCode) -> Self {
        FsuipcError::Native { code }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn native_messages_carry_code_and_description(raw in 0u32..64u32) {
            let code = ErrorCode::from_raw(raw);
            let message = FsuipcError::native(code).to_string();

            let expected_prefix = format!("FSUIPC error: {} (", raw);
            prop_assert!(message.starts_with(&expected_prefix));
            prop_assert!(message.contains(code.description()));
        }

        #[test]
        fn specification_messages_carry_context(index in 0usize..256, reason in "[a-z ]+") {
            let message = FsuipcError::specification(index, reason.clone()).to_string();
            prop_assert!(message.contains(&index.to_string()));
            prop_assert!(message.contains(&reason));
        }
    }

    #[test]
    fn native_message_matches_sdk_format() {
        let error = FsuipcError::native(ErrorCode::NoFs);
        assert_eq!(error.to_string(), "FSUIPC error: 2 (Cannot link to FSUIPC or WideClient)");
        assert_eq!(error.native_code(), Some(ErrorCode::NoFs));
    }

    #[test]
    fn unknown_codes_use_fallback_description() {
        let error = FsuipcError::native(ErrorCode::from_raw(99));
        assert_eq!(error.to_string(), "FSUIPC error: 99 (Unknown error)");
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<FsuipcError>();

        let error = FsuipcError::WriteOnly;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn recovery_methods_work() {
        let timeout = FsuipcError::native(ErrorCode::Timeout);
        let mismatch = FsuipcError::LengthMismatch { expected: 3, found: 2 };

        assert!(timeout.is_retryable());
        assert!(!mismatch.is_retryable());
        assert!(!FsuipcError::native(ErrorCode::Version).is_retryable());

        for error in [timeout, mismatch, FsuipcError::WriteOnly] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }

    #[test]
    fn from_error_code_builds_native_error() {
        let error: FsuipcError = ErrorCode::Data.into();
        assert!(matches!(error, FsuipcError::Native { code: ErrorCode::Data }));
        assert_eq!(error.native_code().map(|c| c.raw()), Some(13));
    }
}
