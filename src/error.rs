//! # Error Types
//!
//! This module defines the error types used throughout the blepos library.
//!
//! Every variant names the stage that failed, so a caller can tell whether
//! the printer may already have produced output:
//!
//! | Variant | Stage | Output possible? |
//! |---------|-------|------------------|
//! | `TransportUnavailable` | scan | no |
//! | `ConnectionFailed` | connect | no |
//! | `EnumerationFailed` | enumerate | no |
//! | `NoWritableEndpoint` | enumerate | no (soft outcome) |
//! | `WriteFailed` | write | yes, partially |
//! | `FinalizeFailed` | finalize | yes, likely all of it |

use thiserror::Error;

use crate::transport::{EndpointHandle, RadioError};

/// Main error type for blepos operations
#[derive(Debug, Error)]
pub enum BlePosError {
    /// The Bluetooth adapter is missing or the scan could not run
    #[error("Bluetooth transport unavailable: {0}")]
    TransportUnavailable(#[source] RadioError),

    /// Could not reach the peripheral
    #[error("Failed to connect to {address}: {source}")]
    ConnectionFailed {
        address: String,
        #[source]
        source: RadioError,
    },

    /// The radio stack failed while listing characteristics
    #[error("Failed to enumerate characteristics of {address}: {source}")]
    EnumerationFailed {
        address: String,
        #[source]
        source: RadioError,
    },

    /// No characteristic accepts writes. This is a valid negative result of
    /// the search, not a transport fault.
    #[error("No writable characteristic found on {address}")]
    NoWritableEndpoint { address: String },

    /// Transport error mid-job. Part of the job may already be on paper.
    #[error("Write to handle {handle} failed after {frames_sent} frame(s), {bytes_sent} byte(s): {source}")]
    WriteFailed {
        handle: EndpointHandle,
        frames_sent: usize,
        bytes_sent: usize,
        #[source]
        source: RadioError,
    },

    /// The flush/close step failed after all data was sent
    #[error("Finalize on handle {handle} failed: {source}")]
    FinalizeFailed {
        handle: EndpointHandle,
        #[source]
        source: RadioError,
    },

    /// The print job could not be encoded
    #[error("Invalid print job: {0}")]
    InvalidJob(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Print job file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The step of an operation an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scan,
    Connect,
    Enumerate,
    Write,
    Finalize,
    Job,
}

impl BlePosError {
    /// Stage that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Self::TransportUnavailable(_) => Stage::Scan,
            Self::ConnectionFailed { .. } => Stage::Connect,
            Self::EnumerationFailed { .. } | Self::NoWritableEndpoint { .. } => Stage::Enumerate,
            Self::WriteFailed { .. } => Stage::Write,
            Self::FinalizeFailed { .. } => Stage::Finalize,
            Self::InvalidJob(_) | Self::Io(_) | Self::Json(_) => Stage::Job,
        }
    }

    /// `true` only for [`BlePosError::NoWritableEndpoint`].
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::NoWritableEndpoint { .. })
    }

    /// Whether the printer may have physically printed something before the
    /// failure.
    pub fn output_may_have_occurred(&self) -> bool {
        matches!(self.stage(), Stage::Write | Stage::Finalize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_no_writable_endpoint_is_soft() {
        let soft = BlePosError::NoWritableEndpoint {
            address: "AA:BB".into(),
        };
        let hard = BlePosError::EnumerationFailed {
            address: "AA:BB".into(),
            source: RadioError::Backend("gatt".into()),
        };
        assert!(soft.is_soft());
        assert!(!hard.is_soft());
        assert_eq!(soft.stage(), hard.stage());
    }

    #[test]
    fn test_output_may_have_occurred() {
        let write = BlePosError::WriteFailed {
            handle: EndpointHandle(3),
            frames_sent: 1,
            bytes_sent: 10,
            source: RadioError::Backend("link lost".into()),
        };
        let connect = BlePosError::ConnectionFailed {
            address: "AA:BB".into(),
            source: RadioError::NotFound("AA:BB".into()),
        };
        assert!(write.output_may_have_occurred());
        assert!(!connect.output_may_have_occurred());
    }

    #[test]
    fn test_messages_name_the_stage() {
        let err = BlePosError::FinalizeFailed {
            handle: EndpointHandle(7),
            source: RadioError::Backend("timeout".into()),
        };
        assert_eq!(err.to_string(), "Finalize on handle 7 failed: timeout");
    }
}
