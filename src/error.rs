//! Codec error types

use thiserror::Error;

use crate::ofp_version::ProtocolVersion;

/// Errors raised while parsing, encoding or constructing actions and instructions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OfpError {
    /// Opcode not recognized for the version, or declared length too short.
    #[error("Header parse error at {position}: {reason}")]
    HeaderParse { position: usize, reason: String },

    /// Malformed payload.
    #[error("Decode error at {position}: {reason}")]
    Decode { position: usize, reason: String },

    /// A structure list did not end on its target offset.
    #[error("Structure list misaligned: target {target}, off by {delta}")]
    OffBy { target: usize, delta: i64 },

    /// Recognized element that needs a newer protocol version.
    #[error("Version mismatch: {what} requires {required}, got {actual}")]
    VersionMismatch {
        what: String,
        required: ProtocolVersion,
        actual: ProtocolVersion,
    },

    /// The version itself is not implemented by this codec.
    #[error("Protocol version {0:#04x} not supported")]
    VersionNotSupported(u8),

    /// Construction argument out of domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Action list builder already converted to an immutable instruction.
    #[error("Instruction already frozen: {0}")]
    Frozen(String),

    /// Mapping table gap; a defect rather than bad data.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OfpError {
    /// True for every error the parser raises on malformed input.
    pub fn is_decode_failure(&self) -> bool {
        match *self {
            OfpError::HeaderParse { .. } | OfpError::Decode { .. } | OfpError::OffBy { .. } => {
                true
            }
            _ => false,
        }
    }

    pub(crate) fn invalid<S: Into<String>>(msg: S) -> OfpError {
        OfpError::InvalidArgument(msg.into())
    }

    pub(crate) fn mismatch<S: Into<String>>(
        what: S,
        required: ProtocolVersion,
        actual: ProtocolVersion,
    ) -> OfpError {
        OfpError::VersionMismatch {
            what: what.into(),
            required,
            actual,
        }
    }
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, OfpError>;
