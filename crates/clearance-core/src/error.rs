//! Error types for the clearance core.

use thiserror::Error;

/// Local cryptographic failures. Never retried.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The randomness source could not produce key material.
    #[error("crypto init error: {0}")]
    Init(String),

    /// Encryption or decryption could not be performed (bad key/IV length,
    /// bad padding).
    #[error("crypto operation error: {0}")]
    Operation(String),
}

/// Identifier validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("{kind} must be {expected} characters, got {got}")]
    InvalidLength {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{kind} contains invalid characters")]
    InvalidCharacters { kind: &'static str },

    #[error("{kind} checksum mismatch")]
    ChecksumMismatch { kind: &'static str },

    #[error("malformed {kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

/// Failure reported by a remote collaborator (HTTP, serialization, network).
///
/// The core never inspects the cause beyond logging it; `http_status` is kept
/// for diagnostics only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("transport error{}: {message}", .http_status.map(|s| format!(" (http {s})")).unwrap_or_default())]
pub struct TransportError {
    /// Human-readable description.
    pub message: String,
    /// HTTP status returned by the service, when there was one.
    pub http_status: Option<u16>,
}

impl TransportError {
    /// A transport error without an HTTP status (connection reset, timeout).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: None,
        }
    }

    /// A transport error carrying the HTTP status returned by the service.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            http_status: Some(status),
        }
    }
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
