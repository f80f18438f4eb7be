//! Error types for the permissions module.

use thiserror::Error;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// The request failed local validation and was not sent.
    #[error("invalid grant request: {0}")]
    InvalidGrant(String),

    /// The grant or revoke call itself failed.
    #[error("permission request failed: {0}")]
    Transport(#[from] clearance_core::TransportError),

    /// Awaiting completion failed.
    #[error("tracking error: {0}")]
    Tracking(#[from] clearance_track::TrackError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
