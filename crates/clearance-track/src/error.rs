//! Error types for operation tracking.

use clearance_core::{ReferenceNumber, TransportError};
use thiserror::Error;

/// Errors that end tracking without a terminal state.
///
/// Business failures are not errors: they come back as
/// [`TrackState::Failed`](crate::TrackState::Failed) or
/// [`TrackState::TimedOut`](crate::TrackState::TimedOut).
#[derive(Debug, Error)]
pub enum TrackError {
    /// The status query failed twice in a row.
    #[error("tracking {reference}: status query failed after {attempts} polls: {source}")]
    Transport {
        reference: ReferenceNumber,
        attempts: u32,
        source: TransportError,
    },

    /// The polling policy cannot be honoured.
    #[error("invalid polling policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for tracking operations.
pub type Result<T> = std::result::Result<T, TrackError>;
