//! Error types for submission sessions.

use thiserror::Error;

use clearance_core::{CryptoError, TransportError};
use clearance_track::TrackError;

use crate::item::{ItemId, ItemState};
use crate::session::SessionState;

/// Errors that can occur during a submission session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The remote refused to open the session.
    #[error("failed to open session: {0}")]
    Open(#[source] TransportError),

    /// The operation is not legal in the session's current state.
    #[error("invalid session state: expected {expected:?}, found {actual:?}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    /// Local encryption failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Status polling failed.
    #[error("tracking error: {0}")]
    Tracking(#[from] TrackError),

    /// The remote refused to close the session.
    #[error("failed to close session: {0}")]
    Close(#[source] TransportError),

    /// Transmission of one item failed. The session stays open.
    #[error("item {local_id} transmission failed: {source}")]
    ItemTransport {
        local_id: ItemId,
        source: TransportError,
    },

    /// No item with this id exists in the session.
    #[error("unknown item: {0}")]
    UnknownItem(ItemId),

    /// The item has no reference number to track.
    #[error("item {local_id} was never submitted (state {state:?})")]
    ItemNotSubmitted { local_id: ItemId, state: ItemState },
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
