//! Submitted items and their local bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt;

use clearance_core::{ContentMetadata, ReferenceNumber, Sha256Digest};
use clearance_track::{TrackState, Tracked};

use crate::status::{DuplicateOf, ItemStatus};

/// Local identifier of an item within its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of one item.
///
/// `Pending -> Submitted -> {Accepted, Rejected, TimedOut}`, or
/// `Pending -> TransmitFailed`. A `TimedOut` item can be tracked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    Pending,
    Submitted,
    Accepted,
    Rejected,
    TimedOut,
    TransmitFailed,
}

impl ItemState {
    /// Accepted or rejected; no further tracking changes it.
    pub fn is_resolved(self) -> bool {
        matches!(self, ItemState::Accepted | ItemState::Rejected)
    }

    /// Has a reference number and can be tracked.
    pub fn is_trackable(self) -> bool {
        matches!(self, ItemState::Submitted | ItemState::TimedOut)
    }
}

/// Options for one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitOptions {
    /// The document was issued while the service was unreachable.
    pub offline_mode: bool,
    /// Hash of the document being technically corrected.
    pub hash_of_corrected: Option<Sha256Digest>,
}

impl SubmitOptions {
    /// A technical correction of an offline document with the given hash.
    pub fn correction_of(original: Sha256Digest) -> Self {
        Self {
            offline_mode: true,
            hash_of_corrected: Some(original),
        }
    }
}

/// What is sent to the remote for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedItem {
    /// Metadata of the plaintext document.
    pub plaintext: ContentMetadata,
    /// Metadata of `content`.
    pub ciphertext: ContentMetadata,
    /// The encrypted document.
    pub content: Vec<u8>,
    pub offline_mode: bool,
    pub hash_of_corrected: Option<Sha256Digest>,
}

/// A document submitted through a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionItem {
    pub local_id: ItemId,
    /// Assigned by the remote once transmission succeeds.
    pub reference_number: Option<ReferenceNumber>,
    pub state: ItemState,
    pub plaintext: ContentMetadata,
    pub ciphertext: ContentMetadata,
    pub offline_mode: bool,
    /// Last status observed while tracking.
    pub last_status: Option<ItemStatus>,
    /// Set when the remote reports the document as a duplicate.
    pub duplicate_of: Option<DuplicateOf>,
    /// Most recent transport or tracking failure.
    pub last_error: Option<String>,
    /// Status queries issued across all tracking attempts.
    pub polls: u32,
}

impl SubmissionItem {
    pub(crate) fn new(
        local_id: ItemId,
        plaintext: ContentMetadata,
        ciphertext: ContentMetadata,
        offline_mode: bool,
    ) -> Self {
        Self {
            local_id,
            reference_number: None,
            state: ItemState::Pending,
            plaintext,
            ciphertext,
            offline_mode,
            last_status: None,
            duplicate_of: None,
            last_error: None,
            polls: 0,
        }
    }

    /// Clearance number, once accepted.
    pub fn ksef_number(&self) -> Option<&str> {
        self.last_status
            .as_ref()
            .and_then(|s| s.ksef_number.as_deref())
    }

    /// Record a successful transmission.
    pub(crate) fn mark_submitted(&mut self, reference: ReferenceNumber) {
        self.reference_number = Some(reference);
        self.state = ItemState::Submitted;
        self.last_error = None;
    }

    /// Record a failed transmission.
    pub(crate) fn mark_transmit_failed(&mut self, error: String) {
        self.state = ItemState::TransmitFailed;
        self.last_error = Some(error);
    }

    /// Fold a tracking outcome into the item.
    pub(crate) fn apply(&mut self, tracked: Tracked<ItemStatus>) {
        self.polls += tracked.polls;
        self.state = match tracked.state {
            TrackState::Succeeded => ItemState::Accepted,
            TrackState::Failed => ItemState::Rejected,
            TrackState::TimedOut => ItemState::TimedOut,
            TrackState::Pending => self.state,
        };
        if let Some(status) = tracked.last_status {
            if self.state == ItemState::Rejected {
                self.duplicate_of = status.duplicate.clone();
            }
            self.last_status = Some(status);
        }
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use clearance_core::CryptoCodec;
    use clearance_track::OperationStatus;
    use std::time::Duration;

    fn item() -> SubmissionItem {
        let codec = CryptoCodec::new();
        let mut item = SubmissionItem::new(
            ItemId(1),
            codec.metadata_of(b"plain"),
            codec.metadata_of(b"cipher"),
            false,
        );
        item.mark_submitted(ReferenceNumber::new("SES-1-0001"));
        item
    }

    fn tracked(state: TrackState, status: ItemStatus, polls: u32) -> Tracked<ItemStatus> {
        Tracked {
            reference: ReferenceNumber::new("SES-1-0001"),
            state,
            last_status: Some(status),
            polls,
            elapsed: Duration::from_secs(2),
        }
    }

    #[test]
    fn test_apply_accepted() {
        let mut item = item();
        item.apply(tracked(
            TrackState::Succeeded,
            ItemStatus::accepted("K-1", Utc::now()),
            2,
        ));
        assert_eq!(item.state, ItemState::Accepted);
        assert_eq!(item.ksef_number(), Some("K-1"));
        assert_eq!(item.polls, 2);
        assert!(item.duplicate_of.is_none());
    }

    #[test]
    fn test_apply_duplicate() {
        let mut item = item();
        let original = DuplicateOf {
            ksef_number: "K-0".into(),
            session_reference: ReferenceNumber::new("SES-0"),
            upo_reference: None,
        };
        item.apply(tracked(TrackState::Failed, ItemStatus::duplicate(original.clone()), 1));
        assert_eq!(item.state, ItemState::Rejected);
        assert_eq!(item.duplicate_of, Some(original));
    }

    #[test]
    fn test_timed_out_accumulates_polls() {
        let mut item = item();
        item.apply(tracked(TrackState::TimedOut, ItemStatus::processing(), 3));
        item.apply(tracked(
            TrackState::Succeeded,
            ItemStatus::from_status(OperationStatus::success()),
            2,
        ));
        assert_eq!(item.polls, 5);
        assert_eq!(item.state, ItemState::Accepted);
    }

    #[test]
    fn test_states() {
        assert!(ItemState::Accepted.is_resolved());
        assert!(!ItemState::TimedOut.is_resolved());
        assert!(ItemState::TimedOut.is_trackable());
        assert!(!ItemState::TransmitFailed.is_trackable());
        assert_eq!(ItemId(3).to_string(), "#3");
    }
}
