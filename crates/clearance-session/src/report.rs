//! Reconciliation of item outcomes with the session-level status.

use serde::{Deserialize, Serialize};

use clearance_core::ReferenceNumber;
use clearance_track::TrackState;

use crate::item::{ItemState, SubmissionItem};
use crate::session::SessionState;
use crate::status::SessionStatus;

/// Overall outcome of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    /// No items were submitted.
    Empty,
    AllAccepted,
    /// Every item resolved, some accepted and some rejected.
    PartiallyAccepted,
    AllRejected,
    /// At least one item timed out, failed to transmit, or was never tracked.
    Incomplete,
}

/// Summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_reference: Option<ReferenceNumber>,
    pub session_state: SessionState,
    /// Outcome of session-level tracking, if it was awaited.
    pub session_outcome: Option<TrackState>,
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Rejected items that duplicate an earlier document.
    pub duplicates: usize,
    pub timed_out: usize,
    pub transmit_failed: usize,
    /// Submitted but never tracked to a terminal state.
    pub unresolved: usize,
    pub batch_status: BatchStatus,
    /// False when the remote's counts disagree with the local outcomes.
    pub consistent: bool,
    pub upo_reference: Option<String>,
    /// Most recent session-level failure, e.g. session status that could not
    /// be queried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SessionReport {
    /// Build a report from the session's items and last known status.
    pub fn reconcile(
        session_reference: Option<ReferenceNumber>,
        session_state: SessionState,
        session_outcome: Option<TrackState>,
        items: &[SubmissionItem],
        status: Option<&SessionStatus>,
    ) -> Self {
        let count = |state: ItemState| items.iter().filter(|i| i.state == state).count();

        let total = items.len();
        let accepted = count(ItemState::Accepted);
        let rejected = count(ItemState::Rejected);
        let timed_out = count(ItemState::TimedOut);
        let transmit_failed = count(ItemState::TransmitFailed);
        let unresolved = count(ItemState::Pending) + count(ItemState::Submitted);
        let duplicates = items
            .iter()
            .filter(|i| i.state == ItemState::Rejected && i.duplicate_of.is_some())
            .count();

        let batch_status = if total == 0 {
            BatchStatus::Empty
        } else if accepted + rejected < total {
            BatchStatus::Incomplete
        } else if accepted == total {
            BatchStatus::AllAccepted
        } else if rejected == total {
            BatchStatus::AllRejected
        } else {
            BatchStatus::PartiallyAccepted
        };

        let consistent = status.map_or(true, |s| {
            let agrees = |remote: Option<u32>, local: usize| {
                remote.map_or(true, |n| n as usize == local)
            };
            agrees(s.successful_invoice_count, accepted) && agrees(s.failed_invoice_count, rejected)
        });

        Self {
            session_reference,
            session_state,
            session_outcome,
            total,
            accepted,
            rejected,
            duplicates,
            timed_out,
            transmit_failed,
            unresolved,
            batch_status,
            consistent,
            upo_reference: status.and_then(|s| s.upo_reference.clone()),
            last_error: None,
        }
    }

    /// Attach the most recent session-level failure.
    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.last_error = error;
        self
    }

    /// Every item accepted and the session processed successfully.
    pub fn is_success(&self) -> bool {
        self.batch_status == BatchStatus::AllAccepted
            && self.session_outcome == Some(TrackState::Succeeded)
            && self.consistent
    }
}
