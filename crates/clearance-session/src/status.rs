//! Item and session status as reported by the remote service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clearance_core::ReferenceNumber;
use clearance_track::{OperationStatus, Verdict};

/// Code reported for a document that was already cleared.
pub const DUPLICATE_CODE: i32 = 440;

/// Item codes at or above this value are terminal failures.
pub const ITEM_FAILURE_THRESHOLD: i32 = 300;

/// Session codes at or above this value are terminal failures.
pub const SESSION_FAILURE_THRESHOLD: i32 = 400;

/// Where the original of a duplicate document was cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateOf {
    /// Clearance number assigned to the original document.
    pub ksef_number: String,
    /// Session in which the original was submitted.
    pub session_reference: ReferenceNumber,
    /// Collective receipt of that session, once looked up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upo_reference: Option<String>,
}

/// Processing status of one submitted item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatus {
    pub status: OperationStatus,
    /// Clearance number, assigned on acceptance.
    pub ksef_number: Option<String>,
    /// The document's own number, as read by the service.
    pub invoice_number: Option<String>,
    pub acquisition_date: Option<DateTime<Utc>>,
    /// Set once the document has been durably stored.
    pub permanent_storage_date: Option<DateTime<Utc>>,
    pub upo_download_url: Option<String>,
    /// Present with code 440.
    pub duplicate: Option<DuplicateOf>,
}

impl ItemStatus {
    /// A status with no item details.
    pub fn from_status(status: OperationStatus) -> Self {
        Self {
            status,
            ksef_number: None,
            invoice_number: None,
            acquisition_date: None,
            permanent_storage_date: None,
            upo_download_url: None,
            duplicate: None,
        }
    }

    /// Still being processed.
    pub fn processing() -> Self {
        Self::from_status(OperationStatus::in_progress())
    }

    /// Accepted with a clearance number but not yet durably stored.
    pub fn accepted_unstored(ksef_number: impl Into<String>, acquired: DateTime<Utc>) -> Self {
        Self {
            ksef_number: Some(ksef_number.into()),
            acquisition_date: Some(acquired),
            ..Self::from_status(OperationStatus::success())
        }
    }

    /// Accepted and durably stored.
    pub fn accepted(ksef_number: impl Into<String>, stored: DateTime<Utc>) -> Self {
        Self {
            permanent_storage_date: Some(stored),
            ..Self::accepted_unstored(ksef_number, stored)
        }
    }

    /// Rejected as a duplicate of an earlier document.
    pub fn duplicate(original: DuplicateOf) -> Self {
        Self {
            duplicate: Some(original),
            ..Self::from_status(OperationStatus::new(DUPLICATE_CODE, "Duplicate invoice"))
        }
    }

    /// Rejected with the given code.
    pub fn rejected(code: i32, description: impl Into<String>) -> Self {
        Self::from_status(OperationStatus::new(code, description))
    }

    pub fn is_duplicate(&self) -> bool {
        self.status.code == DUPLICATE_CODE
    }

    /// An item succeeds only once it is both accepted and durably stored.
    pub fn classify(&self) -> Verdict {
        if self.status.is_success() && self.permanent_storage_date.is_some() {
            Verdict::Succeeded
        } else if self.status.code >= ITEM_FAILURE_THRESHOLD {
            Verdict::Failed
        } else {
            Verdict::Pending
        }
    }
}

/// Processing status of a whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub status: OperationStatus,
    pub invoice_count: Option<u32>,
    pub successful_invoice_count: Option<u32>,
    pub failed_invoice_count: Option<u32>,
    /// Reference of the collective acknowledgement, once issued.
    pub upo_reference: Option<String>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl SessionStatus {
    /// A status with no counts.
    pub fn from_status(status: OperationStatus) -> Self {
        Self {
            status,
            invoice_count: None,
            successful_invoice_count: None,
            failed_invoice_count: None,
            upo_reference: None,
            valid_until: None,
        }
    }

    /// Attach item counts.
    pub fn with_counts(mut self, total: u32, successful: u32, failed: u32) -> Self {
        self.invoice_count = Some(total);
        self.successful_invoice_count = Some(successful);
        self.failed_invoice_count = Some(failed);
        self
    }

    /// Success code succeeds; codes at or above 400 fail.
    pub fn classify(&self) -> Verdict {
        Verdict::failing_from(&self.status, SESSION_FAILURE_THRESHOLD)
    }
}
