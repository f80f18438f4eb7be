//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;
use std::time::Duration;

use clearance_core::{FormCode, SubjectIdentifier};
use clearance_perms::{GrantRequest, MemoryPermissionRemote, PermissionOperation, PermissionType};
use clearance_session::{MemorySubmissionRemote, SubmissionSession};
use clearance_track::PollingPolicy;

/// NIP of the seller used in sample documents.
pub const SELLER_NIP: &str = "5260250274";

/// A test fixture with in-memory submission and permission endpoints.
pub struct TestFixture {
    pub submissions: Arc<MemorySubmissionRemote>,
    pub permissions: Arc<MemoryPermissionRemote>,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Endpoints that accept everything on the first poll.
    pub fn new() -> Self {
        Self {
            submissions: Arc::new(MemorySubmissionRemote::new()),
            permissions: Arc::new(MemoryPermissionRemote::new()),
        }
    }

    /// Open a session for the default form code.
    pub async fn open_session(&self) -> SubmissionSession<MemorySubmissionRemote> {
        SubmissionSession::open_with(Arc::clone(&self.submissions), FormCode::fa3(), None)
            .await
            .unwrap_or_else(|e| panic!("fixture session failed to open: {e}"))
    }

    /// Permission operations on the fixture endpoint.
    pub fn permission_ops(&self) -> PermissionOperation<MemoryPermissionRemote> {
        PermissionOperation::new(Arc::clone(&self.permissions))
    }
}

/// A short policy for tests running on a paused clock.
pub fn fast_policy() -> PollingPolicy {
    PollingPolicy::new(Duration::from_secs(10), Duration::from_millis(500))
}

/// A minimal structured invoice document.
pub fn sample_invoice(seller_nip: &str, number: u32) -> Vec<u8> {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Faktura xmlns="http://crd.gov.pl/wzor/2025/06/25/13775/">"#,
            "<Naglowek><KodFormularza kodSystemowy=\"FA (3)\" wersjaSchemy=\"1-0E\">FA</KodFormularza></Naglowek>",
            "<Podmiot1><DaneIdentyfikacyjne><NIP>{nip}</NIP></DaneIdentyfikacyjne></Podmiot1>",
            "<Fa><P_2>FV/{number:05}</P_2><P_15>123.00</P_15></Fa>",
            "</Faktura>"
        ),
        nip = seller_nip,
        number = number,
    )
    .into_bytes()
}

/// `count` distinct sample invoices.
pub fn sample_batch(count: u32) -> Vec<Vec<u8>> {
    (1..=count).map(|n| sample_invoice(SELLER_NIP, n)).collect()
}

/// A grant of `permissions` to the given NIP.
pub fn grant_request(nip: &str, permissions: &[PermissionType]) -> GrantRequest {
    GrantRequest::new(SubjectIdentifier::nip(nip), "Granted by test fixture")
        .with_permissions(permissions.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clearance_session::ItemState;

    #[test]
    fn test_sample_invoices_differ() {
        let batch = sample_batch(3);
        assert_eq!(batch.len(), 3);
        assert_ne!(batch[0], batch[1]);
        assert!(String::from_utf8(batch[2].clone()).unwrap().contains("FV/00003"));
    }

    #[test]
    fn test_grant_request_is_valid() {
        let request = grant_request(SELLER_NIP, &[PermissionType::InvoiceRead]);
        assert!(request.validate().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixture_session_accepts_invoice() {
        let fixture = TestFixture::new();
        let mut session = fixture.open_session().await;
        let item = session
            .submit_item(&sample_invoice(SELLER_NIP, 1))
            .await
            .unwrap();
        let item = session
            .await_item_outcome(item.local_id, &fast_policy())
            .await
            .unwrap();
        assert_eq!(item.state, ItemState::Accepted);
    }
}
