//! Remote permission endpoint abstraction.
//!
//! Implementations wrap the service's grant, revoke and operation-status
//! resources. HTTP details and authentication live in the implementation.

use async_trait::async_trait;

use clearance_core::{ReferenceNumber, TransportError};
use clearance_track::OperationStatus;

use crate::grant::{GrantRequest, PermissionId};

/// Remote permission endpoint.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PermissionRemote: Send + Sync {
    /// Request a grant. Returns the reference number of the asynchronous
    /// operation, not the permission itself.
    async fn grant(&self, request: &GrantRequest) -> Result<ReferenceNumber, TransportError>;

    /// Request revocation of an active permission.
    async fn revoke(&self, permission: &PermissionId) -> Result<ReferenceNumber, TransportError>;

    /// Status of a grant or revoke operation.
    async fn operation_status(
        &self,
        reference: &ReferenceNumber,
    ) -> Result<OperationStatus, TransportError>;
}

/// A scripted in-memory permission endpoint for testing.
///
/// Reference numbers are issued as `REF-1`, `REF-2`, ... in call order.
/// Status queries replay the script registered for a reference and then
/// repeat the default status (success unless changed).
pub mod memory {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Mutex;

    type Step = Result<OperationStatus, TransportError>;

    #[derive(Debug, Default)]
    struct State {
        issued: u64,
        grants: Vec<(ReferenceNumber, GrantRequest)>,
        revocations: Vec<(ReferenceNumber, PermissionId)>,
        scripts: HashMap<ReferenceNumber, VecDeque<Step>>,
        status_calls: HashMap<ReferenceNumber, u32>,
        fail_next_request: Option<TransportError>,
    }

    /// In-memory permission endpoint.
    #[derive(Debug)]
    pub struct MemoryPermissionRemote {
        state: Mutex<State>,
        default_status: OperationStatus,
    }

    impl Default for MemoryPermissionRemote {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MemoryPermissionRemote {
        /// Every operation succeeds on its first status query.
        pub fn new() -> Self {
            Self {
                state: Mutex::new(State::default()),
                default_status: OperationStatus::success(),
            }
        }

        /// Status returned once a reference's script is exhausted.
        pub fn with_default_status(mut self, status: OperationStatus) -> Self {
            self.default_status = status;
            self
        }

        /// Queue responses for status queries on `reference`.
        pub async fn script(&self, reference: impl Into<ReferenceNumber>, steps: Vec<Step>) {
            self.state
                .lock()
                .await
                .scripts
                .entry(reference.into())
                .or_default()
                .extend(steps);
        }

        /// Make the next grant or revoke call fail.
        pub async fn fail_next_request(&self, error: TransportError) {
            self.state.lock().await.fail_next_request = Some(error);
        }

        /// Grants received, in call order.
        pub async fn grants(&self) -> Vec<(ReferenceNumber, GrantRequest)> {
            self.state.lock().await.grants.clone()
        }

        /// Revocations received, in call order.
        pub async fn revocations(&self) -> Vec<(ReferenceNumber, PermissionId)> {
            self.state.lock().await.revocations.clone()
        }

        /// Number of status queries made for `reference`.
        pub async fn status_calls(&self, reference: &ReferenceNumber) -> u32 {
            self.state
                .lock()
                .await
                .status_calls
                .get(reference)
                .copied()
                .unwrap_or(0)
        }

        fn issue(state: &mut State) -> Result<ReferenceNumber, TransportError> {
            if let Some(error) = state.fail_next_request.take() {
                return Err(error);
            }
            state.issued += 1;
            Ok(ReferenceNumber::new(format!("REF-{}", state.issued)))
        }
    }

    #[async_trait]
    impl PermissionRemote for MemoryPermissionRemote {
        async fn grant(&self, request: &GrantRequest) -> Result<ReferenceNumber, TransportError> {
            let mut state = self.state.lock().await;
            let reference = Self::issue(&mut state)?;
            state.grants.push((reference.clone(), request.clone()));
            Ok(reference)
        }

        async fn revoke(&self, permission: &PermissionId) -> Result<ReferenceNumber, TransportError> {
            let mut state = self.state.lock().await;
            let reference = Self::issue(&mut state)?;
            state.revocations.push((reference.clone(), permission.clone()));
            Ok(reference)
        }

        async fn operation_status(
            &self,
            reference: &ReferenceNumber,
        ) -> Result<OperationStatus, TransportError> {
            let mut state = self.state.lock().await;
            *state.status_calls.entry(reference.clone()).or_default() += 1;
            state
                .scripts
                .get_mut(reference)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Ok(self.default_status.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryPermissionRemote;
    use super::*;
    use clearance_core::SubjectIdentifier;

    use crate::grant::PermissionType;

    fn request() -> GrantRequest {
        GrantRequest::new(SubjectIdentifier::nip("5260250274"), "Accounting office")
            .with_permission(PermissionType::InvoiceRead)
    }

    #[tokio::test]
    async fn test_references_issued_in_order() {
        let remote = MemoryPermissionRemote::new();
        let first = remote.grant(&request()).await.unwrap();
        let second = remote.revoke(&PermissionId::new("perm-1")).await.unwrap();

        assert_eq!(first.as_str(), "REF-1");
        assert_eq!(second.as_str(), "REF-2");
        assert_eq!(remote.grants().await.len(), 1);
        assert_eq!(remote.revocations().await[0].1.as_str(), "perm-1");
    }

    #[tokio::test]
    async fn test_script_then_default() {
        let remote = MemoryPermissionRemote::new();
        let reference = ReferenceNumber::new("REF-1");
        remote
            .script("REF-1", vec![Ok(OperationStatus::new(500, "error"))])
            .await;

        assert_eq!(remote.operation_status(&reference).await.unwrap().code, 500);
        assert_eq!(remote.operation_status(&reference).await.unwrap().code, 200);
        assert_eq!(remote.status_calls(&reference).await, 2);
    }

    #[tokio::test]
    async fn test_fail_next_request() {
        let remote = MemoryPermissionRemote::new();
        remote.fail_next_request(TransportError::http(401, "unauthorized")).await;

        assert!(remote.grant(&request()).await.is_err());
        assert!(remote.grants().await.is_empty());
        assert_eq!(remote.grant(&request()).await.unwrap().as_str(), "REF-1");
    }
}
