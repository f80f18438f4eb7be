//! # Clearance Perms
//!
//! Permission grant and revoke workflows.
//!
//! Both operations are asynchronous on the remote side: the call returns a
//! reference number, and the caller awaits completion through
//! [`PermissionOperation::await_completion`] before issuing anything that
//! depends on the new permission.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clearance_core::SubjectIdentifier;
//! use clearance_perms::{GrantRequest, MemoryPermissionRemote, PermissionOperation, PermissionType};
//! use clearance_track::PollingPolicy;
//!
//! async fn example() {
//!     let ops = PermissionOperation::new(Arc::new(MemoryPermissionRemote::new()));
//!
//!     let request = GrantRequest::new(SubjectIdentifier::nip("5260250274"), "Accounting office")
//!         .with_permission(PermissionType::CredentialsManage);
//!
//!     // The manager's grant must complete before they grant anything.
//!     let tracked = ops
//!         .grant_and_wait(&request, &PollingPolicy::from_secs_and_millis(15, 1_000))
//!         .await
//!         .unwrap();
//!     assert!(tracked.is_succeeded());
//! }
//! ```

pub mod error;
pub mod grant;
pub mod operation;
pub mod remote;

pub use error::{PermsError, Result};
pub use grant::{
    GrantRequest, PermissionId, PermissionType, PersonDetails, MAX_DESCRIPTION_LEN,
    MIN_DESCRIPTION_LEN,
};
pub use operation::PermissionOperation;
pub use remote::{memory::MemoryPermissionRemote, PermissionRemote};
