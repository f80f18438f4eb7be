//! # Clearance Session
//!
//! Batch submission sessions against the remote clearance service.
//!
//! A [`SubmissionSession`] opens a channel with its own encryption context,
//! encrypts and transmits documents, tracks each item until it is accepted
//! (and durably stored) or rejected, closes the channel, and reconciles the
//! session-level status with the item outcomes in a [`SessionReport`].
//!
//! ## Key Properties
//!
//! - **One key per session**: contexts are moved in and never shared
//! - **Item failures stay local**: a failed item never fails its session
//! - **Inspectable**: [`SessionHandle`] snapshots the full state as JSON
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clearance_core::FormCode;
//! use clearance_session::{MemorySubmissionRemote, SubmissionSession};
//! use clearance_track::PollingPolicy;
//!
//! async fn example() {
//!     let remote = Arc::new(MemorySubmissionRemote::new());
//!     let mut session = SubmissionSession::open_with(remote, FormCode::fa3(), None)
//!         .await
//!         .unwrap();
//!
//!     let item = session.submit_item(b"<Faktura/>").await.unwrap();
//!     let policy = PollingPolicy::default();
//!     session.await_item_outcome(item.local_id, &policy).await.unwrap();
//!
//!     session.close().await.unwrap();
//!     let report = session.await_session_outcome(&policy).await.unwrap();
//!     println!("{:?}", report.batch_status);
//! }
//! ```

pub mod error;
pub mod item;
pub mod remote;
pub mod report;
pub mod session;
pub mod status;

pub use error::{Result, SessionError};
pub use item::{EncryptedItem, ItemId, ItemState, SubmissionItem, SubmitOptions};
pub use remote::{memory::MemorySubmissionRemote, SubmissionRemote};
pub use report::{BatchStatus, SessionReport};
pub use session::{SessionHandle, SessionState, SubmissionSession};
pub use status::{
    DuplicateOf, ItemStatus, SessionStatus, DUPLICATE_CODE, ITEM_FAILURE_THRESHOLD,
    SESSION_FAILURE_THRESHOLD,
};
