//! # Clearance
//!
//! Client-side protocol engine for an e-invoicing clearance service.
//!
//! ## Overview
//!
//! Documents are submitted in sessions. Each session has its own AES-256
//! key; every document is encrypted with it and described by the size and
//! SHA-256 of both its plaintext and ciphertext. The service processes
//! documents asynchronously, so every submission hands back a reference
//! number that is polled until the document is accepted and durably stored,
//! or rejected.
//!
//! Permission grants and revocations follow the same pattern: the call
//! returns a reference number, and completion is awaited before anything
//! that depends on it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clearance::{ClearanceClient, ClientConfig};
//! use clearance::perms::MemoryPermissionRemote;
//! use clearance::session::MemorySubmissionRemote;
//!
//! async fn example() -> anyhow::Result<()> {
//!     clearance::telemetry::init()?;
//!
//!     let client = ClearanceClient::new(
//!         Arc::new(MemorySubmissionRemote::new()),
//!         Arc::new(MemoryPermissionRemote::new()),
//!         ClientConfig::from_env()?,
//!     );
//!
//!     let report = client.submit_batch(&[b"<Faktura/>".to_vec()]).await?;
//!     println!("{:?}: {} accepted", report.batch_status, report.accepted);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `clearance::core` - Crypto, content metadata, identifiers
//! - `clearance::track` - Operation tracking and polling policies
//! - `clearance::session` - Submission sessions
//! - `clearance::perms` - Permission operations

pub mod client;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export component crates
pub use clearance_core as core;
pub use clearance_perms as perms;
pub use clearance_session as session;
pub use clearance_track as track;

pub use client::ClearanceClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};

// Re-export commonly used types
pub use clearance_core::{
    ContentMetadata, CryptoCodec, EncryptionContext, FormCode, ReferenceNumber, SubjectIdentifier,
};
pub use clearance_perms::{GrantRequest, PermissionId, PermissionOperation, PermissionType};
pub use clearance_session::{
    BatchStatus, ItemState, SessionReport, SessionState, SubmissionItem, SubmissionSession,
};
pub use clearance_track::{OperationStatus, PollingPolicy, TrackState, Tracked};
