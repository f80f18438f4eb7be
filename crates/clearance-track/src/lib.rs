//! # Clearance Track
//!
//! Bounded polling of asynchronous operations on the remote clearance
//! service.
//!
//! Every long-running remote operation (document processing, session
//! processing, permission grants and revocations) hands back a reference
//! number. [`AsyncOperationTracker`] polls its status until a caller-supplied
//! classifier reports a terminal verdict or the [`PollingPolicy`] expires.
//!
//! ## Key Properties
//!
//! - **Caller-classified**: the tracker never hardcodes failure codes
//! - **Timeouts are data**: an expired policy yields [`TrackState::TimedOut`]
//! - **One retry**: a failed status query is retried once, then surfaced
//! - **No background work**: dropping the future abandons tracking
//!
//! ## Usage
//!
//! ```rust,no_run
//! use clearance_core::{ReferenceNumber, TransportError};
//! use clearance_track::{AsyncOperationTracker, OperationStatus, PollingPolicy};
//!
//! async fn example() {
//!     let tracker = AsyncOperationTracker::new("grant");
//!     let reference = ReferenceNumber::new("REF-1");
//!
//!     let tracked = tracker
//!         .track_status(&reference, &PollingPolicy::default(), |_reference| async {
//!             Ok::<_, TransportError>(OperationStatus::success())
//!         })
//!         .await
//!         .unwrap();
//!     assert!(tracked.is_succeeded());
//! }
//! ```

pub mod error;
pub mod policy;
pub mod status;
pub mod tracker;

pub use error::{Result, TrackError};
pub use policy::PollingPolicy;
pub use status::{OperationStatus, SUCCESS_CODE};
pub use tracker::{AsyncOperationTracker, TrackState, Tracked, Verdict, TRANSPORT_RETRIES};
