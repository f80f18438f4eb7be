//! Submission session state machine.
//!
//! ```text
//!   Opening ──open──> Open ──close──> Closing ──> Closed
//!      │                                  │
//!      └──────────── Failed <─────────────┘
//! ```
//!
//! Items are only accepted while `Open`. A failed item transmission marks
//! that item and leaves the session open. Items can be tracked in any state
//! once the session has a reference number; the session-level outcome can
//! only be awaited once `Closed`.
//!
//! Closing is a caller contract: every item intended for the batch must have
//! been submitted first. The service enforces this and reports a violation
//! as a transport error.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use clearance_core::{CryptoCodec, EncryptionContext, FormCode, ReferenceNumber};
use clearance_track::{AsyncOperationTracker, PollingPolicy, TrackError, TrackState, Tracked};

use crate::error::{Result, SessionError};
use crate::item::{EncryptedItem, ItemId, ItemState, SubmissionItem, SubmitOptions};
use crate::remote::SubmissionRemote;
use crate::report::SessionReport;
use crate::status::{ItemStatus, SessionStatus};

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Opening,
    Open,
    Closing,
    Closed,
    Failed,
}

/// Serializable snapshot of a session, for diagnostics.
///
/// Never contains key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub session_reference_number: Option<ReferenceNumber>,
    pub state: SessionState,
    pub form_code: FormCode,
    pub items: Vec<SubmissionItem>,
    pub last_status: Option<SessionStatus>,
    pub last_error: Option<String>,
}

impl SessionHandle {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

const ITEM_TRACKER: AsyncOperationTracker = AsyncOperationTracker::new("item");
const SESSION_TRACKER: AsyncOperationTracker = AsyncOperationTracker::new("session");

/// A batch submission channel.
///
/// Owns its [`EncryptionContext`]; the key is wiped when the session is
/// dropped.
pub struct SubmissionSession<R: SubmissionRemote> {
    remote: Arc<R>,
    codec: CryptoCodec,
    context: EncryptionContext,
    form_code: FormCode,
    reference: Option<ReferenceNumber>,
    state: SessionState,
    items: Vec<SubmissionItem>,
    next_local_id: u64,
    last_status: Option<SessionStatus>,
    session_outcome: Option<TrackState>,
    last_error: Option<String>,
}

impl<R: SubmissionRemote> SubmissionSession<R> {
    /// Create a session in `Opening` with the given context.
    pub fn new(remote: Arc<R>, form_code: FormCode, context: EncryptionContext) -> Self {
        Self {
            remote,
            codec: CryptoCodec::new(),
            context,
            form_code,
            reference: None,
            state: SessionState::Opening,
            items: Vec::new(),
            next_local_id: 1,
            last_status: None,
            session_outcome: None,
            last_error: None,
        }
    }

    /// Create a session in `Opening` with a freshly generated context.
    pub fn generate(remote: Arc<R>, form_code: FormCode) -> Result<Self> {
        let context = CryptoCodec::new().generate_context()?;
        Ok(Self::new(remote, form_code, context))
    }

    /// Create and open a session, generating a context when none is given.
    pub async fn open_with(
        remote: Arc<R>,
        form_code: FormCode,
        context: Option<EncryptionContext>,
    ) -> Result<Self> {
        let mut session = match context {
            Some(context) => Self::new(remote, form_code, context),
            None => Self::generate(remote, form_code)?,
        };
        session.open().await?;
        Ok(session)
    }

    /// Ask the remote to open the session.
    ///
    /// On failure the session moves to `Failed` and keeps the error.
    pub async fn open(&mut self) -> Result<&ReferenceNumber> {
        self.expect_state(SessionState::Opening)?;

        match self.remote.open_session(&self.form_code, &self.context).await {
            Ok(reference) => {
                tracing::info!(%reference, form = %self.form_code, "session opened");
                self.state = SessionState::Open;
                Ok(&*self.reference.insert(reference))
            }
            Err(e) => {
                tracing::warn!(error = %e, "session open failed");
                self.state = SessionState::Failed;
                self.last_error = Some(e.to_string());
                Err(SessionError::Open(e))
            }
        }
    }

    /// Encrypt and transmit one document.
    pub async fn submit_item(&mut self, plaintext: &[u8]) -> Result<SubmissionItem> {
        self.submit_item_with(plaintext, SubmitOptions::default())
            .await
    }

    /// Encrypt and transmit one document with explicit options.
    ///
    /// A transmission failure marks the item `TransmitFailed` and returns
    /// [`SessionError::ItemTransport`]; the session stays open.
    pub async fn submit_item_with(
        &mut self,
        plaintext: &[u8],
        options: SubmitOptions,
    ) -> Result<SubmissionItem> {
        self.expect_state(SessionState::Open)?;
        let session = self.session_reference()?.clone();

        let content = self.codec.encrypt(plaintext, &self.context)?;
        let encrypted = EncryptedItem {
            plaintext: self.codec.metadata_of(plaintext),
            ciphertext: self.codec.metadata_of(&content),
            content,
            offline_mode: options.offline_mode,
            hash_of_corrected: options.hash_of_corrected,
        };

        let local_id = ItemId(self.next_local_id);
        self.next_local_id += 1;
        let mut item = SubmissionItem::new(
            local_id,
            encrypted.plaintext,
            encrypted.ciphertext,
            options.offline_mode,
        );

        let sent = self.remote.send_item(&session, &encrypted).await;
        let outcome = match sent {
            Ok(reference) => {
                tracing::debug!(
                    %session,
                    item = %local_id,
                    %reference,
                    size = encrypted.plaintext.size_bytes,
                    hash = %encrypted.plaintext.hash_hex(),
                    "item submitted"
                );
                item.mark_submitted(reference);
                Ok(item.clone())
            }
            Err(source) => {
                tracing::warn!(%session, item = %local_id, error = %source, "item transmission failed");
                item.mark_transmit_failed(source.to_string());
                Err(SessionError::ItemTransport { local_id, source })
            }
        };
        self.items.push(item);
        outcome
    }

    /// Track one item until it is accepted, rejected, or the policy expires.
    ///
    /// Resolved items are returned unchanged. A `TimedOut` item is tracked
    /// again with the new policy.
    pub async fn await_item_outcome(
        &mut self,
        local_id: ItemId,
        policy: &PollingPolicy,
    ) -> Result<SubmissionItem> {
        let session = self.session_reference()?.clone();
        let index = self.index_of(local_id)?;

        let item = &self.items[index];
        if item.state.is_resolved() {
            return Ok(item.clone());
        }
        let item_reference = match (&item.reference_number, item.state.is_trackable()) {
            (Some(reference), true) => reference.clone(),
            _ => {
                return Err(SessionError::ItemNotSubmitted {
                    local_id,
                    state: item.state,
                })
            }
        };

        let tracked = track_item(self.remote.as_ref(), &session, &item_reference, policy).await;
        self.record(index, tracked)?;
        self.resolve_original_receipt(index).await;
        Ok(self.items[index].clone())
    }

    /// Track every submitted or timed-out item concurrently.
    ///
    /// All outcomes are recorded before the first tracking error, if any, is
    /// returned.
    pub async fn await_all_outcomes(&mut self, policy: &PollingPolicy) -> Result<Vec<SubmissionItem>> {
        let session = self.session_reference()?.clone();
        let remote = self.remote.as_ref();

        let pending: Vec<(usize, ReferenceNumber)> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.state.is_trackable())
            .filter_map(|(index, item)| item.reference_number.clone().map(|r| (index, r)))
            .collect();

        let results = join_all(pending.iter().map(|(index, reference)| {
            let session = &session;
            async move { (*index, track_item(remote, session, reference, policy).await) }
        }))
        .await;

        let mut first_error = None;
        for (index, tracked) in results {
            if let Err(e) = self.record(index, tracked) {
                first_error.get_or_insert(e);
            }
        }
        for (index, _) in &pending {
            self.resolve_original_receipt(*index).await;
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.items.clone()),
        }
    }

    /// Ask the remote to close the session.
    ///
    /// Legal only while `Open`. On failure the session moves to `Failed`.
    pub async fn close(&mut self) -> Result<()> {
        self.expect_state(SessionState::Open)?;
        let session = self.session_reference()?.clone();
        self.state = SessionState::Closing;

        match self.remote.close_session(&session).await {
            Ok(()) => {
                tracing::info!(%session, items = self.items.len(), "session closed");
                self.state = SessionState::Closed;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(%session, error = %e, "session close failed");
                self.state = SessionState::Failed;
                self.last_error = Some(e.to_string());
                Err(SessionError::Close(e))
            }
        }
    }

    /// Poll the session status until processed, then reconcile it with the
    /// item outcomes.
    pub async fn await_session_outcome(&mut self, policy: &PollingPolicy) -> Result<SessionReport> {
        self.expect_state(SessionState::Closed)?;
        let session = self.session_reference()?.clone();
        let remote = self.remote.as_ref();

        let tracked = SESSION_TRACKER
            .track(
                &session,
                policy,
                move |reference| async move { remote.session_status(&reference).await },
                SessionStatus::classify,
            )
            .await;

        match tracked {
            Ok(tracked) => {
                self.session_outcome = Some(tracked.state);
                if tracked.last_status.is_some() {
                    self.last_status = tracked.last_status;
                }
                let report = self.report();
                if !report.consistent {
                    tracing::warn!(%session, ?report, "session counts disagree with item outcomes");
                }
                Ok(report)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Reconcile the current item outcomes with the last session status.
    ///
    /// Available in every state, so a session whose tracking failed still
    /// yields its item outcomes together with the error.
    pub fn report(&self) -> SessionReport {
        SessionReport::reconcile(
            self.reference.clone(),
            self.state,
            self.session_outcome,
            &self.items,
            self.last_status.as_ref(),
        )
        .with_error(self.last_error.clone())
    }

    /// Serializable snapshot.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            session_reference_number: self.reference.clone(),
            state: self.state,
            form_code: self.form_code.clone(),
            items: self.items.clone(),
            last_status: self.last_status.clone(),
            last_error: self.last_error.clone(),
        }
    }

    pub fn reference(&self) -> Option<&ReferenceNumber> {
        self.reference.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn form_code(&self) -> &FormCode {
        &self.form_code
    }

    pub fn items(&self) -> &[SubmissionItem] {
        &self.items
    }

    pub fn item(&self, local_id: ItemId) -> Option<&SubmissionItem> {
        self.items.iter().find(|i| i.local_id == local_id)
    }

    pub fn last_status(&self) -> Option<&SessionStatus> {
        self.last_status.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The session's encryption context.
    pub fn context(&self) -> &EncryptionContext {
        &self.context
    }

    fn expect_state(&self, expected: SessionState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    fn session_reference(&self) -> Result<&ReferenceNumber> {
        self.reference.as_ref().ok_or(SessionError::InvalidState {
            expected: SessionState::Open,
            actual: self.state,
        })
    }

    fn index_of(&self, local_id: ItemId) -> Result<usize> {
        self.items
            .iter()
            .position(|i| i.local_id == local_id)
            .ok_or(SessionError::UnknownItem(local_id))
    }

    /// Fill in the receipt of the session holding a duplicate's original.
    ///
    /// Best effort: a failed lookup leaves the receipt unknown and the item
    /// outcome untouched.
    async fn resolve_original_receipt(&mut self, index: usize) {
        let item = &self.items[index];
        let original = match &item.duplicate_of {
            Some(original) if original.upo_reference.is_none() => {
                original.session_reference.clone()
            }
            _ => return,
        };
        let local_id = item.local_id;

        match self.remote.session_status(&original).await {
            Ok(status) => {
                tracing::debug!(
                    item = %local_id,
                    session = %original,
                    upo = ?status.upo_reference,
                    "original receipt looked up"
                );
                if let Some(duplicate_of) = self.items[index].duplicate_of.as_mut() {
                    duplicate_of.upo_reference = status.upo_reference;
                }
            }
            Err(e) => tracing::debug!(
                item = %local_id,
                session = %original,
                error = %e,
                "original receipt lookup failed"
            ),
        }
    }

    fn record(
        &mut self,
        index: usize,
        tracked: std::result::Result<Tracked<ItemStatus>, TrackError>,
    ) -> Result<()> {
        let item = &mut self.items[index];
        match tracked {
            Ok(tracked) => {
                item.apply(tracked);
                match item.state {
                    ItemState::Rejected => tracing::warn!(
                        item = %item.local_id,
                        code = item.last_status.as_ref().map(|s| s.status.code),
                        duplicate = item.duplicate_of.is_some(),
                        "item rejected"
                    ),
                    state => tracing::debug!(item = %item.local_id, ?state, "item tracked"),
                }
                Ok(())
            }
            Err(e) => {
                item.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

async fn track_item<R: SubmissionRemote + ?Sized>(
    remote: &R,
    session: &ReferenceNumber,
    item: &ReferenceNumber,
    policy: &PollingPolicy,
) -> std::result::Result<Tracked<ItemStatus>, TrackError> {
    ITEM_TRACKER
        .track(
            item,
            policy,
            move |reference| async move { remote.item_status(session, &reference).await },
            ItemStatus::classify,
        )
        .await
}
