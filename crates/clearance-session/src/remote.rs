//! Remote submission endpoint abstraction.
//!
//! Implementations wrap the service's session resources: open, send, item
//! status, close and session status. Wrapping the session key for the
//! service, HTTP details and authentication live in the implementation.

use async_trait::async_trait;

use clearance_core::{EncryptionContext, FormCode, ReferenceNumber, TransportError};

use crate::item::EncryptedItem;
use crate::status::{ItemStatus, SessionStatus};

/// Remote submission endpoint.
///
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SubmissionRemote: Send + Sync {
    /// Open a session for documents of `form_code`, encrypted with `context`.
    async fn open_session(
        &self,
        form_code: &FormCode,
        context: &EncryptionContext,
    ) -> Result<ReferenceNumber, TransportError>;

    /// Transmit one encrypted item. Returns the item's reference number.
    async fn send_item(
        &self,
        session: &ReferenceNumber,
        item: &EncryptedItem,
    ) -> Result<ReferenceNumber, TransportError>;

    /// Processing status of one item.
    async fn item_status(
        &self,
        session: &ReferenceNumber,
        item: &ReferenceNumber,
    ) -> Result<ItemStatus, TransportError>;

    /// Close the session. No items can be sent afterwards.
    async fn close_session(&self, session: &ReferenceNumber) -> Result<(), TransportError>;

    /// Processing status of the whole session.
    async fn session_status(&self, session: &ReferenceNumber)
        -> Result<SessionStatus, TransportError>;
}

/// An in-memory submission endpoint for testing.
///
/// Behaves like the service on the happy path: it decrypts every item with
/// the session key, checks both hashes and sizes, rejects documents it has
/// already accepted with code 440, and reports session counts derived from
/// the item outcomes. Status queries first replay any scripted steps.
pub mod memory {
    use super::*;
    use chrono::Utc;
    use clearance_core::{CryptoCodec, Sha256Digest};
    use clearance_track::OperationStatus;
    use std::collections::{HashMap, VecDeque};
    use tokio::sync::Mutex;

    use crate::status::DuplicateOf;

    type ItemStep = Result<ItemStatus, TransportError>;
    type SessionStep = Result<SessionStatus, TransportError>;

    #[derive(Debug)]
    struct StoredItem {
        reference: ReferenceNumber,
        received: EncryptedItem,
        outcome: ItemStatus,
        script: VecDeque<ItemStep>,
    }

    #[derive(Debug)]
    struct StoredSession {
        context: EncryptionContext,
        form_code: FormCode,
        closed: bool,
        items: Vec<StoredItem>,
    }

    #[derive(Debug, Default)]
    struct State {
        opened: u64,
        sessions: HashMap<ReferenceNumber, StoredSession>,
        accepted: HashMap<Sha256Digest, DuplicateOf>,
        next_item_scripts: VecDeque<Vec<ItemStep>>,
        session_scripts: HashMap<ReferenceNumber, VecDeque<SessionStep>>,
        key_fingerprints: Vec<Sha256Digest>,
        item_status_calls: u32,
        fail_next_open: Option<TransportError>,
        fail_next_send: Option<TransportError>,
        fail_next_close: Option<TransportError>,
    }

    /// In-memory submission endpoint.
    #[derive(Debug, Default)]
    pub struct MemorySubmissionRemote {
        state: Mutex<State>,
    }

    impl MemorySubmissionRemote {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue status steps for the next item sent, in send order.
        pub async fn script_next_item(&self, steps: Vec<ItemStep>) {
            self.state.lock().await.next_item_scripts.push_back(steps);
        }

        /// Queue session status steps for `session`.
        pub async fn script_session(
            &self,
            session: impl Into<ReferenceNumber>,
            steps: Vec<SessionStep>,
        ) {
            self.state
                .lock()
                .await
                .session_scripts
                .entry(session.into())
                .or_default()
                .extend(steps);
        }

        pub async fn fail_next_open(&self, error: TransportError) {
            self.state.lock().await.fail_next_open = Some(error);
        }

        pub async fn fail_next_send(&self, error: TransportError) {
            self.state.lock().await.fail_next_send = Some(error);
        }

        pub async fn fail_next_close(&self, error: TransportError) {
            self.state.lock().await.fail_next_close = Some(error);
        }

        /// Items received for `session`, in send order.
        pub async fn received(&self, session: &ReferenceNumber) -> Vec<EncryptedItem> {
            self.state
                .lock()
                .await
                .sessions
                .get(session)
                .map(|s| s.items.iter().map(|i| i.received.clone()).collect())
                .unwrap_or_default()
        }

        /// Form code a session was opened with.
        pub async fn form_code(&self, session: &ReferenceNumber) -> Option<FormCode> {
            self.state
                .lock()
                .await
                .sessions
                .get(session)
                .map(|s| s.form_code.clone())
        }

        pub async fn is_closed(&self, session: &ReferenceNumber) -> bool {
            self.state
                .lock()
                .await
                .sessions
                .get(session)
                .map_or(false, |s| s.closed)
        }

        /// SHA-256 of every session key received, in open order.
        pub async fn key_fingerprints(&self) -> Vec<Sha256Digest> {
            self.state.lock().await.key_fingerprints.clone()
        }

        /// Total item status queries served.
        pub async fn item_status_calls(&self) -> u32 {
            self.state.lock().await.item_status_calls
        }

        fn judge(
            state: &mut State,
            session: &ReferenceNumber,
            context: &EncryptionContext,
            item: &EncryptedItem,
        ) -> ItemStatus {
            let codec = CryptoCodec::new();
            let intact = codec.metadata_of(&item.content) == item.ciphertext
                && codec
                    .decrypt(&item.content, context)
                    .map(|plain| codec.metadata_of(&plain) == item.plaintext)
                    .unwrap_or(false);
            if !intact {
                return ItemStatus::rejected(450, "Invalid document: hash or size mismatch");
            }

            let hash = item.plaintext.content_hash;
            if let Some(original) = state.accepted.get(&hash) {
                return ItemStatus::duplicate(original.clone());
            }

            let ksef_number = format!(
                "5260250274-{}-{}",
                Utc::now().format("%Y%m%d"),
                &hash.to_hex()[..10].to_uppercase()
            );
            state.accepted.insert(
                hash,
                DuplicateOf {
                    ksef_number: ksef_number.clone(),
                    session_reference: session.clone(),
                    upo_reference: None,
                },
            );
            ItemStatus::accepted(ksef_number, Utc::now())
        }
    }

    fn not_found(session: &ReferenceNumber) -> TransportError {
        TransportError::http(404, format!("session {session} not found"))
    }

    #[async_trait]
    impl SubmissionRemote for MemorySubmissionRemote {
        async fn open_session(
            &self,
            form_code: &FormCode,
            context: &EncryptionContext,
        ) -> Result<ReferenceNumber, TransportError> {
            let mut state = self.state.lock().await;
            if let Some(error) = state.fail_next_open.take() {
                return Err(error);
            }
            state.opened += 1;
            let reference = ReferenceNumber::new(format!("SES-{}", state.opened));
            state.key_fingerprints.push(Sha256Digest::hash(context.key()));
            state.sessions.insert(
                reference.clone(),
                StoredSession {
                    context: EncryptionContext::from_parts(*context.key(), *context.iv()),
                    form_code: form_code.clone(),
                    closed: false,
                    items: Vec::new(),
                },
            );
            Ok(reference)
        }

        async fn send_item(
            &self,
            session: &ReferenceNumber,
            item: &EncryptedItem,
        ) -> Result<ReferenceNumber, TransportError> {
            let mut state = self.state.lock().await;
            if let Some(error) = state.fail_next_send.take() {
                return Err(error);
            }
            let stored = state.sessions.get(session).ok_or_else(|| not_found(session))?;
            if stored.closed {
                return Err(TransportError::http(400, format!("session {session} is closed")));
            }
            let context = EncryptionContext::from_parts(*stored.context.key(), *stored.context.iv());
            let index = stored.items.len() + 1;

            let outcome = Self::judge(&mut state, session, &context, item);
            let script = state.next_item_scripts.pop_front().unwrap_or_default();
            let reference = ReferenceNumber::new(format!("{session}-{index:04}"));

            let stored = state.sessions.get_mut(session).ok_or_else(|| not_found(session))?;
            stored.items.push(StoredItem {
                reference: reference.clone(),
                received: item.clone(),
                outcome,
                script: script.into(),
            });
            Ok(reference)
        }

        async fn item_status(
            &self,
            session: &ReferenceNumber,
            item: &ReferenceNumber,
        ) -> Result<ItemStatus, TransportError> {
            let mut state = self.state.lock().await;
            state.item_status_calls += 1;
            let stored = state
                .sessions
                .get_mut(session)
                .ok_or_else(|| not_found(session))?;
            let stored = stored
                .items
                .iter_mut()
                .find(|i| &i.reference == item)
                .ok_or_else(|| TransportError::http(404, format!("item {item} not found")))?;
            stored
                .script
                .pop_front()
                .unwrap_or_else(|| Ok(stored.outcome.clone()))
        }

        async fn close_session(&self, session: &ReferenceNumber) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            if let Some(error) = state.fail_next_close.take() {
                return Err(error);
            }
            let stored = state
                .sessions
                .get_mut(session)
                .ok_or_else(|| not_found(session))?;
            if stored.closed {
                return Err(TransportError::http(400, format!("session {session} already closed")));
            }
            stored.closed = true;
            Ok(())
        }

        async fn session_status(
            &self,
            session: &ReferenceNumber,
        ) -> Result<SessionStatus, TransportError> {
            let mut state = self.state.lock().await;
            if let Some(step) = state
                .session_scripts
                .get_mut(session)
                .and_then(VecDeque::pop_front)
            {
                return step;
            }
            let stored = state.sessions.get(session).ok_or_else(|| not_found(session))?;
            if !stored.closed {
                return Ok(SessionStatus::from_status(OperationStatus::new(100, "Session open")));
            }

            let total = stored.items.len() as u32;
            let successful = stored
                .items
                .iter()
                .filter(|i| i.outcome.status.is_success())
                .count() as u32;
            let mut status = SessionStatus::from_status(OperationStatus::new(200, "Session processed"))
                .with_counts(total, successful, total - successful);
            status.upo_reference = Some(format!("UPO-{session}"));
            Ok(status)
        }
    }
}
