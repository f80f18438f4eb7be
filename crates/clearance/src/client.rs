//! The client: one entry point for sessions and permissions.

use std::sync::Arc;

use clearance_core::FormCode;
use clearance_perms::{GrantRequest, PermissionId, PermissionOperation, PermissionRemote};
use clearance_session::{
    SessionError, SessionReport, SubmissionRemote, SubmissionSession,
};
use clearance_track::{OperationStatus, Tracked};

use crate::config::ClientConfig;
use crate::error::Result;

/// Client for the remote clearance service.
///
/// Holds the two remote endpoints and the configuration. Every session it
/// opens gets a freshly generated encryption context.
pub struct ClearanceClient<R: SubmissionRemote, P: PermissionRemote> {
    submissions: Arc<R>,
    permissions: PermissionOperation<P>,
    config: ClientConfig,
}

impl<R: SubmissionRemote, P: PermissionRemote> ClearanceClient<R, P> {
    /// Create a client.
    pub fn new(submissions: Arc<R>, permissions: Arc<P>, config: ClientConfig) -> Self {
        Self {
            submissions,
            permissions: PermissionOperation::new(permissions),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The submission endpoint.
    pub fn submissions(&self) -> &Arc<R> {
        &self.submissions
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Open a session for the configured form code.
    pub async fn open_session(&self) -> Result<SubmissionSession<R>> {
        self.open_session_for(self.config.form_code.clone()).await
    }

    /// Open a session for a specific form code.
    pub async fn open_session_for(&self, form_code: FormCode) -> Result<SubmissionSession<R>> {
        let session =
            SubmissionSession::open_with(Arc::clone(&self.submissions), form_code, None).await?;
        Ok(session)
    }

    /// Submit a whole batch in one session.
    ///
    /// Opens a session, submits every document, closes it, awaits every item
    /// and then the session itself. Items that fail to transmit or cannot be
    /// tracked are recorded and show up in the report rather than aborting
    /// the batch. If the session status cannot be tracked, the report still
    /// carries every item outcome, no session outcome, and the error.
    pub async fn submit_batch<D: AsRef<[u8]>>(&self, documents: &[D]) -> Result<SessionReport> {
        let mut session = self.open_session().await?;

        for document in documents {
            match session.submit_item(document.as_ref()).await {
                Ok(_) | Err(SessionError::ItemTransport { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        session.close().await?;

        if let Err(e) = session.await_all_outcomes(&self.config.item_polling).await {
            tracing::warn!(error = %e, "some items could not be tracked");
        }

        let report = match session
            .await_session_outcome(&self.config.session_polling)
            .await
        {
            Ok(report) => report,
            Err(SessionError::Tracking(e)) => {
                tracing::warn!(error = %e, "session outcome could not be tracked");
                session.report()
            }
            Err(e) => return Err(e.into()),
        };
        tracing::info!(
            session = ?report.session_reference,
            total = report.total,
            accepted = report.accepted,
            rejected = report.rejected,
            status = ?report.batch_status,
            "batch finished"
        );
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions
    // ─────────────────────────────────────────────────────────────────────────

    /// Permission operations with caller-chosen policies.
    pub fn permissions(&self) -> &PermissionOperation<P> {
        &self.permissions
    }

    /// Grant and wait using the configured grant policy.
    pub async fn grant(&self, request: &GrantRequest) -> Result<Tracked<OperationStatus>> {
        let tracked = self
            .permissions
            .grant_and_wait(request, &self.config.grant_polling)
            .await?;
        Ok(tracked)
    }

    /// Revoke and wait using the configured revoke policy.
    pub async fn revoke(&self, permission: &PermissionId) -> Result<Tracked<OperationStatus>> {
        let tracked = self
            .permissions
            .revoke_and_wait(permission, &self.config.revoke_polling)
            .await?;
        Ok(tracked)
    }
}
