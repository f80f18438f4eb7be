//! Grant and revoke workflows on top of the operation tracker.

use std::sync::Arc;

use clearance_core::ReferenceNumber;
use clearance_track::{
    AsyncOperationTracker, OperationStatus, PollingPolicy, Tracked, Verdict,
};

use crate::error::Result;
use crate::grant::{GrantRequest, PermissionId};
use crate::remote::PermissionRemote;

/// Stateless helper for permission operations.
///
/// `grant` and `revoke` return as soon as the service hands back a reference
/// number; completion is awaited separately. A delegated grant must not be
/// issued before the grant that delegates to its issuer has succeeded. The
/// service is the source of truth for that, so the ordering is left to the
/// caller.
pub struct PermissionOperation<R: PermissionRemote> {
    remote: Arc<R>,
    tracker: AsyncOperationTracker,
}

impl<R: PermissionRemote> Clone for PermissionOperation<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            tracker: self.tracker,
        }
    }
}

impl<R: PermissionRemote> PermissionOperation<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            tracker: AsyncOperationTracker::new("permission"),
        }
    }

    /// The underlying remote endpoint.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Validate and submit a grant request.
    pub async fn grant(&self, request: &GrantRequest) -> Result<ReferenceNumber> {
        request.validate()?;
        let reference = self.remote.grant(request).await?;
        tracing::info!(
            %reference,
            subject = %request.subject,
            permissions = ?request.permissions,
            "grant requested"
        );
        Ok(reference)
    }

    /// Submit revocation of an active permission.
    pub async fn revoke(&self, permission: &PermissionId) -> Result<ReferenceNumber> {
        let reference = self.remote.revoke(permission).await?;
        tracing::info!(%reference, %permission, "revoke requested");
        Ok(reference)
    }

    /// Wait until the operation reports the success code.
    ///
    /// No other code is treated as terminal; an operation that never succeeds
    /// ends as `TimedOut`.
    pub async fn await_completion(
        &self,
        reference: &ReferenceNumber,
        policy: &PollingPolicy,
    ) -> Result<Tracked<OperationStatus>> {
        self.await_completion_with(reference, policy, Verdict::success_only)
            .await
    }

    /// Wait with a caller-supplied classifier.
    pub async fn await_completion_with<C>(
        &self,
        reference: &ReferenceNumber,
        policy: &PollingPolicy,
        classify: C,
    ) -> Result<Tracked<OperationStatus>>
    where
        C: Fn(&OperationStatus) -> Verdict,
    {
        let remote = &self.remote;
        let tracked = self
            .tracker
            .track(
                reference,
                policy,
                move |reference| async move { remote.operation_status(&reference).await },
                classify,
            )
            .await?;
        Ok(tracked)
    }

    /// Grant and wait for completion.
    pub async fn grant_and_wait(
        &self,
        request: &GrantRequest,
        policy: &PollingPolicy,
    ) -> Result<Tracked<OperationStatus>> {
        let reference = self.grant(request).await?;
        self.await_completion(&reference, policy).await
    }

    /// Revoke and wait for completion.
    pub async fn revoke_and_wait(
        &self,
        permission: &PermissionId,
        policy: &PollingPolicy,
    ) -> Result<Tracked<OperationStatus>> {
        let reference = self.revoke(permission).await?;
        self.await_completion(&reference, policy).await
    }
}
