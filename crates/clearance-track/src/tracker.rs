//! Generic asynchronous operation tracker.
//!
//! Polls a remote status query for one reference number until the caller's
//! classifier reports a terminal verdict or the policy's maximum wait elapses.
//!
//! ```text
//!              query ok, Pending, time left
//!             ┌────────────────────────────┐
//!             v                            │
//!   ──> Pending ──── Succeeded / Failed (classifier)
//!             │
//!             └──── TimedOut (elapsed >= max_wait)
//! ```
//!
//! The first query is always issued. Later queries are issued only while
//! time remains: the wait before a query is cut short at the deadline and
//! tracking then ends as `TimedOut` without querying again.
//!
//! A failed query is retried once after the usual interval, even past the
//! deadline. A second consecutive failure surfaces as
//! [`TrackError::Transport`]. No background task outlives the call: dropping
//! the returned future abandons tracking.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use clearance_core::{ReferenceNumber, TransportError};

use crate::error::{Result, TrackError};
use crate::policy::PollingPolicy;
use crate::status::OperationStatus;

/// Consecutive failed queries tolerated before tracking gives up.
pub const TRANSPORT_RETRIES: u32 = 1;

/// Classification of one observed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pending,
    Succeeded,
    Failed,
}

impl Verdict {
    /// Success code succeeds; every other code is still pending.
    pub fn success_only(status: &OperationStatus) -> Self {
        if status.is_success() {
            Verdict::Succeeded
        } else {
            Verdict::Pending
        }
    }

    /// Success code succeeds; codes at or above `threshold` fail.
    pub fn failing_from(status: &OperationStatus, threshold: i32) -> Self {
        if status.is_success() {
            Verdict::Succeeded
        } else if status.code >= threshold {
            Verdict::Failed
        } else {
            Verdict::Pending
        }
    }
}

/// State of a tracked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackState {
    Pending,
    Succeeded,
    Failed,
    TimedOut,
}

impl TrackState {
    /// True for every state except `Pending`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, TrackState::Pending)
    }
}

/// Outcome of one `track` call.
#[derive(Debug, Clone)]
pub struct Tracked<S> {
    /// The reference number that was tracked.
    pub reference: ReferenceNumber,
    /// Final state; never `Pending`.
    pub state: TrackState,
    /// The last status successfully observed, if any.
    ///
    /// It was classified terminal exactly when `state` is `Succeeded` or
    /// `Failed`; after `TimedOut` it is the last pending status.
    pub last_status: Option<S>,
    /// Number of status queries issued, failed ones included.
    pub polls: u32,
    /// Time spent tracking.
    pub elapsed: Duration,
}

impl<S> Tracked<S> {
    pub fn is_succeeded(&self) -> bool {
        self.state == TrackState::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.state == TrackState::Failed
    }

    pub fn is_timed_out(&self) -> bool {
        self.state == TrackState::TimedOut
    }

    /// The status that ended tracking, if the classifier found one terminal.
    pub fn terminal_status(&self) -> Option<&S> {
        match self.state {
            TrackState::Succeeded | TrackState::Failed => self.last_status.as_ref(),
            TrackState::Pending | TrackState::TimedOut => None,
        }
    }
}

/// Drives status polling for one kind of operation.
///
/// Holds no per-call state, so one tracker can serve any number of
/// concurrent `track` calls.
#[derive(Debug, Clone, Copy)]
pub struct AsyncOperationTracker {
    operation: &'static str,
}

impl Default for AsyncOperationTracker {
    fn default() -> Self {
        Self::new("operation")
    }
}

impl AsyncOperationTracker {
    /// Create a tracker. `operation` labels log records.
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }

    /// Label used in log records.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Poll `query` until `classify` returns a terminal verdict or the policy
    /// expires.
    ///
    /// The first query is issued immediately. Subsequent queries are spaced
    /// by `policy.poll_interval` and never start at or after
    /// `policy.max_wait`, except the single recovery query owed after a
    /// transport failure.
    pub async fn track<S, Q, Fut, C>(
        &self,
        reference: &ReferenceNumber,
        policy: &PollingPolicy,
        mut query: Q,
        classify: C,
    ) -> Result<Tracked<S>>
    where
        Q: FnMut(ReferenceNumber) -> Fut,
        Fut: Future<Output = std::result::Result<S, TransportError>>,
        C: Fn(&S) -> Verdict,
    {
        policy.validate()?;

        let started = Instant::now();
        let mut polls = 0u32;
        let mut failures = 0u32;
        let mut last_status = None;

        loop {
            polls += 1;
            match query(reference.clone()).await {
                Ok(status) => {
                    failures = 0;
                    let verdict = classify(&status);
                    tracing::debug!(
                        operation = self.operation,
                        %reference,
                        poll = polls,
                        ?verdict,
                        "status polled"
                    );
                    last_status = Some(status);

                    let state = match verdict {
                        Verdict::Succeeded => Some(TrackState::Succeeded),
                        Verdict::Failed => Some(TrackState::Failed),
                        Verdict::Pending if started.elapsed() >= policy.max_wait => {
                            Some(TrackState::TimedOut)
                        }
                        Verdict::Pending => None,
                    };
                    if let Some(state) = state {
                        return Ok(self.finish(reference, state, last_status, polls, started));
                    }
                }
                Err(source) => {
                    failures += 1;
                    if failures > TRANSPORT_RETRIES {
                        tracing::warn!(
                            operation = self.operation,
                            %reference,
                            poll = polls,
                            error = %source,
                            "status query failed again, giving up"
                        );
                        return Err(TrackError::Transport {
                            reference: reference.clone(),
                            attempts: polls,
                            source,
                        });
                    }
                    tracing::warn!(
                        operation = self.operation,
                        %reference,
                        poll = polls,
                        error = %source,
                        "status query failed, retrying"
                    );
                }
            }

            if failures > 0 {
                sleep(policy.poll_interval).await;
                continue;
            }

            let remaining = policy.max_wait.saturating_sub(started.elapsed());
            sleep(policy.poll_interval.min(remaining)).await;
            if started.elapsed() >= policy.max_wait {
                return Ok(self.finish(reference, TrackState::TimedOut, last_status, polls, started));
            }
        }
    }

    /// Track an [`OperationStatus`] where only the success code is terminal.
    pub async fn track_status<Q, Fut>(
        &self,
        reference: &ReferenceNumber,
        policy: &PollingPolicy,
        query: Q,
    ) -> Result<Tracked<OperationStatus>>
    where
        Q: FnMut(ReferenceNumber) -> Fut,
        Fut: Future<Output = std::result::Result<OperationStatus, TransportError>>,
    {
        self.track(reference, policy, query, Verdict::success_only)
            .await
    }

    fn finish<S>(
        &self,
        reference: &ReferenceNumber,
        state: TrackState,
        last_status: Option<S>,
        polls: u32,
        started: Instant,
    ) -> Tracked<S> {
        let elapsed = started.elapsed();
        match state {
            TrackState::Succeeded => tracing::info!(
                operation = self.operation,
                %reference,
                polls,
                ?elapsed,
                "operation succeeded"
            ),
            _ => tracing::warn!(
                operation = self.operation,
                %reference,
                polls,
                ?elapsed,
                ?state,
                "operation did not succeed"
            ),
        }
        Tracked {
            reference: reference.clone(),
            state,
            last_status,
            polls,
            elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Step = std::result::Result<OperationStatus, TransportError>;

    /// A query that replays `steps`, then repeats `rest` forever.
    fn scripted(
        steps: Vec<Step>,
        rest: Step,
    ) -> (
        impl FnMut(ReferenceNumber) -> std::future::Ready<Step>,
        Arc<Mutex<Vec<Instant>>>,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&calls);
        let mut steps: VecDeque<Step> = steps.into();
        let query = move |_reference: ReferenceNumber| {
            seen.lock().unwrap().push(Instant::now());
            std::future::ready(steps.pop_front().unwrap_or_else(|| rest.clone()))
        };
        (query, calls)
    }

    fn reference() -> ReferenceNumber {
        ReferenceNumber::new("REF-1")
    }

    fn policy(max_wait_secs: u64, interval_ms: u64) -> PollingPolicy {
        PollingPolicy::from_secs_and_millis(max_wait_secs, interval_ms)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_never_sleeps() {
        let (query, calls) = scripted(vec![], Ok(OperationStatus::success()));
        let tracker = AsyncOperationTracker::new("test");

        let tracked = tracker
            .track_status(&reference(), &policy(60, 2_000), query)
            .await
            .unwrap();

        assert!(tracked.is_succeeded());
        assert_eq!(tracked.polls, 1);
        assert_eq!(tracked.elapsed, Duration::ZERO);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_terminal_times_out() {
        let (query, calls) = scripted(vec![], Ok(OperationStatus::in_progress()));
        let tracker = AsyncOperationTracker::new("test");

        let tracked = tracker
            .track_status(&reference(), &policy(10, 2_000), query)
            .await
            .unwrap();

        assert!(tracked.is_timed_out());
        assert_eq!(tracked.elapsed, Duration::from_secs(10));
        // Polls at t = 0, 2, 4, 6, 8; none at the deadline.
        assert_eq!(tracked.polls, 5);
        assert_eq!(tracked.last_status, Some(OperationStatus::in_progress()));

        let calls = calls.lock().unwrap();
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(2));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_wait_polls_once() {
        let (query, _calls) = scripted(vec![], Ok(OperationStatus::in_progress()));
        let tracked = AsyncOperationTracker::default()
            .track_status(&reference(), &policy(0, 1_000), query)
            .await
            .unwrap();

        assert!(tracked.is_timed_out());
        assert_eq!(tracked.polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_500_is_pending_until_success() {
        let (query, _calls) = scripted(
            vec![
                Ok(OperationStatus::new(500, "error")),
                Ok(OperationStatus::new(500, "error")),
            ],
            Ok(OperationStatus::success()),
        );

        let tracked = AsyncOperationTracker::new("grant")
            .track_status(&reference(), &policy(15, 1_000), query)
            .await
            .unwrap();

        assert!(tracked.is_succeeded());
        assert_eq!(tracked.polls, 3);
        assert_eq!(tracked.elapsed, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifier_failure_is_data() {
        let (query, _calls) = scripted(
            vec![Ok(OperationStatus::in_progress())],
            Ok(OperationStatus::new(450, "Invalid document")),
        );

        let tracked = AsyncOperationTracker::new("test")
            .track(&reference(), &policy(60, 2_000), query, |s| {
                Verdict::failing_from(s, 300)
            })
            .await
            .unwrap();

        assert!(tracked.is_failed());
        assert_eq!(tracked.polls, 2);
        assert_eq!(tracked.terminal_status().map(|s| s.code), Some(450));
        assert_eq!(tracked.last_status.unwrap().code, 450);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_transport_error_is_swallowed() {
        let (query, _calls) = scripted(
            vec![Err(TransportError::http(503, "unavailable"))],
            Ok(OperationStatus::success()),
        );

        let tracked = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(60, 2_000), query)
            .await
            .unwrap();

        assert!(tracked.is_succeeded());
        assert_eq!(tracked.polls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_consecutive_transport_errors_surface() {
        let (query, _calls) = scripted(
            vec![
                Ok(OperationStatus::in_progress()),
                Err(TransportError::new("reset")),
            ],
            Err(TransportError::new("reset again")),
        );

        let err = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(60, 2_000), query)
            .await
            .unwrap_err();

        match err {
            TrackError::Transport {
                reference,
                attempts,
                source,
            } => {
                assert_eq!(reference.as_str(), "REF-1");
                assert_eq!(attempts, 3);
                assert_eq!(source.message, "reset again");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_counter_resets_after_success() {
        let (query, _calls) = scripted(
            vec![
                Err(TransportError::new("one")),
                Ok(OperationStatus::in_progress()),
                Err(TransportError::new("two")),
            ],
            Ok(OperationStatus::success()),
        );

        let tracked = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(60, 1_000), query)
            .await
            .unwrap();

        assert!(tracked.is_succeeded());
        assert_eq!(tracked.polls, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovery_query_runs_past_deadline() {
        // The error lands on the last poll inside the window; the recovery
        // query still runs and its success is honoured.
        let (query, _calls) = scripted(
            vec![
                Ok(OperationStatus::in_progress()),
                Err(TransportError::new("blip")),
            ],
            Ok(OperationStatus::success()),
        );

        let tracked = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(2, 1_000), query)
            .await
            .unwrap();

        assert!(tracked.is_succeeded());
        assert_eq!(tracked.polls, 3);
        assert_eq!(tracked.elapsed, Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_longer_than_max_wait_stops_at_deadline() {
        let (query, calls) = scripted(
            vec![Ok(OperationStatus::in_progress())],
            Ok(OperationStatus::success()),
        );

        let tracked = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(1, 60_000), query)
            .await
            .unwrap();

        assert!(tracked.is_timed_out());
        assert_eq!(tracked.polls, 1);
        assert_eq!(tracked.elapsed, Duration::from_secs(1));
        assert_eq!(tracked.last_status, Some(OperationStatus::in_progress()));
        assert!(tracked.terminal_status().is_none());
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_rejected_before_query() {
        let (query, calls) = scripted(vec![], Ok(OperationStatus::success()));
        let err = AsyncOperationTracker::new("test")
            .track_status(&reference(), &policy(60, 0), query)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::InvalidPolicy(_)));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_trackers_do_not_block_each_other() {
        let tracker = AsyncOperationTracker::new("test");
        let p = policy(30, 1_000);
        let ref_a = ReferenceNumber::new("A");
        let ref_b = ReferenceNumber::new("B");

        let (query_a, _) = scripted(
            vec![Ok(OperationStatus::in_progress()); 4],
            Ok(OperationStatus::success()),
        );
        let (query_b, _) = scripted(
            vec![Ok(OperationStatus::in_progress()); 4],
            Ok(OperationStatus::success()),
        );

        let started = Instant::now();
        let (a, b) = tokio::join!(
            tracker.track_status(&ref_a, &p, query_a),
            tracker.track_status(&ref_b, &p, query_b),
        );

        assert!(a.unwrap().is_succeeded());
        assert!(b.unwrap().is_succeeded());
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(Verdict::success_only(&OperationStatus::new(500, "x")), Verdict::Pending);
        assert_eq!(Verdict::success_only(&OperationStatus::success()), Verdict::Succeeded);
        assert_eq!(Verdict::failing_from(&OperationStatus::new(399, "x"), 400), Verdict::Pending);
        assert_eq!(Verdict::failing_from(&OperationStatus::new(400, "x"), 400), Verdict::Failed);
        assert!(TrackState::TimedOut.is_terminal());
        assert!(!TrackState::Pending.is_terminal());
    }

    proptest! {
        #[test]
        fn prop_timeout_pacing(interval_ms in 10u64..1_000, windows in 0u64..10) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .start_paused(true)
                .build()
                .unwrap();

            let interval = Duration::from_millis(interval_ms);
            let max_wait = interval * windows as u32 + interval / 2;
            let policy = PollingPolicy::new(max_wait, interval);

            let tracked = runtime.block_on(async {
                let (query, _) = scripted(vec![], Ok(OperationStatus::in_progress()));
                AsyncOperationTracker::new("prop")
                    .track_status(&reference(), &policy, query)
                    .await
                    .unwrap()
            });

            prop_assert!(tracked.is_timed_out());
            prop_assert!(tracked.elapsed >= max_wait);
            prop_assert!(tracked.elapsed <= max_wait + Duration::from_millis(1));
            prop_assert_eq!(tracked.polls as u64, windows + 1);
        }
    }
}
