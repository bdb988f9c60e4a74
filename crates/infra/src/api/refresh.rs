//! Single-flight credential refresh coordination
//!
//! One [`RefreshCoordinator`] lives inside each API client. It owns the
//! in-flight flag and the FIFO queue of callers waiting for the refresh to
//! settle. Both sit behind a synchronous mutex that is only held for the
//! duration of a check-and-set or a drain, never across an `.await`.
//!
//! ```text
//!   401 ──► begin() ──┬── in flight ─────► Follower(rx) ──► wait for outcome
//!                     ├── cycle failed ──► Terminated ────► fail immediately
//!                     ├── stale cred ────► Stale ─────────► retry immediately
//!                     └── idle ──────────► Leader(guard) ─► call refresh endpoint
//!                                                            │
//!                                          guard.settle() ◄──┘  (drains FIFO,
//!                                                               clears flag)
//! ```
//!
//! Every settled cycle bumps a generation counter. Callers snapshot it with
//! [`RefreshCoordinator::generation`] before sending, so a 401 that arrives
//! after a cycle settled is matched against that cycle's outcome instead of
//! starting another refresh.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

/// What started a refresh, or what a waiter was doing when it queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// A caller is waiting on the result; failure ends the session loudly.
    Foreground,
    /// Best-effort work such as the periodic refresh.
    Background,
}

impl RefreshTrigger {
    pub fn is_background(self) -> bool {
        matches!(self, Self::Background)
    }
}

/// Result of a refresh cycle, delivered to every queued waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new credential is current; retry now.
    Refreshed,
    /// The refresh failed and the session was terminated.
    Failed(String),
    /// The leader went away before the refresh settled.
    Abandoned,
}

struct Waiter {
    trigger: RefreshTrigger,
    tx: oneshot::Sender<RefreshOutcome>,
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<Waiter>,
    /// Count of cycles that settled as refreshed or failed
    generation: u64,
    /// Reason of the most recent cycle if it failed
    last_failure: Option<String>,
}

/// Entry into the refresh protocol returned by [`RefreshCoordinator::begin`].
pub(crate) enum RefreshTicket<'a> {
    /// This caller performs the refresh and must settle the guard.
    Leader(RefreshGuard<'a>),
    /// A refresh is already running; await its outcome.
    Follower(oneshot::Receiver<RefreshOutcome>),
    /// A refresh completed after the failing request was sent.
    Stale,
    /// A refresh failed after the failing request was sent; the session it
    /// belonged to is gone.
    Terminated(String),
}

/// Summary of a settled refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SettleReport {
    pub drained: usize,
    pub foreground_waiters: bool,
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Generation of the last settled cycle.
    pub(crate) fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Join or start a refresh.
    ///
    /// `since` is the generation observed before the failing request was
    /// sent. If a cycle settled in between, its outcome decides: a failure
    /// yields [`RefreshTicket::Terminated`], a success [`RefreshTicket::Stale`].
    ///
    /// `is_stale` runs under the coordinator lock and only when no refresh is
    /// in flight and no cycle settled since `since`. It covers credentials
    /// replaced outside a refresh cycle (e.g. a login).
    pub(crate) fn begin(
        &self,
        trigger: RefreshTrigger,
        since: u64,
        is_stale: impl FnOnce() -> bool,
    ) -> RefreshTicket<'_> {
        let mut state = self.state.lock();

        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(Waiter { trigger, tx });
            debug!(queued = state.waiters.len(), ?trigger, "refresh in flight; request queued");
            return RefreshTicket::Follower(rx);
        }

        if state.generation != since {
            return match &state.last_failure {
                Some(reason) => RefreshTicket::Terminated(reason.clone()),
                None => RefreshTicket::Stale,
            };
        }

        if is_stale() {
            return RefreshTicket::Stale;
        }

        state.in_flight = true;
        RefreshTicket::Leader(RefreshGuard { coordinator: self, settled: false })
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.state.lock().in_flight
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().waiters.len()
    }

    fn finish(&self, outcome: &RefreshOutcome) -> SettleReport {
        let waiters = {
            let mut state = self.state.lock();
            state.in_flight = false;
            match outcome {
                RefreshOutcome::Refreshed => {
                    state.generation += 1;
                    state.last_failure = None;
                }
                RefreshOutcome::Failed(reason) => {
                    state.generation += 1;
                    state.last_failure = Some(reason.clone());
                }
                RefreshOutcome::Abandoned => {}
            }
            std::mem::take(&mut state.waiters)
        };

        let mut report = SettleReport { drained: waiters.len(), foreground_waiters: false };
        for waiter in waiters {
            report.foreground_waiters |= !waiter.trigger.is_background();
            // Receiver may be gone if the waiting caller was cancelled.
            let _ = waiter.tx.send(outcome.clone());
        }
        report
    }
}

/// Proof of refresh leadership.
///
/// Settling drains the queue in enqueue order and clears the in-flight flag.
/// Dropping an unsettled guard does the same with
/// [`RefreshOutcome::Abandoned`].
pub(crate) struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    pub(crate) fn settle(mut self, outcome: RefreshOutcome) -> SettleReport {
        self.settled = true;
        self.coordinator.finish(&outcome)
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            let report = self.coordinator.finish(&RefreshOutcome::Abandoned);
            debug!(drained = report.drained, "refresh abandoned before settling");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leader(ticket: RefreshTicket<'_>) -> RefreshGuard<'_> {
        match ticket {
            RefreshTicket::Leader(guard) => guard,
            _ => panic!("expected leader"),
        }
    }

    fn follower(ticket: RefreshTicket<'_>) -> oneshot::Receiver<RefreshOutcome> {
        match ticket {
            RefreshTicket::Follower(rx) => rx,
            _ => panic!("expected follower"),
        }
    }

    #[test]
    fn only_first_caller_leads() {
        let coordinator = RefreshCoordinator::new();

        let guard = leader(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
        let _a = follower(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
        let _b = follower(coordinator.begin(RefreshTrigger::Background, 0, || true));

        assert!(coordinator.is_in_flight());
        assert_eq!(coordinator.queued(), 2);

        let report = guard.settle(RefreshOutcome::Refreshed);
        assert_eq!(report, SettleReport { drained: 2, foreground_waiters: true });
        assert!(!coordinator.is_in_flight());
        assert_eq!(coordinator.queued(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiters_drain_in_enqueue_order() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin(RefreshTrigger::Foreground, 0, || false));

        let order = std::sync::Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for index in 0..5 {
            let rx = follower(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                let outcome = rx.await.unwrap();
                order.lock().push(index);
                outcome
            }));
        }
        tokio::task::yield_now().await;

        guard.settle(RefreshOutcome::Failed("refresh rejected".into()));
        for handle in handles {
            assert_eq!(handle.await.unwrap(), RefreshOutcome::Failed("refresh rejected".into()));
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn background_only_cycle_reports_no_foreground_waiters() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin(RefreshTrigger::Background, 0, || false));
        let _rx = follower(coordinator.begin(RefreshTrigger::Background, 0, || false));

        let report = guard.settle(RefreshOutcome::Failed("expired".into()));
        assert!(!report.foreground_waiters);
        assert_eq!(report.drained, 1);
    }

    #[test]
    fn stale_check_only_runs_when_idle() {
        let coordinator = RefreshCoordinator::new();
        assert!(matches!(coordinator.begin(RefreshTrigger::Foreground, 0, || true), RefreshTicket::Stale));
        assert!(!coordinator.is_in_flight());

        let _guard = leader(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
        let ticket = coordinator.begin(RefreshTrigger::Foreground, 0, || panic!("not evaluated"));
        assert!(matches!(ticket, RefreshTicket::Follower(_)));
    }

    #[tokio::test]
    async fn dropped_guard_releases_waiters_and_clears_flag() {
        let coordinator = RefreshCoordinator::new();
        let guard = leader(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
        let rx = follower(coordinator.begin(RefreshTrigger::Foreground, 0, || false));

        drop(guard);

        assert_eq!(rx.await.unwrap(), RefreshOutcome::Abandoned);
        assert!(!coordinator.is_in_flight());

        // An abandoned cycle is not a settled one: the same generation leads again.
        assert_eq!(coordinator.generation(), 0);
        let _next = leader(coordinator.begin(RefreshTrigger::Foreground, 0, || false));
    }

    #[test]
    fn late_caller_after_failed_cycle_is_terminated() {
        let coordinator = RefreshCoordinator::new();
        let sent_at = coordinator.generation();

        let guard = leader(coordinator.begin(RefreshTrigger::Foreground, sent_at, || false));
        guard.settle(RefreshOutcome::Failed("refresh rejected".into()));

        let ticket = coordinator.begin(RefreshTrigger::Foreground, sent_at, || panic!("not evaluated"));
        assert!(matches!(ticket, RefreshTicket::Terminated(reason) if reason == "refresh rejected"));
        assert!(!coordinator.is_in_flight());

        // Requests sent after the failure start a new cycle.
        let _next = leader(coordinator.begin(
            RefreshTrigger::Foreground,
            coordinator.generation(),
            || false,
        ));
    }

    #[test]
    fn late_caller_after_successful_cycle_replays() {
        let coordinator = RefreshCoordinator::new();
        let sent_at = coordinator.generation();

        let guard = leader(coordinator.begin(RefreshTrigger::Foreground, sent_at, || false));
        guard.settle(RefreshOutcome::Refreshed);

        assert_eq!(coordinator.generation(), sent_at + 1);
        assert!(matches!(
            coordinator.begin(RefreshTrigger::Foreground, sent_at, || false),
            RefreshTicket::Stale
        ));
    }
}
