//! Session phase cell shared by the provider and everything waiting on it

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use super::types::{Readiness, SessionPhase};

/// The phase stayed busy past the caller's deadline
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("timed out waiting for the session to settle")]
pub struct WaitTimeout;

/// Holds the current [`SessionPhase`] and broadcasts every transition.
///
/// `settled` is the single suspension point in the crate: callers that
/// need the catalog block there until any in-flight login or retrieval
/// finishes, bounded by a caller-supplied timeout.
#[derive(Clone)]
pub struct StateGate {
    tx: watch::Sender<SessionPhase>,
}

impl StateGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionPhase::Initial);
        Self { tx }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.tx.borrow()
    }

    pub fn readiness(&self) -> Readiness {
        self.phase().readiness()
    }

    /// Publish a transition and wake every waiter.
    pub fn advance(&self, next: SessionPhase) {
        let prev = self.tx.send_replace(next);
        if prev != next {
            tracing::debug!(from = ?prev, to = ?next, "session phase changed");
        }
    }

    /// Receiver for observing phase changes as they happen.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.tx.subscribe()
    }

    /// Atomically claim the login slot: succeeds only when no login or
    /// retrieval is in flight, moving the phase to `LoggingIn`.
    pub fn try_begin_login(&self) -> bool {
        let mut claimed = false;
        self.tx.send_if_modified(|phase| {
            if phase.is_busy() {
                false
            } else {
                *phase = SessionPhase::LoggingIn;
                claimed = true;
                true
            }
        });
        claimed
    }

    /// Wait until the phase leaves the busy set, or the deadline passes.
    pub async fn settled(&self, timeout: Duration) -> Result<SessionPhase, WaitTimeout> {
        let mut rx = self.tx.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(|phase| !phase.is_busy())).await {
            Ok(Ok(phase)) => Ok(*phase),
            // The sender outlives this borrow, so the channel cannot be
            // closed here; fall back to a snapshot read regardless.
            Ok(Err(_)) => Ok(self.phase()),
            Err(_) => Err(WaitTimeout),
        }
    }
}

impl Default for StateGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn settled_returns_immediately_when_not_busy() {
        let gate = StateGate::new();
        let phase = gate.settled(Duration::from_millis(10)).await.unwrap();
        assert_eq!(phase, SessionPhase::Initial);
    }

    #[tokio::test]
    async fn settled_observes_the_transition_out_of_the_busy_set() {
        let gate = StateGate::new();
        gate.advance(SessionPhase::LoggingIn);

        let waiter = gate.clone();
        let handle =
            tokio::spawn(async move { waiter.settled(Duration::from_secs(5)).await });

        gate.advance(SessionPhase::Retrieving);
        gate.advance(SessionPhase::Ready);

        assert_eq!(handle.await.unwrap(), Ok(SessionPhase::Ready));
    }

    #[tokio::test(start_paused = true)]
    async fn settled_times_out_while_the_phase_stays_busy() {
        let gate = StateGate::new();
        gate.advance(SessionPhase::LoggingIn);

        let result = gate.settled(Duration::from_secs(30)).await;
        assert_eq!(result, Err(WaitTimeout));
        assert_eq!(gate.phase(), SessionPhase::LoggingIn);
    }

    #[tokio::test]
    async fn login_slot_cannot_be_claimed_twice() {
        let gate = StateGate::new();
        assert!(gate.try_begin_login());
        assert_eq!(gate.phase(), SessionPhase::LoggingIn);
        assert!(!gate.try_begin_login());

        gate.advance(SessionPhase::Failure);
        assert!(gate.try_begin_login());
    }

    #[tokio::test]
    async fn subscribers_see_each_transition() {
        let gate = StateGate::new();
        let mut rx = gate.subscribe();

        gate.advance(SessionPhase::LoggingIn);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionPhase::LoggingIn);

        gate.advance(SessionPhase::Failure);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionPhase::Failure);
    }
}
