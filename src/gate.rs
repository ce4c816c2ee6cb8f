//! Two-phase task helper: a background step followed by a follow-up
//! that always runs.
//!
//! This is the only bridge between the state machine's blocking waits,
//! the backend round trips, and the consumers expecting a completion
//! signal. The follow-up runs no matter how the background step ended,
//! so a caller that handed its responder to the follow-up can never
//! leave a consumer hanging.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::task::JoinHandle;

/// Run `background` on the runtime, then hand its output to `follow_up`.
///
/// A panic in the background step is captured and surfaces as `None`:
/// it means "stop waiting", not cancellation, and the follow-up must
/// re-check whatever state it cares about instead of assuming success.
pub fn run_then<T, B, C>(background: B, follow_up: C) -> JoinHandle<()>
where
    T: Send + 'static,
    B: Future<Output = T> + Send + 'static,
    C: FnOnce(Option<T>) + Send + 'static,
{
    tokio::spawn(async move {
        match AssertUnwindSafe(background).catch_unwind().await {
            Ok(value) => follow_up(Some(value)),
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::error!(message = %message, "background step panicked");
                follow_up(None);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn follow_up_receives_the_background_output() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        run_then(async { 21 * 2 }, move |value| {
            tx.send(value).unwrap();
        })
        .await
        .unwrap();
        assert_eq!(rx.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn follow_up_runs_even_when_the_background_step_panics() {
        let ran = Arc::new(AtomicBool::new(false));
        let ran_in_follow_up = ran.clone();

        run_then(
            async {
                if true {
                    panic!("boom");
                }
                0
            },
            move |value| {
                assert_eq!(value, None);
                ran_in_follow_up.store(true, Ordering::SeqCst);
            },
        )
        .await
        .unwrap();

        assert!(ran.load(Ordering::SeqCst));
    }
}
