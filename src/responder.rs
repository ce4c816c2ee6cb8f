//! Single-fire result delivery between the provider and one consumer.
//!
//! A fetch either answers synchronously (a cache hit) or detaches and
//! answers later, once the network round trip completes. Either way the
//! consumer's handle resolves exactly once; the value rides a oneshot
//! channel, so a result cannot cross twice even if a caller misbehaves.

use thiserror::Error;
use tokio::sync::oneshot;

/// Misuse of a responder; delivery happens at most once
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ResponderError {
    #[error("deliver() called twice on the same responder")]
    AlreadyDelivered,
    #[error("detach() called after deliver()")]
    DetachAfterDeliver,
    #[error("detach() called twice on the same responder")]
    AlreadyDetached,
}

/// The responder was dropped without delivering a result
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("responder dropped without delivering a result")]
pub struct Disconnected;

/// Sending half of a single-shot fetch result
pub struct Responder<T> {
    tx: Option<oneshot::Sender<T>>,
    detached: bool,
}

/// Receiving half, resolved by [`Responder::deliver`]
pub struct ResponseHandle<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Responder<T> {
    /// Create a connected responder/handle pair.
    pub fn channel() -> (Self, ResponseHandle<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Some(tx),
                detached: false,
            },
            ResponseHandle { rx },
        )
    }

    /// Send the result to the consumer.
    ///
    /// At most one call may succeed; a repeated call is a
    /// programming-error fault, reported rather than silently dropped.
    pub fn deliver(&mut self, value: T) -> Result<(), ResponderError> {
        match self.tx.take() {
            Some(tx) => {
                // A consumer that stopped listening is not a fault here.
                let _ = tx.send(value);
                Ok(())
            }
            None => {
                tracing::error!("deliver() called twice on the same responder");
                Err(ResponderError::AlreadyDelivered)
            }
        }
    }

    /// Mark the result as arriving later, after this call stack returns.
    ///
    /// Valid once, and only before delivery; `deliver` after `detach`
    /// completes the exchange normally.
    pub fn detach(&mut self) -> Result<(), ResponderError> {
        if self.tx.is_none() {
            tracing::error!("detach() called after deliver()");
            return Err(ResponderError::DetachAfterDeliver);
        }
        if self.detached {
            tracing::error!("detach() called twice on the same responder");
            return Err(ResponderError::AlreadyDetached);
        }
        self.detached = true;
        Ok(())
    }
}

impl<T> ResponseHandle<T> {
    /// Wait for the delivery.
    ///
    /// A responder dropped without delivering resolves with
    /// [`Disconnected`], so the caller always gets a completion signal.
    pub async fn wait(self) -> Result<T, Disconnected> {
        self.rx.await.map_err(|_| Disconnected)
    }
}
