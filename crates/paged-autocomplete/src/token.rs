//! Cancellation tokens handed to the search client.
//!
//! Each request gets a fresh token with a unique id. The controller keeps the
//! id of the one active request and discards any resolution carrying another id.

use std::sync::Arc;

use tokio::sync::watch;

/// Handle to a single request attempt
#[derive(Clone, Debug)]
pub struct RequestToken {
    id: u64,
    tx: Arc<watch::Sender<bool>>,
}

impl RequestToken {
    pub fn new(id: u64) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { id, tx: Arc::new(tx) }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Signal the request to stop. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called on any clone of this token
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}
