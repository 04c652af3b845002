//! Fire-and-forget notification dispatch.
//!
//! Requests enqueue onto a bounded channel and return immediately; a
//! background task drains the queue through the gateway. Delivery
//! failures end up in the log, never in a caller's result.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use warden_core::notification::{Notification, NotificationGateway};

#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<Notification>,
}

impl NotificationDispatcher {
    /// Start the delivery task on the current runtime.
    ///
    /// The task exits once every dispatcher handle has been dropped.
    pub fn spawn<G: NotificationGateway>(gateway: G, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));
        let gateway = Arc::new(gateway);

        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                let to = notification.to.clone();
                match gateway.send(notification).await {
                    Ok(()) => info!(%to, "Notification delivered"),
                    Err(e) => warn!(%to, error = %e, "Notification delivery failed"),
                }
            }
        });

        (Self { tx }, handle)
    }

    /// Queue a notification without waiting. Drops it with a warning
    /// when the queue is full or the delivery task is gone.
    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            let (reason, to) = match &e {
                mpsc::error::TrySendError::Full(n) => ("queue full", n.to.clone()),
                mpsc::error::TrySendError::Closed(n) => ("dispatcher stopped", n.to.clone()),
            };
            warn!(%to, reason, "Dropping notification");
        }
    }
}
