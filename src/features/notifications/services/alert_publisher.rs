use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use crate::features::notifications::models::AlertPayload;
use crate::modules::queue::NotificationQueue;

/// Non-blocking handoff of alerts from request handlers to the queue
///
/// `publish` never waits: a full channel drops the alert with a warning.
/// The forwarder task moves published alerts into the durable queue.
#[derive(Clone)]
pub struct AlertPublisher {
    tx: mpsc::Sender<AlertPayload>,
}

impl AlertPublisher {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<AlertPayload>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Returns whether the alert was accepted
    pub fn publish(&self, payload: AlertPayload) -> bool {
        match self.tx.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(payload)) => {
                tracing::warn!(
                    "Alert channel full, dropping alert for user {}",
                    payload.user_id
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(payload)) => {
                tracing::warn!(
                    "Alert channel closed, dropping alert for user {}",
                    payload.user_id
                );
                false
            }
        }
    }
}

/// Forward published alerts into `queue` until shutdown
///
/// On shutdown the alerts already sitting in the channel are still
/// enqueued before returning.
pub async fn run_forwarder(
    mut rx: mpsc::Receiver<AlertPayload>,
    queue: Arc<dyn NotificationQueue>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!("Starting alert forwarder");

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(payload) => forward(queue.as_ref(), &payload).await,
                    None => break,
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    rx.close();
                    while let Some(payload) = rx.recv().await {
                        forward(queue.as_ref(), &payload).await;
                    }
                    break;
                }
            }
        }
    }

    tracing::info!("Alert forwarder stopped");
}

async fn forward(queue: &dyn NotificationQueue, payload: &AlertPayload) {
    if let Err(e) = queue.enqueue(payload).await {
        tracing::error!(
            "Failed to enqueue alert for user {}: {}",
            payload.user_id,
            e
        );
    }
}
