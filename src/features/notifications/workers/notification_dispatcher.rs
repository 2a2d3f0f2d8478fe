use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use utoipa::ToSchema;

use crate::core::config::WebhookConfig;
use crate::features::notifications::clients::WebhookSender;
use crate::features::notifications::models::AlertPayload;
use crate::modules::queue::{NotificationQueue, QueueError};

/// Pause after a failed dequeue before polling the queue again
const DEQUEUE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded retry with linear backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay: config.retry_delay,
        }
    }

    /// Wait after failed attempt `attempt` (1-based) before the next one
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Final state of one payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    /// Every attempt failed; the payload is discarded
    Dropped { attempts: u32 },
}

/// Delivery counters, shared with the health endpoint
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    delivered: AtomicU64,
    dropped: AtomicU64,
    failed_attempts: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct DispatchStats {
    pub delivered: u64,
    pub dropped: u64,
    pub failed_attempts: u64,
}

impl DispatchMetrics {
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
        }
    }
}

/// Background worker draining the notification queue into the webhook
///
/// Single consumer: one payload is in flight at a time.
pub struct NotificationDispatcher {
    queue: Arc<dyn NotificationQueue>,
    sender: Arc<dyn WebhookSender>,
    policy: RetryPolicy,
    metrics: Arc<DispatchMetrics>,
}

impl NotificationDispatcher {
    pub fn new(
        queue: Arc<dyn NotificationQueue>,
        sender: Arc<dyn WebhookSender>,
        policy: RetryPolicy,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            queue,
            sender,
            policy,
            metrics,
        }
    }

    /// Run until `shutdown` turns `true` (or its sender is dropped)
    ///
    /// A payload already dequeued finishes its whole attempt sequence
    /// before the loop checks the signal again.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Starting notification dispatcher (max_attempts={}, base_delay={:?})",
            self.policy.max_attempts,
            self.policy.base_delay
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.queue.dequeue(&mut shutdown).await {
                Ok(payload) => {
                    self.deliver(&payload).await;
                }
                Err(QueueError::Cancelled) => break,
                Err(e) => {
                    tracing::error!("Failed to dequeue notification: {}", e);

                    tokio::select! {
                        _ = tokio::time::sleep(DEQUEUE_ERROR_BACKOFF) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }

        tracing::info!("Notification dispatcher stopped");
    }

    /// Deliver one payload with bounded retries
    pub async fn deliver(&self, payload: &AlertPayload) -> DeliveryOutcome {
        let max_attempts = self.policy.max_attempts;

        for attempt in 1..=max_attempts {
            tracing::debug!(
                "Sending alert for user {} attempt {}/{}",
                payload.user_id,
                attempt,
                max_attempts
            );

            match self.sender.send(payload).await {
                Ok(()) => {
                    self.metrics.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(
                        "Alert for user {} delivered on attempt {}/{}",
                        payload.user_id,
                        attempt,
                        max_attempts
                    );
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) => {
                    self.metrics.failed_attempts.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        "Webhook attempt {}/{} for user {} failed: {}",
                        attempt,
                        max_attempts,
                        payload.user_id,
                        e
                    );

                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    }
                }
            }
        }

        self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
        tracing::error!(
            "Dropping alert for user {} ({} zones) after {} failed attempts",
            payload.user_id,
            payload.incidents.len(),
            max_attempts
        );

        DeliveryOutcome::Dropped {
            attempts: max_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{sample_payload, InMemoryNotificationQueue, ScriptedSender};
    use tokio::time::Instant;

    const BASE: Duration = Duration::from_millis(100);

    fn dispatcher(
        queue: Arc<InMemoryNotificationQueue>,
        sender: Arc<ScriptedSender>,
        max_attempts: u32,
    ) -> (NotificationDispatcher, Arc<DispatchMetrics>) {
        let metrics = Arc::new(DispatchMetrics::default());
        let dispatcher = NotificationDispatcher::new(
            queue,
            sender,
            RetryPolicy {
                max_attempts,
                base_delay: BASE,
            },
            metrics.clone(),
        );
        (dispatcher, metrics)
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(4), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivered_after_transient_failures() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::failing_first(2));
        let (dispatcher, metrics) = dispatcher(queue, sender.clone(), 5);

        let outcome = dispatcher.deliver(&sample_payload("user-1")).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 3 });
        let attempts = sender.attempt_times();
        assert_eq!(attempts.len(), 3);
        assert_eq!(attempts[1] - attempts[0], BASE);
        assert_eq!(attempts[2] - attempts[1], BASE * 2);

        let stats = metrics.snapshot();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.failed_attempts, 2);
        assert_eq!(stats.dropped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_after_max_attempts() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::always_failing());
        let (dispatcher, metrics) = dispatcher(queue, sender.clone(), 3);

        let started = Instant::now();
        let outcome = dispatcher.deliver(&sample_payload("user-1")).await;

        assert_eq!(outcome, DeliveryOutcome::Dropped { attempts: 3 });
        assert_eq!(sender.attempt_count(), 3);
        // 1x + 2x base between attempts, nothing after the last one
        assert_eq!(Instant::now() - started, BASE * 3);
        assert_eq!(metrics.snapshot().dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_has_no_delay() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::failing_first(0));
        let (dispatcher, _) = dispatcher(queue, sender.clone(), 3);

        let started = Instant::now();
        let outcome = dispatcher.deliver(&sample_payload("user-1")).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_drains_queue_in_order_then_stops() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::failing_first(0));
        let (dispatcher, metrics) = dispatcher(queue.clone(), sender.clone(), 3);
        let (tx, rx) = watch::channel(false);

        queue.enqueue(&sample_payload("a")).await.unwrap();
        queue.enqueue(&sample_payload("b")).await.unwrap();

        let handle = tokio::spawn(async move { dispatcher.run(rx).await });

        while metrics.snapshot().delivered < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sender.delivered_users(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_shutdown_while_idle_stops_promptly() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::failing_first(0));
        let (dispatcher, _) = dispatcher(queue, sender.clone(), 3);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { dispatcher.run(rx).await });
        tokio::task::yield_now().await;

        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("dispatcher did not stop")
            .unwrap();
        assert_eq!(sender.attempt_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_delivery_finishes_before_exit() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let sender = Arc::new(ScriptedSender::failing_first(2));
        let (dispatcher, metrics) = dispatcher(queue.clone(), sender.clone(), 3);
        let (tx, rx) = watch::channel(false);

        queue.enqueue(&sample_payload("in-flight")).await.unwrap();
        queue.enqueue(&sample_payload("left-behind")).await.unwrap();

        let handle = tokio::spawn(async move { dispatcher.run(rx).await });

        while sender.attempt_count() == 0 {
            tokio::task::yield_now().await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sender.attempt_count(), 3);
        assert_eq!(sender.delivered_users(), vec!["in-flight"]);
        assert_eq!(metrics.snapshot().delivered, 1);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dequeue_errors_do_not_stop_the_loop() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        queue.fail_next_dequeues(2);
        let sender = Arc::new(ScriptedSender::failing_first(0));
        let (dispatcher, metrics) = dispatcher(queue.clone(), sender.clone(), 3);
        let (tx, rx) = watch::channel(false);

        queue.enqueue(&sample_payload("survivor")).await.unwrap();
        let handle = tokio::spawn(async move { dispatcher.run(rx).await });

        while metrics.snapshot().delivered < 1 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tx.send(true).unwrap();
        handle.await.unwrap();

        assert_eq!(sender.delivered_users(), vec!["survivor"]);
    }
}
