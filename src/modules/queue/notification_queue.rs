use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

use crate::core::config::QueueConfig;
use crate::features::notifications::models::AlertPayload;
use crate::modules::queue::{QueueError, QueueResult};

/// FIFO of pending webhook notifications
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, payload: &AlertPayload) -> QueueResult<()>;

    /// Wait for the next payload
    ///
    /// Blocks while the queue is empty. Returns [`QueueError::Cancelled`] as
    /// soon as `shutdown` reads `true` or its sender is dropped.
    async fn dequeue(&self, shutdown: &mut watch::Receiver<bool>) -> QueueResult<AlertPayload>;
}

/// Redis list queue: `LPUSH` on enqueue, `BRPOP` on dequeue
///
/// The consumer gets its own connection. `BRPOP` holds the connection it
/// runs on, and producers must not wait behind it.
pub struct RedisNotificationQueue {
    producer: ConnectionManager,
    consumer: ConnectionManager,
    key: String,
    poll_interval: Duration,
}

impl RedisNotificationQueue {
    pub fn new(producer: ConnectionManager, consumer: ConnectionManager, config: &QueueConfig) -> Self {
        Self {
            producer,
            consumer,
            key: config.key.clone(),
            poll_interval: config.poll_interval,
        }
    }
}

#[async_trait]
impl NotificationQueue for RedisNotificationQueue {
    async fn enqueue(&self, payload: &AlertPayload) -> QueueResult<()> {
        let mut conn = self.producer.clone();
        push_command(&self.key, payload)?
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_redis_error("LPUSH", e))?;

        tracing::debug!(
            "Enqueued alert for user {} ({} zones) on {}",
            payload.user_id,
            payload.incidents.len(),
            self.key
        );
        Ok(())
    }

    async fn dequeue(&self, shutdown: &mut watch::Receiver<bool>) -> QueueResult<AlertPayload> {
        // BRPOP with a bounded server-side timeout, repeated until an item
        // shows up, so each round trip stays inside the response timeout
        let pop = pop_command(&self.key, blocking_timeout_secs(self.poll_interval));

        loop {
            if *shutdown.borrow() {
                return Err(QueueError::Cancelled);
            }

            let mut conn = self.consumer.clone();
            let popped = pop_unless_cancelled(
                pop.query_async::<Option<(String, String)>>(&mut conn),
                shutdown,
            )
            .await?
            .map_err(|e| map_redis_error("BRPOP", e))?;

            if let Some(payload) = decode_popped(popped)? {
                return Ok(payload);
            }
        }
    }
}

/// Producers push onto the head of the list
fn push_command(key: &str, payload: &AlertPayload) -> QueueResult<redis::Cmd> {
    let data = serde_json::to_string(payload)
        .map_err(|e| QueueError::SerializationError(e.to_string()))?;

    let mut cmd = redis::cmd("LPUSH");
    cmd.arg(key).arg(data);
    Ok(cmd)
}

/// The consumer pops from the tail, so the oldest payload comes out first
fn pop_command(key: &str, timeout_secs: u64) -> redis::Cmd {
    let mut cmd = redis::cmd("BRPOP");
    cmd.arg(key).arg(timeout_secs);
    cmd
}

/// `BRPOP` takes whole seconds and `0` would block forever
fn blocking_timeout_secs(poll_interval: Duration) -> u64 {
    poll_interval.as_secs().max(1)
}

/// `None` is a `BRPOP` timeout with nothing queued
fn decode_popped(popped: Option<(String, String)>) -> QueueResult<Option<AlertPayload>> {
    let Some((_, raw)) = popped else {
        return Ok(None);
    };

    serde_json::from_str::<AlertPayload>(&raw)
        .map(Some)
        .map_err(|e| QueueError::SerializationError(e.to_string()))
}

/// Drive `pop` to completion unless shutdown reads `true` first
///
/// A change notification that still reads `false` keeps the same pop in
/// flight. A pop that is already complete wins over a concurrent shutdown.
async fn pop_unless_cancelled<F>(
    pop: F,
    shutdown: &mut watch::Receiver<bool>,
) -> QueueResult<F::Output>
where
    F: Future,
{
    tokio::pin!(pop);

    loop {
        tokio::select! {
            biased;

            popped = &mut pop => return Ok(popped),
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    return Err(QueueError::Cancelled);
                }
            }
        }
    }
}

fn map_redis_error(command: &str, e: redis::RedisError) -> QueueError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        QueueError::ConnectionError(format!("Redis {} failed: {}", command, e))
    } else {
        QueueError::BackendError(format!("Redis {} failed: {}", command, e))
    }
}
