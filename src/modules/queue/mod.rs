//! Durable notification queue
//!
//! FIFO of alert payloads on a Redis list. Producers push to
//! the head, the single dispatcher pops from the tail. There is no
//! acknowledgement step: a popped payload is gone from Redis, so a crash
//! between dequeue and delivery loses it.

mod errors;
mod notification_queue;

pub use errors::{QueueError, QueueResult};
pub use notification_queue::{NotificationQueue, RedisNotificationQueue};
