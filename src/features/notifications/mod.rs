//! Alert delivery pipeline
//!
//! Location checks that match a zone publish a [`models::AlertPayload`] onto an
//! in-process channel. A forwarder moves it into the Redis queue, and the
//! [`NotificationDispatcher`] posts it to the webhook with bounded retries.
//!
//! This feature exposes no HTTP routes. Dispatcher counters are reported
//! by `GET /api/v1/system/health`.

pub mod clients;
pub mod models;
pub mod services;
pub mod workers;

pub use clients::WebhookClient;
pub use services::{run_forwarder, AlertPublisher};
pub use workers::{DispatchMetrics, NotificationDispatcher, RetryPolicy};
