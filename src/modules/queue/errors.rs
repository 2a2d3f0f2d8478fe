use thiserror::Error;

/// Errors that can occur while pushing to or popping from the queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue connection error: {0}")]
    ConnectionError(String),

    #[error("Queue serialization error: {0}")]
    SerializationError(String),

    #[error("Queue backend error: {0}")]
    BackendError(String),

    /// The shutdown signal fired while waiting for an item
    #[error("Queue wait cancelled")]
    Cancelled,
}

pub type QueueResult<T> = Result<T, QueueError>;
