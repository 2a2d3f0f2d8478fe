mod notification_dispatcher;

pub use notification_dispatcher::{
    DeliveryOutcome, DispatchMetrics, DispatchStats, NotificationDispatcher, RetryPolicy,
};
