mod alert_publisher;

pub use alert_publisher::{run_forwarder, AlertPublisher};
