mod alert_payload;

pub use alert_payload::AlertPayload;
