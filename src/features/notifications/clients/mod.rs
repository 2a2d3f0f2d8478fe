mod webhook_client;

pub use webhook_client::{DeliveryError, WebhookClient, WebhookSender};
