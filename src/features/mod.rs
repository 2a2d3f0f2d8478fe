pub mod health;
pub mod incidents;
pub mod locations;
pub mod notifications;
