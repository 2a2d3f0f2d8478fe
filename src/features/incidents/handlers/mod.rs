mod incident_handler;

pub use incident_handler::*;
