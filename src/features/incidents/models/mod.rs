mod incident;

pub use incident::{CreateIncident, Incident, IncidentSeverity, IncidentStats, UpdateIncident};
