use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::locations::models::GeoPoint;

/// Incident severity enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "incident_severity", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IncidentSeverity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentSeverity::Low => write!(f, "low"),
            IncidentSeverity::Medium => write!(f, "medium"),
            IncidentSeverity::High => write!(f, "high"),
        }
    }
}

/// Database model for an incident zone
///
/// Also the unit of the cached active-zone snapshot, so it round-trips
/// through JSON as well as through sqlx.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: Uuid,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    /// Radius in meters
    pub radius: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::unchecked(self.latitude, self.longitude)
    }
}

/// Data for creating a new incident
#[derive(Debug)]
pub struct CreateIncident {
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub description: String,
    pub severity: IncidentSeverity,
    pub radius: f64,
}

/// Partial update; `None` leaves the column untouched
#[derive(Debug, Default)]
pub struct UpdateIncident {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<IncidentSeverity>,
    pub radius: Option<f64>,
    pub active: Option<bool>,
}

impl UpdateIncident {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.severity.is_none()
            && self.radius.is_none()
            && self.active.is_none()
    }
}

/// Distinct visitors per zone over a trailing window
#[derive(Debug, Clone, FromRow)]
pub struct IncidentStats {
    pub zone_id: Option<Uuid>,
    pub user_count: i64,
}
