use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::features::incidents::models::Incident;
use crate::features::locations::models::GeoPoint;

/// Audit record of a single location check
///
/// Built once by the location check service and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationCheckRecord {
    pub id: Uuid,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub checked_at: DateTime<Utc>,
    pub has_alert: bool,
    /// First matched zone, in snapshot order
    pub incident_id: Option<Uuid>,
}

impl LocationCheckRecord {
    pub fn new(
        user_id: &str,
        point: GeoPoint,
        checked_at: DateTime<Utc>,
        matches: &[ZoneMatch],
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id: user_id.to_string(),
            latitude: point.latitude,
            longitude: point.longitude,
            checked_at,
            has_alert: !matches.is_empty(),
            incident_id: matches.first().map(|m| m.zone.id),
        }
    }
}

/// A zone whose radius contains the observer, with the measured distance
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMatch {
    pub zone: Incident,
    pub distance_meters: f64,
}

/// Outcome of a location check returned to the caller
#[derive(Debug, Clone)]
pub struct LocationCheckResult {
    pub matched: Vec<ZoneMatch>,
    pub alert_fired: bool,
}
