use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::features::incidents::models::IncidentSeverity;
use crate::features::locations::models::{GeoPoint, ZoneMatch};

/// Event tag carried by every location alert
pub const LOCATION_ALERT_EVENT: &str = "location_alert";

/// Webhook body for a location that fell inside one or more zones
///
/// This is both the unit stored on the notification queue and the JSON
/// posted to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub event_type: String,
    pub user_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub incidents: Vec<ZoneSummary>,
    pub timestamp: DateTime<Utc>,
}

/// Projection of a matched zone taken at match time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneSummary {
    pub id: Uuid,
    pub title: String,
    pub severity: IncidentSeverity,
    /// Distance from the observer in meters
    pub distance: f64,
}

impl From<&ZoneMatch> for ZoneSummary {
    fn from(m: &ZoneMatch) -> Self {
        Self {
            id: m.zone.id,
            title: m.zone.title.clone(),
            severity: m.zone.severity,
            distance: m.distance_meters,
        }
    }
}

impl AlertPayload {
    /// Build the alert for a check. Returns `None` when nothing matched.
    pub fn for_matches(
        user_id: &str,
        observer: GeoPoint,
        matches: &[ZoneMatch],
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        if matches.is_empty() {
            return None;
        }

        Some(Self {
            event_type: LOCATION_ALERT_EVENT.to_string(),
            user_id: user_id.to_string(),
            latitude: observer.latitude,
            longitude: observer.longitude,
            incidents: matches.iter().map(ZoneSummary::from).collect(),
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::incident_at;

    fn zone_match(distance_meters: f64) -> ZoneMatch {
        ZoneMatch {
            zone: incident_at(10.0, 10.0, 2000.0),
            distance_meters,
        }
    }

    #[test]
    fn test_no_payload_without_matches() {
        let observer = GeoPoint::new(10.0, 10.0).unwrap();
        assert!(AlertPayload::for_matches("user-1", observer, &[], Utc::now()).is_none());
    }

    #[test]
    fn test_payload_keeps_match_order_and_distances() {
        let observer = GeoPoint::new(10.0, 10.0).unwrap();
        let matches = vec![zone_match(1500.0), zone_match(20.0)];

        let payload = AlertPayload::for_matches("user-1", observer, &matches, Utc::now()).unwrap();

        assert_eq!(payload.event_type, "location_alert");
        assert_eq!(payload.incidents.len(), 2);
        assert_eq!(payload.incidents[0].id, matches[0].zone.id);
        assert_eq!(payload.incidents[0].distance, 1500.0);
        assert_eq!(payload.incidents[1].distance, 20.0);
    }

    #[test]
    fn test_payload_wire_format() {
        let observer = GeoPoint::new(55.75, 37.61).unwrap();
        let matches = vec![zone_match(42.5)];
        let payload = AlertPayload::for_matches("user-7", observer, &matches, Utc::now()).unwrap();

        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["event_type"], "location_alert");
        assert_eq!(value["user_id"], "user-7");
        assert_eq!(value["latitude"], 55.75);
        assert_eq!(value["longitude"], 37.61);
        assert_eq!(value["incidents"][0]["severity"], "high");
        assert_eq!(value["incidents"][0]["distance"], 42.5);
        assert_eq!(value["incidents"][0]["title"], "Test incident");
        assert!(value["timestamp"].is_string());
    }
}
