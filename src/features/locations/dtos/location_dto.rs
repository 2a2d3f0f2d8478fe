use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::incidents::dtos::IncidentResponseDto;
use crate::features::locations::models::{LocationCheckResult, ZoneMatch};

/// Request DTO for a location check
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LocationCheckRequestDto {
    #[validate(length(min = 1, max = 255, message = "user_id must be 1-255 characters"))]
    pub user_id: String,

    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be between -180 and 180"))]
    pub longitude: f64,
}

/// A matched zone with the observer's distance to its center
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NearbyIncidentDto {
    #[serde(flatten)]
    pub incident: IncidentResponseDto,
    /// Distance in meters
    pub distance: f64,
}

impl From<ZoneMatch> for NearbyIncidentDto {
    fn from(m: ZoneMatch) -> Self {
        Self {
            incident: m.zone.into(),
            distance: m.distance_meters,
        }
    }
}

/// Response DTO for a location check
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationCheckResponseDto {
    /// Zones containing the location, in snapshot order
    pub incidents: Vec<NearbyIncidentDto>,
    pub has_alert: bool,
}

impl From<LocationCheckResult> for LocationCheckResponseDto {
    fn from(result: LocationCheckResult) -> Self {
        Self {
            incidents: result.matched.into_iter().map(|m| m.into()).collect(),
            has_alert: result.alert_fired,
        }
    }
}
