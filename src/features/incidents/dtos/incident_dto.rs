use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::incidents::models::{
    CreateIncident, Incident, IncidentSeverity, IncidentStats, UpdateIncident,
};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE, MAX_PAGE_SIZE};

/// Request DTO for creating an incident zone
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateIncidentDto {
    /// Operator who registered the incident
    #[validate(length(min = 1, max = 255, message = "user_id must be 1-255 characters"))]
    pub user_id: String,

    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be between -180 and 180"))]
    pub longitude: f64,

    #[validate(length(min = 3, max = 255, message = "title must be 3-255 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 1000, message = "description must not exceed 1000 characters"))]
    pub description: String,

    pub severity: IncidentSeverity,

    /// Zone radius in meters
    #[validate(range(min = 10.0, max = 5000.0, message = "radius must be between 10 and 5000 meters"))]
    pub radius: f64,
}

impl From<CreateIncidentDto> for CreateIncident {
    fn from(dto: CreateIncidentDto) -> Self {
        Self {
            user_id: dto.user_id,
            latitude: dto.latitude,
            longitude: dto.longitude,
            title: dto.title,
            description: dto.description,
            severity: dto.severity,
            radius: dto.radius,
        }
    }
}

/// Request DTO for a partial incident update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateIncidentDto {
    #[validate(length(min = 3, max = 255, message = "title must be 3-255 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 1000, message = "description must not exceed 1000 characters"))]
    pub description: Option<String>,

    pub severity: Option<IncidentSeverity>,

    #[validate(range(min = 10.0, max = 5000.0, message = "radius must be between 10 and 5000 meters"))]
    pub radius: Option<f64>,

    pub active: Option<bool>,
}

impl From<UpdateIncidentDto> for UpdateIncident {
    fn from(dto: UpdateIncidentDto) -> Self {
        Self {
            title: dto.title,
            description: dto.description,
            severity: dto.severity,
            radius: dto.radius,
            active: dto.active,
        }
    }
}

/// Response DTO for incident
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IncidentResponseDto {
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

impl From<Incident> for IncidentResponseDto {
    fn from(i: Incident) -> Self {
        Self {
            id: i.id,
            user_id: i.user_id,
            latitude: i.latitude,
            longitude: i.longitude,
            title: i.title,
            description: i.description,
            severity: i.severity,
            radius: i.radius,
            active: i.active,
            created_at: i.created_at,
            updated_at: i.updated_at,
        }
    }
}

/// Query params for listing incidents
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct IncidentListQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1, maximum = 1000000)]
    #[validate(range(min = 1, max = 1000000, message = "page must be between 1 and 1000000"))]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Only return active incidents
    #[serde(default)]
    pub active_only: bool,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl IncidentListQuery {
    pub fn page(&self) -> i64 {
        self.page.clamp(1, MAX_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

/// Query params for visitor stats
#[derive(Debug, Clone, Deserialize, Validate, IntoParams)]
pub struct IncidentStatsQuery {
    /// Trailing window in minutes (defaults to the configured window)
    #[validate(range(min = 1, max = 43200, message = "minutes must be between 1 and 43200"))]
    pub minutes: Option<i32>,
}

/// Distinct users seen inside a zone over the window
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IncidentStatsDto {
    /// `null` groups checks that matched no zone
    pub zone_id: Option<Uuid>,
    pub user_count: i64,
}

impl From<IncidentStats> for IncidentStatsDto {
    fn from(s: IncidentStats) -> Self {
        Self {
            zone_id: s.zone_id,
            user_count: s.user_count,
        }
    }
}
