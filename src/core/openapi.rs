use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::health::{dtos as health_dtos, handlers as health_handlers};
use crate::features::incidents::{
    dtos as incidents_dtos, handlers as incidents_handlers, models as incidents_models,
};
use crate::features::locations::{dtos as locations_dtos, handlers as locations_handlers};
use crate::features::notifications::workers::DispatchStats;
use crate::shared::constants::API_KEY_HEADER;
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Locations (public)
        locations_handlers::check_location,
        // Incidents (API key)
        incidents_handlers::create_incident,
        incidents_handlers::list_incidents,
        incidents_handlers::get_incident,
        incidents_handlers::update_incident,
        incidents_handlers::delete_incident,
        incidents_handlers::get_incident_stats,
        // System (public)
        health_handlers::health_check,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Locations
            locations_dtos::LocationCheckRequestDto,
            locations_dtos::LocationCheckResponseDto,
            locations_dtos::NearbyIncidentDto,
            ApiResponse<locations_dtos::LocationCheckResponseDto>,
            // Incidents
            incidents_models::IncidentSeverity,
            incidents_dtos::CreateIncidentDto,
            incidents_dtos::UpdateIncidentDto,
            incidents_dtos::IncidentResponseDto,
            incidents_dtos::IncidentStatsDto,
            ApiResponse<incidents_dtos::IncidentResponseDto>,
            ApiResponse<Vec<incidents_dtos::IncidentResponseDto>>,
            ApiResponse<Vec<incidents_dtos::IncidentStatsDto>>,
            // System
            DispatchStats,
            health_dtos::DependencyStatus,
            health_dtos::DependenciesDto,
            health_dtos::HealthReportDto,
            ApiResponse<health_dtos::HealthReportDto>,
        )
    ),
    tags(
        (name = "locations", description = "Location checks against active incident zones (public)"),
        (name = "incidents", description = "Incident zone management (operator API key)"),
        (name = "system", description = "Service health"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Geofence Alert API",
        version = "0.1.0",
        description = "Incident zones, location checks and webhook alerts",
    )
)]
pub struct ApiDoc;

/// Adds the operator API key security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(API_KEY_HEADER))),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_every_route() {
        let spec = ApiDoc::openapi();

        for path in [
            "/api/v1/location/check",
            "/api/v1/incidents",
            "/api/v1/incidents/{id}",
            "/api/v1/incidents/stats",
            "/api/v1/system/health",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_info_modifier_overrides_title() {
        let mut spec = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Staging".to_string(),
            version: "9.9.9".to_string(),
            description: "staging docs".to_string(),
        }
        .modify(&mut spec);

        assert_eq!(spec.info.title, "Staging");
        assert_eq!(spec.info.version, "9.9.9");
    }
}
