use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};

use crate::core::config::ApiKeyConfig;
use crate::core::middleware::api_key_middleware;
use crate::features::incidents::handlers::{self, IncidentState};
use crate::features::incidents::services::IncidentService;

/// Create routes for the incidents feature
///
/// Every route requires the operator API key
pub fn routes(
    incident_service: Arc<IncidentService>,
    stats_window_minutes: i32,
    api_key: Arc<ApiKeyConfig>,
) -> Router {
    let state = IncidentState {
        incident_service,
        stats_window_minutes,
    };

    Router::new()
        .route(
            "/api/v1/incidents",
            get(handlers::list_incidents).post(handlers::create_incident),
        )
        .route("/api/v1/incidents/stats", get(handlers::get_incident_stats))
        .route(
            "/api/v1/incidents/{id}",
            get(handlers::get_incident)
                .put(handlers::update_incident)
                .delete(handlers::delete_incident),
        )
        .route_layer(from_fn_with_state(api_key, api_key_middleware))
        .with_state(state)
}
