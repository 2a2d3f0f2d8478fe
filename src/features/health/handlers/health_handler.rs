use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::features::health::dtos::HealthReportDto;
use crate::features::health::services::HealthService;
use crate::shared::types::ApiResponse;

/// Service health
///
/// Returns 503 when the database or Redis is unreachable.
#[utoipa::path(
    get,
    path = "/api/v1/system/health",
    responses(
        (status = 200, description = "All dependencies reachable", body = ApiResponse<HealthReportDto>),
        (status = 503, description = "A dependency is unreachable", body = ApiResponse<HealthReportDto>)
    ),
    tag = "system"
)]
pub async fn health_check(
    State(service): State<Arc<HealthService>>,
) -> (StatusCode, Json<ApiResponse<HealthReportDto>>) {
    let report = service.check().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(ApiResponse::success(Some(report), None, None)))
}
