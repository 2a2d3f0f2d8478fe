use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::locations::dtos::{LocationCheckRequestDto, LocationCheckResponseDto};
use crate::features::locations::models::GeoPoint;
use crate::features::locations::services::LocationCheckService;
use crate::shared::types::ApiResponse;

/// Check a location against the active incident zones
///
/// Public endpoint. When the location falls inside one or more zones an
/// alert is queued for webhook delivery; the response does not wait for it.
#[utoipa::path(
    post,
    path = "/api/v1/location/check",
    request_body = LocationCheckRequestDto,
    responses(
        (status = 200, description = "Zones containing the location", body = ApiResponse<LocationCheckResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 503, description = "Zone cache unavailable")
    ),
    tag = "locations"
)]
pub async fn check_location(
    State(service): State<Arc<LocationCheckService>>,
    AppJson(dto): AppJson<LocationCheckRequestDto>,
) -> Result<Json<ApiResponse<LocationCheckResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let point = GeoPoint::new(dto.latitude, dto.longitude)?;
    let result = service.check(&dto.user_id, point).await?;

    Ok(Json(ApiResponse::success(Some(result.into()), None, None)))
}
