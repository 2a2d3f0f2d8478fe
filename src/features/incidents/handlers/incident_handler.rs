use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::incidents::dtos::{
    CreateIncidentDto, IncidentListQuery, IncidentResponseDto, IncidentStatsDto,
    IncidentStatsQuery, UpdateIncidentDto,
};
use crate::features::incidents::services::IncidentService;
use crate::shared::types::{ApiResponse, Meta};

/// State for incident handlers
#[derive(Clone)]
pub struct IncidentState {
    pub incident_service: Arc<IncidentService>,
    /// Stats window used when the query omits `minutes`
    pub stats_window_minutes: i32,
}

/// Create an incident zone
#[utoipa::path(
    post,
    path = "/api/v1/incidents",
    request_body = CreateIncidentDto,
    responses(
        (status = 201, description = "Incident created", body = ApiResponse<IncidentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn create_incident(
    State(state): State<IncidentState>,
    AppJson(dto): AppJson<CreateIncidentDto>,
) -> Result<(StatusCode, Json<ApiResponse<IncidentResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let incident = state.incident_service.create(dto.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(incident.into()),
            Some("Incident created".to_string()),
            None,
        )),
    ))
}

/// List incidents, newest first
#[utoipa::path(
    get,
    path = "/api/v1/incidents",
    params(IncidentListQuery),
    responses(
        (status = 200, description = "Paginated incidents", body = ApiResponse<Vec<IncidentResponseDto>>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn list_incidents(
    State(state): State<IncidentState>,
    Query(params): Query<IncidentListQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentResponseDto>>>> {
    params
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let (incidents, total) = state
        .incident_service
        .list(params.offset(), params.limit(), params.active_only)
        .await?;

    let dtos: Vec<IncidentResponseDto> = incidents.into_iter().map(|i| i.into()).collect();

    Ok(Json(ApiResponse::success(
        Some(dtos),
        None,
        Some(Meta {
            total,
            page: params.page(),
            page_size: params.limit(),
        }),
    )))
}

/// Get incident by ID
#[utoipa::path(
    get,
    path = "/api/v1/incidents/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident found", body = ApiResponse<IncidentResponseDto>),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Incident not found")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn get_incident(
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<IncidentResponseDto>>> {
    let incident = state.incident_service.get_by_id(id).await?;
    Ok(Json(ApiResponse::success(Some(incident.into()), None, None)))
}

/// Partially update an incident
#[utoipa::path(
    put,
    path = "/api/v1/incidents/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    request_body = UpdateIncidentDto,
    responses(
        (status = 200, description = "Incident updated", body = ApiResponse<IncidentResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Incident not found")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn update_incident(
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateIncidentDto>,
) -> Result<Json<ApiResponse<IncidentResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let incident = state.incident_service.update(id, dto.into()).await?;

    Ok(Json(ApiResponse::success(
        Some(incident.into()),
        Some("Incident updated".to_string()),
        None,
    )))
}

/// Deactivate an incident
#[utoipa::path(
    delete,
    path = "/api/v1/incidents/{id}",
    params(
        ("id" = Uuid, Path, description = "Incident ID")
    ),
    responses(
        (status = 200, description = "Incident deactivated"),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key"),
        (status = 404, description = "Incident not found")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn delete_incident(
    State(state): State<IncidentState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    state.incident_service.delete(id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Incident deactivated".to_string()),
        None,
    )))
}

/// Distinct visitors per zone over a trailing window
#[utoipa::path(
    get,
    path = "/api/v1/incidents/stats",
    params(IncidentStatsQuery),
    responses(
        (status = 200, description = "Visitor counts per zone", body = ApiResponse<Vec<IncidentStatsDto>>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing API key"),
        (status = 403, description = "Invalid API key")
    ),
    security(("api_key" = [])),
    tag = "incidents"
)]
pub async fn get_incident_stats(
    State(state): State<IncidentState>,
    Query(params): Query<IncidentStatsQuery>,
) -> Result<Json<ApiResponse<Vec<IncidentStatsDto>>>> {
    params
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let minutes = params.minutes.unwrap_or(state.stats_window_minutes);
    let stats = state.incident_service.get_stats(minutes).await?;
    let dtos: Vec<IncidentStatsDto> = stats.into_iter().map(|s| s.into()).collect();

    Ok(Json(ApiResponse::success(Some(dtos), None, None)))
}
