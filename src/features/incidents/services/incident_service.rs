use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::incidents::models::{CreateIncident, Incident, IncidentStats, UpdateIncident};
use crate::features::locations::services::ZoneStore;
use crate::modules::cache::ActiveZoneCache;

const INCIDENT_COLUMNS: &str = "id, user_id, latitude, longitude, title, description, severity, radius, active, created_at, updated_at";

/// Service for incident zone operations
///
/// Every successful write drops the active-zone snapshot so the next
/// location check reloads it.
pub struct IncidentService {
    pool: PgPool,
    zone_cache: Arc<dyn ActiveZoneCache>,
}

impl IncidentService {
    pub fn new(pool: PgPool, zone_cache: Arc<dyn ActiveZoneCache>) -> Self {
        Self { pool, zone_cache }
    }

    /// Create a new active incident
    pub async fn create(&self, data: CreateIncident) -> Result<Incident> {
        let incident = sqlx::query_as::<_, Incident>(&format!(
            r#"
            INSERT INTO incidents (user_id, latitude, longitude, title, description, severity, radius)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            INCIDENT_COLUMNS
        ))
        .bind(&data.user_id)
        .bind(data.latitude)
        .bind(data.longitude)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.severity)
        .bind(data.radius)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create incident: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Incident {} created ({}, radius={}m)",
            incident.id,
            incident.severity,
            incident.radius
        );
        self.invalidate_zone_cache().await;

        Ok(incident)
    }

    /// Get incident by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<Incident> {
        let incident = sqlx::query_as::<_, Incident>(&format!(
            "SELECT {} FROM incidents WHERE id = $1",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get incident: {:?}", e);
            AppError::Database(e)
        })?;

        incident.ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))
    }

    /// List incidents, newest first, with the total count
    pub async fn list(
        &self,
        offset: i64,
        limit: i64,
        active_only: bool,
    ) -> Result<(Vec<Incident>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM incidents WHERE ($1 = FALSE OR active = TRUE)",
        )
        .bind(active_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count incidents: {:?}", e);
            AppError::Database(e)
        })?;

        let incidents = sqlx::query_as::<_, Incident>(&format!(
            r#"
            SELECT {}
            FROM incidents
            WHERE ($1 = FALSE OR active = TRUE)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
            INCIDENT_COLUMNS
        ))
        .bind(active_only)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list incidents: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((incidents, total))
    }

    /// Apply a partial update
    pub async fn update(&self, id: Uuid, data: UpdateIncident) -> Result<Incident> {
        if data.is_empty() {
            return self.get_by_id(id).await;
        }

        let incident = sqlx::query_as::<_, Incident>(&format!(
            r#"
            UPDATE incidents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                severity = COALESCE($4, severity),
                radius = COALESCE($5, radius),
                active = COALESCE($6, active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.severity)
        .bind(data.radius)
        .bind(data.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update incident: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound(format!("Incident {} not found", id)))?;

        tracing::info!("Incident {} updated", incident.id);
        self.invalidate_zone_cache().await;

        Ok(incident)
    }

    /// Deactivate an incident. The row is kept for history.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE incidents SET active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to deactivate incident: {:?}", e);
            AppError::Database(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Incident {} not found", id)));
        }

        tracing::info!("Incident {} deactivated", id);
        self.invalidate_zone_cache().await;

        Ok(())
    }

    /// Distinct users per matched zone over the trailing `minutes`
    pub async fn get_stats(&self, minutes: i32) -> Result<Vec<IncidentStats>> {
        sqlx::query_as::<_, IncidentStats>(
            r#"
            SELECT incident_id AS zone_id, COUNT(DISTINCT user_id) AS user_count
            FROM location_checks
            WHERE checked_at >= NOW() - make_interval(mins => $1)
            GROUP BY incident_id
            ORDER BY user_count DESC
            "#,
        )
        .bind(minutes)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get incident stats: {:?}", e);
            AppError::Database(e)
        })
    }

    /// A failed invalidation leaves the old snapshot live until its TTL runs out
    async fn invalidate_zone_cache(&self) {
        if let Err(e) = self.zone_cache.invalidate().await {
            tracing::warn!("Failed to invalidate active zone cache: {}", e);
        }
    }
}

#[async_trait]
impl ZoneStore for IncidentService {
    async fn list_active(&self) -> Result<Vec<Incident>> {
        sqlx::query_as::<_, Incident>(&format!(
            "SELECT {} FROM incidents WHERE active = TRUE ORDER BY created_at",
            INCIDENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list active incidents: {:?}", e);
            AppError::Database(e)
        })
    }
}
