use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::error::{AppError, Result};
use crate::features::locations::models::LocationCheckRecord;

/// Audit sink for location checks
#[async_trait]
pub trait CheckRecorder: Send + Sync {
    async fn record(&self, record: &LocationCheckRecord) -> Result<()>;
}

/// Appends check records to the `location_checks` table
pub struct PgCheckRecorder {
    pool: PgPool,
}

impl PgCheckRecorder {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckRecorder for PgCheckRecorder {
    async fn record(&self, record: &LocationCheckRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO location_checks (id, user_id, latitude, longitude, checked_at, has_alert, incident_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(record.latitude)
        .bind(record.longitude)
        .bind(record.checked_at)
        .bind(record.has_alert)
        .bind(record.incident_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record location check: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(())
    }
}
