use redis::aio::ConnectionManager;
use sqlx::PgPool;
use std::sync::Arc;

use crate::features::health::dtos::HealthReportDto;
use crate::features::notifications::workers::DispatchMetrics;

/// Probes the database and Redis, and reads the dispatcher counters
pub struct HealthService {
    pool: PgPool,
    redis: ConnectionManager,
    metrics: Arc<DispatchMetrics>,
}

impl HealthService {
    pub fn new(pool: PgPool, redis: ConnectionManager, metrics: Arc<DispatchMetrics>) -> Self {
        Self {
            pool,
            redis,
            metrics,
        }
    }

    pub async fn check(&self) -> HealthReportDto {
        let (database, redis) = tokio::join!(self.ping_database(), self.ping_redis());
        HealthReportDto::new(database, redis, self.metrics.snapshot())
    }

    async fn ping_database(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Health check: database unreachable: {:?}", e);
                false
            }
        }
    }

    async fn ping_redis(&self) -> bool {
        let mut conn = self.redis.clone();
        match redis::cmd("PING").query_async::<String>(&mut conn).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Health check: redis unreachable: {}", e);
                false
            }
        }
    }
}
