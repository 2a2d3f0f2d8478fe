use crate::core::config::DatabaseConfig;
use crate::core::redis_connection::redact_url;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
}

/// Connect the Postgres pool holding incidents and location checks
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(
        "Connecting to {} (max_connections={}, min_connections={})",
        redact_url(&config.url),
        config.max_connections,
        config.min_connections
    );
    pool_options(config).connect(&config.url).await
}
