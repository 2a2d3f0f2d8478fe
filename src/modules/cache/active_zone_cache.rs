use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;

use crate::core::config::CacheConfig;
use crate::features::incidents::models::Incident;
use crate::modules::cache::{CacheError, CacheResult};

/// Snapshot cache of the currently active incident zones
///
/// `Ok(None)` means nothing is cached (never set, expired or invalidated).
/// `Ok(Some(vec![]))` is a cached empty set and must not trigger a refill.
#[async_trait]
pub trait ActiveZoneCache: Send + Sync {
    async fn get(&self) -> CacheResult<Option<Vec<Incident>>>;

    /// Store a full snapshot with the configured TTL. Inactive zones are dropped.
    async fn set(&self, zones: &[Incident]) -> CacheResult<()>;

    /// Drop the snapshot so the next `get` misses
    async fn invalidate(&self) -> CacheResult<()>;
}

/// Redis-backed snapshot stored as one JSON value under a single key
#[derive(Clone)]
pub struct RedisActiveZoneCache {
    connection_manager: ConnectionManager,
    key: String,
    ttl: Duration,
}

impl std::fmt::Debug for RedisActiveZoneCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisActiveZoneCache")
            .field("key", &self.key)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl RedisActiveZoneCache {
    pub fn new(connection_manager: ConnectionManager, config: &CacheConfig) -> Self {
        Self {
            connection_manager,
            key: config.active_zones_key.clone(),
            ttl: config.ttl,
        }
    }
}

#[async_trait]
impl ActiveZoneCache for RedisActiveZoneCache {
    async fn get(&self) -> CacheResult<Option<Vec<Incident>>> {
        let mut conn = self.connection_manager.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(&self.key)
            .query_async(&mut conn)
            .await
            .map_err(|e| map_redis_error("GET", e))?;

        let zones = decode_snapshot(&self.key, raw);
        match &zones {
            Some(zones) => {
                tracing::debug!("Active zone cache HIT: {} ({} zones)", self.key, zones.len())
            }
            None => tracing::debug!("Active zone cache MISS: {}", self.key),
        }
        Ok(zones)
    }

    async fn set(&self, zones: &[Incident]) -> CacheResult<()> {
        let ttl_seconds = ttl_secs(self.ttl);
        let (cmd, stored) = snapshot_command(&self.key, ttl_seconds, zones)?;

        let mut conn = self.connection_manager.clone();
        cmd.query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_redis_error("SETEX", e))?;

        tracing::debug!(
            "Active zone cache SET: {} ({} zones, ttl={}s)",
            self.key,
            stored,
            ttl_seconds
        );
        Ok(())
    }

    async fn invalidate(&self) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("DEL")
            .arg(&self.key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| map_redis_error("DEL", e))?;

        tracing::debug!("Active zone cache invalidated: {}", self.key);
        Ok(())
    }
}

/// `SETEX` rejects a zero TTL, so sub-second TTLs round up to one second
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// Build the `SETEX` for a snapshot of the active zones in `zones`
///
/// Returns the command and the number of zones it stores.
fn snapshot_command(
    key: &str,
    ttl_seconds: u64,
    zones: &[Incident],
) -> CacheResult<(redis::Cmd, usize)> {
    let active: Vec<&Incident> = zones.iter().filter(|z| z.active).collect();
    let payload = serde_json::to_string(&active)
        .map_err(|e| CacheError::SerializationError(e.to_string()))?;

    let mut cmd = redis::cmd("SETEX");
    cmd.arg(key).arg(ttl_seconds).arg(payload);
    Ok((cmd, active.len()))
}

fn decode_snapshot(key: &str, raw: Option<String>) -> Option<Vec<Incident>> {
    let raw = raw?;

    match serde_json::from_str::<Vec<Incident>>(&raw) {
        Ok(zones) => Some(zones),
        Err(e) => {
            // An unreadable snapshot is as good as none; the refill overwrites it
            tracing::warn!(
                "Discarding undecodable active zone snapshot at {}: {}",
                key,
                e
            );
            None
        }
    }
}

fn map_redis_error(command: &str, e: redis::RedisError) -> CacheError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        CacheError::ConnectionError(format!("Redis {} failed: {}", command, e))
    } else {
        CacheError::BackendError(format!("Redis {} failed: {}", command, e))
    }
}
