use chrono::Utc;
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::incidents::models::Incident;
use crate::features::locations::models::{GeoPoint, LocationCheckRecord, LocationCheckResult};
use crate::features::locations::services::{match_zones, CheckRecorder, ZoneStore};
use crate::features::notifications::models::AlertPayload;
use crate::features::notifications::AlertPublisher;
use crate::modules::cache::ActiveZoneCache;

/// Runs a single location check end to end
///
/// Snapshot lookup and matching decide the result. Recording the check and
/// handing off the alert are best-effort and never fail the check.
pub struct LocationCheckService {
    zone_cache: Arc<dyn ActiveZoneCache>,
    zone_store: Arc<dyn ZoneStore>,
    recorder: Arc<dyn CheckRecorder>,
    publisher: AlertPublisher,
}

impl LocationCheckService {
    pub fn new(
        zone_cache: Arc<dyn ActiveZoneCache>,
        zone_store: Arc<dyn ZoneStore>,
        recorder: Arc<dyn CheckRecorder>,
        publisher: AlertPublisher,
    ) -> Self {
        Self {
            zone_cache,
            zone_store,
            recorder,
            publisher,
        }
    }

    pub async fn check(&self, user_id: &str, point: GeoPoint) -> Result<LocationCheckResult> {
        let zones = self.active_zones().await?;
        let matched = match_zones(point, &zones);
        let checked_at = Utc::now();

        let record = LocationCheckRecord::new(user_id, point, checked_at, &matched);
        if let Err(e) = self.recorder.record(&record).await {
            tracing::warn!("Location check for user {} not recorded: {}", user_id, e);
        }

        let alert_fired = match AlertPayload::for_matches(user_id, point, &matched, checked_at) {
            Some(payload) => {
                self.publisher.publish(payload);
                true
            }
            None => false,
        };

        if alert_fired {
            tracing::info!(
                "User {} is inside {} active zone(s)",
                user_id,
                matched.len()
            );
        }

        Ok(LocationCheckResult {
            matched,
            alert_fired,
        })
    }

    /// Cached snapshot, refilled from the store on a miss
    async fn active_zones(&self) -> Result<Vec<Incident>> {
        if let Some(zones) = self.zone_cache.get().await? {
            return Ok(zones);
        }

        tracing::debug!("Active zone cache miss, loading from store");
        let zones = self.zone_store.list_active().await?;

        if let Err(e) = self.zone_cache.set(&zones).await {
            tracing::warn!("Failed to refill active zone cache: {}", e);
        }

        Ok(zones)
    }
}
