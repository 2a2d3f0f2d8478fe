use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::incidents::models::Incident;

/// Source of truth for zones, read when the snapshot cache misses
#[async_trait]
pub trait ZoneStore: Send + Sync {
    /// All active zones, oldest first
    async fn list_active(&self) -> Result<Vec<Incident>>;
}
