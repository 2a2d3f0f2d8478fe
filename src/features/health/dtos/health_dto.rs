use serde::Serialize;
use utoipa::ToSchema;

use crate::features::notifications::workers::DispatchStats;

/// Reachability of one backing service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStatus {
    Connected,
    Disconnected,
}

impl From<bool> for DependencyStatus {
    fn from(reachable: bool) -> Self {
        if reachable {
            DependencyStatus::Connected
        } else {
            DependencyStatus::Disconnected
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DependenciesDto {
    pub database: DependencyStatus,
    pub redis: DependencyStatus,
}

/// Response DTO for the health endpoint
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthReportDto {
    /// `healthy` when every dependency is reachable
    pub status: String,
    pub services: DependenciesDto,
    /// Webhook delivery counters since startup
    pub dispatcher: DispatchStats,
}

impl HealthReportDto {
    pub fn new(database: bool, redis: bool, dispatcher: DispatchStats) -> Self {
        let status = if database && redis {
            "healthy"
        } else {
            "unhealthy"
        };

        Self {
            status: status.to_string(),
            services: DependenciesDto {
                database: database.into(),
                redis: redis.into(),
            },
            dispatcher,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.services.database == DependencyStatus::Connected
            && self.services.redis == DependencyStatus::Connected
    }
}
