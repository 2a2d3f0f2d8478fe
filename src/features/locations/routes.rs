use std::sync::Arc;

use axum::{routing::post, Router};

use crate::features::locations::handlers;
use crate::features::locations::services::LocationCheckService;

/// Create routes for the locations feature
///
/// Note: This feature is public (no API key required)
pub fn routes(service: Arc<LocationCheckService>) -> Router {
    Router::new()
        .route("/api/v1/location/check", post(handlers::check_location))
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use tokio::sync::mpsc;

    use crate::features::incidents::models::Incident;
    use crate::features::notifications::models::AlertPayload;
    use crate::features::notifications::AlertPublisher;
    use crate::shared::test_helpers::{
        incident_at, InMemoryZoneCache, InMemoryZoneStore, RecordingCheckRecorder,
    };

    fn server_with(
        zones: Vec<Incident>,
        cache: Arc<InMemoryZoneCache>,
    ) -> (TestServer, mpsc::Receiver<AlertPayload>) {
        let (publisher, alerts) = AlertPublisher::new(8);
        let service = LocationCheckService::new(
            cache,
            Arc::new(InMemoryZoneStore::new(zones)),
            Arc::new(RecordingCheckRecorder::default()),
            publisher,
        );

        (TestServer::new(routes(Arc::new(service))).unwrap(), alerts)
    }

    #[tokio::test]
    async fn test_location_inside_zone() {
        let zone = incident_at(10.0, 10.0, 2000.0);
        let (server, mut alerts) =
            server_with(vec![zone.clone()], Arc::new(InMemoryZoneCache::default()));

        let response = server
            .post("/api/v1/location/check")
            .json(&json!({ "user_id": "user-1", "latitude": 10.0, "longitude": 10.0 }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["has_alert"], true);
        assert_eq!(body["data"]["incidents"][0]["id"], zone.id.to_string());
        assert_eq!(body["data"]["incidents"][0]["title"], "Test incident");
        assert_eq!(body["data"]["incidents"][0]["distance"], 0.0);

        assert_eq!(alerts.recv().await.unwrap().user_id, "user-1");
    }

    #[tokio::test]
    async fn test_location_outside_all_zones() {
        let (server, mut alerts) = server_with(
            vec![incident_at(10.0, 10.0, 2000.0)],
            Arc::new(InMemoryZoneCache::default()),
        );

        let response = server
            .post("/api/v1/location/check")
            .json(&json!({ "user_id": "user-1", "latitude": 10.05, "longitude": 10.0 }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["data"]["has_alert"], false);
        assert_eq!(body["data"]["incidents"], json!([]));
        assert!(alerts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_out_of_range_latitude_is_rejected() {
        let (server, _alerts) = server_with(vec![], Arc::new(InMemoryZoneCache::default()));

        let response = server
            .post("/api/v1/location/check")
            .json(&json!({ "user_id": "user-1", "latitude": 91.0, "longitude": 0.0 }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert!(body["errors"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let (server, _alerts) = server_with(vec![], Arc::new(InMemoryZoneCache::default()));

        let response = server
            .post("/api/v1/location/check")
            .json(&json!({ "user_id": "user-1", "latitude": "north" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_cache_outage_is_service_unavailable() {
        let cache = Arc::new(InMemoryZoneCache::default());
        cache.fail_gets(true);
        let (server, _alerts) = server_with(vec![incident_at(10.0, 10.0, 2000.0)], cache);

        let response = server
            .post("/api/v1/location/check")
            .json(&json!({ "user_id": "user-1", "latitude": 10.0, "longitude": 10.0 }))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }
}
