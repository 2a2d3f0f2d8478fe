mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::redis_connection::{create_connection_manager, COMMAND_RESPONSE_TIMEOUT};
use crate::core::{database, middleware};
use crate::features::health::{routes as health_routes, HealthService};
use crate::features::incidents::{routes as incidents_routes, IncidentService};
use crate::features::locations::{routes as locations_routes, LocationCheckService, PgCheckRecorder};
use crate::features::notifications::{
    run_forwarder, AlertPublisher, DispatchMetrics, NotificationDispatcher, RetryPolicy,
    WebhookClient,
};
use crate::modules::cache::RedisActiveZoneCache;
use crate::modules::queue::RedisNotificationQueue;
use axum::{middleware::from_fn, Router};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Upper bound on waiting for background workers after the server stops
const WORKER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    // Database
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Redis: one shared connection for cache, producers and health, one for
    // the blocking queue consumer
    let redis = create_connection_manager(&config.redis, COMMAND_RESPONSE_TIMEOUT)
        .await
        .map_err(|e| anyhow::anyhow!("Redis connection failed: {}", e))?;
    let redis_consumer = create_connection_manager(
        &config.redis,
        config.queue.poll_interval + COMMAND_RESPONSE_TIMEOUT,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Redis consumer connection failed: {}", e))?;
    tracing::info!("Redis connections established");

    let zone_cache = Arc::new(RedisActiveZoneCache::new(redis.clone(), &config.cache));
    let queue = Arc::new(RedisNotificationQueue::new(
        redis.clone(),
        redis_consumer,
        &config.queue,
    ));

    // Services
    let incident_service = Arc::new(IncidentService::new(pool.clone(), zone_cache.clone()));
    let check_recorder = Arc::new(PgCheckRecorder::new(pool.clone()));
    let (publisher, alert_rx) = AlertPublisher::new(config.queue.channel_capacity);
    let location_check_service = Arc::new(LocationCheckService::new(
        zone_cache,
        incident_service.clone(),
        check_recorder,
        publisher,
    ));
    let dispatch_metrics = Arc::new(DispatchMetrics::default());
    let health_service = Arc::new(HealthService::new(
        pool.clone(),
        redis,
        dispatch_metrics.clone(),
    ));
    tracing::info!("Services initialized");

    // Background workers
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let forwarder_handle = tokio::spawn(run_forwarder(
        alert_rx,
        queue.clone(),
        shutdown_rx.clone(),
    ));

    let webhook_client = WebhookClient::new(&config.webhook)
        .map_err(|e| anyhow::anyhow!("Webhook client setup failed: {}", e))?;
    tracing::info!("Webhook target: {}", webhook_client.url());
    let dispatcher = NotificationDispatcher::new(
        queue,
        Arc::new(webhook_client),
        RetryPolicy::from_config(&config.webhook),
        dispatch_metrics,
    );
    let dispatcher_rx = shutdown_rx.clone();
    let dispatcher_handle = tokio::spawn(async move { dispatcher.run(dispatcher_rx).await });
    tracing::info!("Alert forwarder and notification dispatcher spawned");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Operator routes (require X-API-Key)
    let protected_routes = incidents_routes(
        incident_service,
        config.stats.window_minutes,
        Arc::new(config.api_key.clone()),
    );

    // Public routes
    let public_routes = Router::new()
        .merge(locations_routes(location_check_service))
        .merge(health_routes(health_service));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(public_routes)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(Duration::from_secs(60))
            .with_interval(Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    serve_then_stop_workers(listener, app, shutdown_signal(), shutdown_tx).await?;

    // In-flight deliveries finish their retry sequence before the dispatcher exits
    let workers = async {
        if let Err(e) = forwarder_handle.await {
            tracing::error!("Alert forwarder task failed: {}", e);
        }
        if let Err(e) = dispatcher_handle.await {
            tracing::error!("Notification dispatcher task failed: {}", e);
        }
    };
    if tokio::time::timeout(WORKER_SHUTDOWN_TIMEOUT, workers)
        .await
        .is_err()
    {
        tracing::warn!(
            "Background workers still running after {:?}, exiting anyway",
            WORKER_SHUTDOWN_TIMEOUT
        );
    }

    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Serve until `signal` fires and in-flight requests have drained, then
/// tell the background workers to stop
///
/// Workers outlive the server so alerts published by the last requests
/// still reach the queue.
async fn serve_then_stop_workers<F>(
    listener: tokio::net::TcpListener,
    app: Router,
    signal: F,
    shutdown_tx: watch::Sender<bool>,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(signal)
        .await;

    tracing::info!("HTTP server stopped, stopping background workers");
    let _ = shutdown_tx.send(true);

    result
}

/// Resolves on Ctrl-C (or SIGTERM on unix)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::queue::NotificationQueue;
    use crate::shared::test_helpers::{sample_payload, InMemoryNotificationQueue};
    use axum::routing::get;
    use tokio::sync::{oneshot, Notify};

    #[tokio::test]
    async fn test_alert_from_draining_request_reaches_queue() {
        let queue = Arc::new(InMemoryNotificationQueue::default());
        let (publisher, alert_rx) = AlertPublisher::new(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let forwarder = tokio::spawn(run_forwarder(
            alert_rx,
            queue.clone() as Arc<dyn NotificationQueue>,
            shutdown_rx,
        ));

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let app = {
            let entered = entered.clone();
            let release = release.clone();
            Router::new().route(
                "/check",
                get(move || async move {
                    entered.notify_one();
                    release.notified().await;
                    publisher.publish(sample_payload("draining-user"));
                    "ok"
                }),
            )
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_then_stop_workers(
            listener,
            app,
            async move {
                let _ = stop_rx.await;
            },
            shutdown_tx,
        ));

        let request = tokio::spawn(async move {
            reqwest::get(format!("http://{}/check", addr)).await
        });

        // Shutdown arrives while the request is still being handled
        entered.notified().await;
        stop_tx.send(()).unwrap();
        tokio::task::yield_now().await;
        release.notify_one();

        let response = request.await.unwrap().unwrap();
        assert!(response.status().is_success());

        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        tokio::time::timeout(Duration::from_secs(5), forwarder)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(queue.user_ids(), vec!["draining-user".to_string()]);
    }
}
