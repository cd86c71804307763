pub mod api;
pub mod dtos;
pub mod error;
pub mod extractors;
pub mod services;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Extension, Router};
use lazy_static::lazy_static;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::AppConfig;
use crate::database::RedisDatabase;
use crate::server::api::content_controller::ContentController;
use crate::server::api::download_controller::DownloadController;
use crate::server::api::health_controller::health_endpoint;
use crate::server::services::app_services::AppServices;

lazy_static! {
    static ref SERVER_STARTED_AT: Instant = Instant::now();
}

pub fn get_uptime_seconds() -> u64 {
    SERVER_STARTED_AT.elapsed().as_secs()
}

pub fn get_app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub struct ApplicationServer;

impl ApplicationServer {
    pub async fn serve(config: Arc<AppConfig>, redis_db: RedisDatabase) -> anyhow::Result<()> {
        // pin the uptime epoch to server start, not first health request
        lazy_static::initialize(&SERVER_STARTED_AT);

        let port = config.port;
        let cors = Self::build_cors(&config.cors_origin)?;

        let metrics_handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install metrics recorder")?;

        let services = AppServices::new(redis_db, config);

        let router = Router::new()
            .nest(
                "/api/v1",
                Router::new()
                    .nest("/content", ContentController::app())
                    .nest("/download", DownloadController::app())
                    .route("/health", get(health_endpoint)),
            )
            .route(
                "/metrics",
                get(move || {
                    let handle = metrics_handle.clone();
                    async move { handle.render() }
                }),
            )
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(cors),
            )
            .layer(Extension(services));

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;

        info!("server listening on port {}", port);

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .context("server stopped unexpectedly")?;

        Ok(())
    }

    fn build_cors(origin: &str) -> anyhow::Result<CorsLayer> {
        if origin.trim() == "*" {
            return Ok(CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any));
        }

        let origins = origin
            .split(',')
            .map(|o| o.trim().parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .context("invalid cors origin in config")?;

        Ok(CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any))
    }
}
