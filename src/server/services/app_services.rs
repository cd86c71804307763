use std::sync::Arc;

use tracing::info;

use crate::{
    config::AppConfig,
    database::RedisDatabase,
    database::catalog::{DynCatalogRepository, RedisCatalogRepository},
    server::services::{
        catalog_services::CatalogService, download_services::DownloadService,
        token_services::DownloadTokenService,
    },
};

use super::catalog_services::DynCatalogService;

/// everything the controllers need, injected as one axum Extension
#[derive(Clone)]
pub struct AppServices {
    pub tokens: Arc<DownloadTokenService>,
    pub catalog: DynCatalogService,
    pub downloads: Arc<DownloadService>,
    pub http: reqwest::Client,
    pub redis: Arc<RedisDatabase>,
    pub config: Arc<AppConfig>,
}

impl AppServices {
    pub fn new(redis_db: RedisDatabase, config: Arc<AppConfig>) -> Self {
        info!("starting application services...");

        let tokens = Arc::new(DownloadTokenService::new(
            config.download_token_secret.clone(),
            config.download_token_ttl_minutes,
        ));

        info!("token service ok, starting remaining services...");
        let redis = Arc::new(redis_db);

        // shared http client, reused by the download service
        let http = reqwest::Client::new();

        let repository =
            Arc::new(RedisCatalogRepository::new(redis.clone())) as DynCatalogRepository;

        let catalog = Arc::new(CatalogService::new(repository)) as DynCatalogService;

        let downloads = Arc::new(DownloadService::new(http.clone()));

        Self {
            tokens,
            catalog,
            downloads,
            http,
            redis,
            config,
        }
    }
}
