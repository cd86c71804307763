use axum::{
    Extension, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    routing::{delete, get},
};
use tracing::debug;
use validator::Validate;

use crate::database::catalog::model::{CatalogRow, ContentItem};
use crate::server::dtos::content_dto::{ContentPageQuery, ContentPageResponse};
use crate::server::error::{AppResult, Error};
use crate::server::services::app_services::AppServices;

pub struct ContentController;

impl ContentController {
    pub fn app() -> Router {
        Router::new()
            .route("/", get(Self::list).put(Self::upsert))
            .route("/all", get(Self::list_all))
            .route("/cache", delete(Self::invalidate_cache))
            .route("/{id}", get(Self::detail))
    }

    /// one fixed-size page of the published collection, newest first
    async fn list(
        Extension(services): Extension<AppServices>,
        Query(query): Query<ContentPageQuery>,
    ) -> AppResult<Json<ContentPageResponse>> {
        query.validate()?;

        debug!("listing content page {} (size {})", query.page, query.page_size);

        let fetched = services.catalog.get_page(query.page, query.page_size).await?;

        Ok(Json(ContentPageResponse {
            count: fetched.items.len(),
            has_more: !fetched.is_last_page,
            total_count: fetched.total_count,
            items: fetched.items,
            page: query.page,
            page_size: query.page_size,
        }))
    }

    async fn detail(
        Extension(services): Extension<AppServices>,
        Path(id): Path<String>,
    ) -> AppResult<Json<ContentItem>> {
        let item = services.catalog.get_item(&id).await?;
        Ok(Json(item))
    }

    /// the whole published collection from the warm cache; heavyweight, meant
    /// for clients that build their own local search index
    async fn list_all(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<Json<Vec<ContentItem>>> {
        let items = services.catalog.all_published().await?;
        Ok(Json(items))
    }

    async fn upsert(
        Extension(services): Extension<AppServices>,
        Json(row): Json<CatalogRow>,
    ) -> AppResult<StatusCode> {
        if row.record_id <= 0 {
            return Err(Error::InvalidInput("record_id must be positive".to_string()));
        }
        if row.title.trim().is_empty() {
            return Err(Error::InvalidInput("title is required".to_string()));
        }

        services.catalog.upsert_row(row).await?;

        Ok(StatusCode::NO_CONTENT)
    }

    async fn invalidate_cache(
        Extension(services): Extension<AppServices>,
    ) -> AppResult<StatusCode> {
        services.catalog.invalidate_cache().await;
        Ok(StatusCode::NO_CONTENT)
    }
}
