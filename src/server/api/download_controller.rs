use axum::{
    Extension, Json, Router,
    body::Body,
    extract::Query,
    http::{HeaderMap, HeaderName, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use nanoid::nanoid;
use tracing::{error, info, warn};

use crate::server::dtos::download_dto::{
    DownloadQuery, IssueDownloadRequest, IssueDownloadResponse,
};
use crate::server::error::{AppResult, Error};
use crate::server::extractors::{ClientIdentity, ValidationExtractor};
use crate::server::services::app_services::AppServices;
use crate::server::services::download_services::DownloadService;

pub struct DownloadController;

impl DownloadController {
    pub fn app() -> Router {
        Router::new()
            .route("/link", post(Self::issue_link))
            .route("/", get(Self::redeem).options(Self::download_options))
    }

    /// exchange a content id + quality for a short-lived signed download url
    async fn issue_link(
        ClientIdentity(client_id): ClientIdentity,
        Extension(services): Extension<AppServices>,
        ValidationExtractor(request): ValidationExtractor<IssueDownloadRequest>,
    ) -> AppResult<Json<IssueDownloadResponse>> {
        let item = services.catalog.get_item(&request.content_id).await?;

        let link = services
            .downloads
            .resolve_link(&item, &request.quality)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no {} link for content {}",
                    request.quality, request.content_id
                ))
            })?;

        let token = services.tokens.issue(&request.content_id, &link.quality)?;

        info!(
            "issued download link: content {} quality {} client {}",
            request.content_id, link.quality, client_id
        );

        Ok(Json(IssueDownloadResponse {
            download_url: format!("/api/v1/download?token={}", urlencoding::encode(&token)),
            quality: link.quality.clone(),
            size: link.size.clone(),
            filename: DownloadService::build_filename(&item.title, &link.quality, &link.url),
            expires_in_seconds: services.config.download_token_ttl_minutes * 60,
        }))
    }

    /// the redirector: verify the token, resolve the target, pipe the bytes
    async fn redeem(
        ClientIdentity(client_id): ClientIdentity,
        Extension(services): Extension<AppServices>,
        Query(params): Query<DownloadQuery>,
    ) -> AppResult<Response> {
        let Some(token) = params.token else {
            return Err(Error::BadRequest("missing download token".to_string()));
        };

        let claims = match services.tokens.verify(&token) {
            Ok(claims) => claims,
            Err(kind) => {
                error!("download token rejected ({}): client {}", kind, client_id);
                metrics::counter!("download_token_rejections_total", "kind" => kind.kind_label())
                    .increment(1);
                return Err(Error::Unauthorized);
            }
        };

        let item = services.catalog.get_item(&claims.resource_id).await?;

        let link = services
            .downloads
            .resolve_link(&item, &claims.quality)
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no {} link for content {}",
                    claims.quality, claims.resource_id
                ))
            })?;

        let download_id = nanoid!(12);
        info!(
            "download initiated: id {} client {} title '{}' quality {}",
            download_id, client_id, item.title, link.quality
        );

        // advisory only, a flaky probe never blocks the download
        if !services.downloads.probe_reachable(&link.url).await {
            warn!("download {} target looks unreachable, proceeding anyway", download_id);
        }

        let upstream = services.downloads.fetch_stream(&link.url).await.map_err(|e| {
            metrics::counter!("download_upstream_failures_total").increment(1);
            e
        })?;

        metrics::counter!("downloads_started_total").increment(1);

        let filename = DownloadService::build_filename(&item.title, &link.quality, &link.url);
        let content_length = upstream.content_length();

        let mut response_headers = HeaderMap::new();
        response_headers.insert(
            header::CONTENT_TYPE,
            "application/octet-stream"
                .parse()
                .expect("Static header value should parse"),
        );
        response_headers.insert(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename)
                .parse()
                .map_err(|_| {
                    Error::InternalServerErrorWithContext(
                        "download filename is not a valid header value".to_string(),
                    )
                })?,
        );
        response_headers.insert(
            header::CACHE_CONTROL,
            "no-cache".parse().expect("Static header value should parse"),
        );
        response_headers.insert(
            HeaderName::from_static("x-download-id"),
            download_id
                .parse()
                .expect("Nanoid header value should parse"),
        );
        if let Some(length) = content_length {
            response_headers.insert(
                header::CONTENT_LENGTH,
                length
                    .to_string()
                    .parse()
                    .expect("Content length should parse"),
            );
        }

        let body = Body::from_stream(upstream.bytes_stream());

        Ok((StatusCode::OK, response_headers, body).into_response())
    }

    async fn download_options() -> impl IntoResponse {
        StatusCode::NO_CONTENT
    }
}
