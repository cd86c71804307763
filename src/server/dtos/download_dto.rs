use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct IssueDownloadRequest {
    #[validate(length(min = 1, message = "content_id is required"))]
    pub content_id: String,

    #[validate(length(min = 1, message = "quality is required"))]
    pub quality: String,
}

#[derive(Debug, Serialize)]
pub struct IssueDownloadResponse {
    pub download_url: String,
    pub quality: String,
    pub size: String,
    pub filename: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: Option<String>,
}
