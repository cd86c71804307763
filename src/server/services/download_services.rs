use std::time::Duration;

use axum::http::StatusCode;
use tracing::{debug, warn};

use crate::database::catalog::model::{ContentItem, DownloadLink};
use crate::server::error::{AppResult, Error};

/// how long the reachability probe is allowed to take before we stop caring
const PROBE_TIMEOUT: Duration = Duration::from_secs(4);

const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// Resolves catalog links into actual downloads: picks the right rendition,
/// probes the host, and opens the upstream byte stream for piping.
pub struct DownloadService {
    http: reqwest::Client,
}

impl DownloadService {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Find the link matching the requested quality, checking the movie links
    /// first and then every episode of every season. Quality comparison is
    /// case-insensitive.
    pub fn resolve_link<'a>(&self, item: &'a ContentItem, quality: &str) -> Option<&'a DownloadLink> {
        let wanted = quality.to_uppercase();

        if let Some(link) = item
            .download_links
            .iter()
            .find(|link| link.quality.to_uppercase() == wanted)
        {
            return Some(link);
        }

        item.seasons
            .iter()
            .flat_map(|season| &season.episodes)
            .flat_map(|episode| &episode.links)
            .find(|link| link.quality.to_uppercase() == wanted)
    }

    /// Quick HEAD probe with a byte-range ask. The result is advisory: a
    /// timeout or transport error is treated as reachable, since a slow host
    /// shouldn't block a download that might still work.
    pub async fn probe_reachable(&self, url: &str) -> bool {
        let result = self
            .http
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .header(reqwest::header::RANGE, "bytes=0-1")
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                let ok = status.is_success() || status == StatusCode::PARTIAL_CONTENT;
                if !ok {
                    warn!("reachability probe for {} returned {}", url, status);
                }
                ok
            }
            Err(e) => {
                warn!("reachability probe for {} failed, assuming reachable: {}", url, e);
                true
            }
        }
    }

    /// Open the upstream file for streaming. Identity encoding is requested so
    /// bytes can be piped through without recompression.
    pub async fn fetch_stream(&self, url: &str) -> AppResult<reqwest::Response> {
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::FetchFailed(format!("stored link is not a valid url: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::FetchFailed(format!(
                "stored link has unsupported scheme {}",
                parsed.scheme()
            )));
        }

        let response = self
            .http
            .get(url)
            .header(
                reqwest::header::USER_AGENT,
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
            )
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::ACCEPT_ENCODING, "identity")
            .header(reqwest::header::CONNECTION, "keep-alive")
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("upstream request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::FetchFailed(format!(
                "upstream returned {}",
                status
            )));
        }

        debug!(
            "upstream stream open: {} ({:?} bytes)",
            url,
            response.content_length()
        );

        Ok(response)
    }

    /// "What A Girl Wants (2003)" + "720P" -> "What_A_Girl_Wants_2003_720P.mp4"
    pub fn build_filename(title: &str, quality: &str, url: &str) -> String {
        let cleaned: String = title
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
            .collect();

        let cleaned = cleaned
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");

        let cleaned: String = cleaned.chars().take(50).collect();

        format!("{}_{}.{}", cleaned, quality, Self::extract_file_extension(url))
    }

    fn extract_file_extension(url: &str) -> &'static str {
        let lower = url.to_lowercase();
        for ext in VIDEO_EXTENSIONS {
            if lower.contains(&format!(".{}", ext)) {
                return ext;
            }
        }
        "mp4"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::catalog::model::{Episode, Season};

    fn item_with_links() -> ContentItem {
        ContentItem {
            id: "1".to_string(),
            title: "What A Girl Wants (2003)".to_string(),
            slug: "what-a-girl-wants".to_string(),
            poster: None,
            featured_image: None,
            is_series: false,
            categories: Vec::new(),
            genres: Vec::new(),
            languages: Vec::new(),
            qualities: Vec::new(),
            release_year: Some(2003),
            download_links: vec![
                DownloadLink {
                    url: "https://cdn.example/a.mkv".to_string(),
                    quality: "480P".to_string(),
                    size: "350MB".to_string(),
                    description: "480p".to_string(),
                },
                DownloadLink {
                    url: "https://cdn.example/b.mkv".to_string(),
                    quality: "720P".to_string(),
                    size: "1GB".to_string(),
                    description: "720p".to_string(),
                },
            ],
            seasons: vec![Season {
                number: 1,
                episodes: vec![Episode {
                    number: 1,
                    title: "Episode 1".to_string(),
                    links: vec![DownloadLink {
                        url: "https://cdn.example/s1e1.mkv".to_string(),
                        quality: "1080p".to_string(),
                        size: "463 MB".to_string(),
                        description: "Episode 1 - 1080p".to_string(),
                    }],
                }],
            }],
            content: None,
            excerpt: None,
            status: "publish".to_string(),
            modified_at: 0,
        }
    }

    #[test]
    fn resolves_quality_case_insensitively() {
        let service = DownloadService::new(reqwest::Client::new());
        let item = item_with_links();

        let link = service.resolve_link(&item, "720p").unwrap();
        assert_eq!(link.url, "https://cdn.example/b.mkv");
    }

    #[test]
    fn falls_back_to_episode_links() {
        let service = DownloadService::new(reqwest::Client::new());
        let item = item_with_links();

        let link = service.resolve_link(&item, "1080P").unwrap();
        assert_eq!(link.url, "https://cdn.example/s1e1.mkv");
    }

    #[test]
    fn unknown_quality_resolves_to_none() {
        let service = DownloadService::new(reqwest::Client::new());
        let item = item_with_links();

        assert!(service.resolve_link(&item, "4K").is_none());
    }

    #[test]
    fn builds_clean_filenames() {
        let name = DownloadService::build_filename(
            "What A Girl Wants (2003) {Hindi-English}",
            "720P",
            "https://cdn.example/file.mkv?download",
        );
        assert_eq!(name, "What_A_Girl_Wants_2003_Hindi-English_720P.mkv");
    }

    #[test]
    fn defaults_to_mp4_extension() {
        let name = DownloadService::build_filename("Movie", "480P", "https://cdn.example/file");
        assert_eq!(name, "Movie_480P.mp4");
    }

    #[test]
    fn caps_filename_length() {
        let long_title = "A".repeat(120);
        let name = DownloadService::build_filename(&long_title, "720P", "https://x/file.mp4");
        assert_eq!(name, format!("{}_720P.mp4", "A".repeat(50)));
    }
}
