use anyhow::Result;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Raw catalog row as it sits in the store. Free-text fields (`categories`,
/// `links`, season blobs) are human-authored upstream and get parsed into the
/// structured [`ContentItem`] on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRow {
    pub record_id: i64,
    pub title: String,
    pub url_slug: String,
    pub featured_image: Option<String>,
    pub poster: Option<String>,
    pub categories: Option<String>,
    // concatenated "url,title,size" triples, see the link parser
    pub links: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub status: String,
    pub date: Option<String>,
    // epoch seconds, doubles as the ordering key
    pub modified_date: i64,
    #[serde(default)]
    pub seasons: Vec<SeasonRow>,
}

/// One season's free-text episode blob ("Episode 1: [url],720p,229.05 MB : ...").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonRow {
    pub number: u32,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: String,
    pub quality: String,
    pub size: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: u32,
    pub title: String,
    pub links: Vec<DownloadLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub number: u32,
    pub episodes: Vec<Episode>,
}

/// Metadata packed into the row's `content` column, either a JSON array of
/// [description, duration, rating] or plain prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMeta {
    pub description: Option<String>,
    pub duration: Option<String>,
    pub rating: Option<String>,
}

/// Fully parsed catalog entry served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub poster: Option<String>,
    pub featured_image: Option<String>,
    pub is_series: bool,
    pub categories: Vec<String>,
    pub genres: Vec<String>,
    pub languages: Vec<String>,
    pub qualities: Vec<String>,
    pub release_year: Option<u16>,
    pub download_links: Vec<DownloadLink>,
    pub seasons: Vec<Season>,
    pub content: Option<ContentMeta>,
    pub excerpt: Option<String>,
    pub status: String,
    pub modified_at: i64,
}

pub type DynCatalogRepository = Arc<dyn CatalogRepository + Send + Sync>;

/// Ordered, offset-addressed view over the catalog. Items come back newest
/// first (descending modified date); the exact total is only computed when
/// asked for, since callers only need it on the first page.
#[automock]
#[async_trait::async_trait]
pub trait CatalogRepository {
    async fn fetch_range(
        &self,
        offset_start: u64,
        offset_end: u64,
        want_total: bool,
    ) -> Result<(Vec<CatalogRow>, Option<u64>)>;

    async fn get_row(&self, id: &str) -> Result<Option<CatalogRow>>;

    async fn store_row(&self, row: &CatalogRow) -> Result<()>;
}
