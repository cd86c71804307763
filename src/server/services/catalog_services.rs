use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::database::catalog::model::{
    CatalogRow, ContentItem, DynCatalogRepository, Season,
};
use crate::database::catalog::pager::{ContentPager, FetchedPage, PageSource};
use crate::server::error::{AppResult, Error};
use crate::server::utils::catalog_facets::{
    extract_genres, extract_languages, extract_qualities, extract_release_year,
    parse_categories, parse_content_metadata,
};
use crate::server::utils::link_parser::{parse_download_links, parse_season_episodes};

/// batch size used when walking the whole collection into the cache
const WARM_PAGE_SIZE: u32 = 500;

/// how long a warmed catalog snapshot stays servable
const CACHE_MAX_AGE_SECONDS: i64 = 15 * 60;

pub type DynCatalogService = Arc<dyn CatalogServiceTrait + Send + Sync>;

#[automock]
#[async_trait]
pub trait CatalogServiceTrait {
    /// one page of the published collection, newest first; the exact total is
    /// only computed for page zero
    async fn get_page(&self, page: u32, page_size: u32) -> AppResult<FetchedPage<ContentItem>>;

    async fn get_item(&self, id: &str) -> AppResult<ContentItem>;

    /// the full published collection, from the warm cache when it's fresh
    async fn all_published(&self) -> AppResult<Vec<ContentItem>>;

    async fn upsert_row(&self, row: CatalogRow) -> AppResult<()>;

    async fn invalidate_cache(&self);
}

/// Turn a raw stored row into the servable item. Unpublished rows and rows
/// whose free-text fields parse to nothing still produce an item (with empty
/// links) as long as they're published; `None` only for unpublished rows.
pub fn transform_row(row: CatalogRow) -> Option<ContentItem> {
    if row.status != "publish" {
        return None;
    }

    let categories: Vec<String> = parse_categories(row.categories.as_deref().unwrap_or(""))
        .into_iter()
        .take(10)
        .collect();

    let download_links = parse_download_links(row.links.as_deref().unwrap_or(""));

    let seasons: Vec<Season> = row
        .seasons
        .iter()
        .filter_map(|season| {
            let episodes = parse_season_episodes(&season.data);
            (!episodes.is_empty()).then(|| Season {
                number: season.number,
                episodes,
            })
        })
        .collect();

    // prefer qualities found on actual links over the category tags
    let mut qualities: Vec<String> = Vec::new();
    for link in &download_links {
        if !qualities.contains(&link.quality) {
            qualities.push(link.quality.clone());
        }
    }
    if qualities.is_empty() {
        qualities = extract_qualities(&categories);
    }

    let title = if row.title.is_empty() {
        "Untitled".to_string()
    } else {
        row.title
    };

    Some(ContentItem {
        id: row.record_id.to_string(),
        title,
        slug: row.url_slug,
        poster: row.poster,
        featured_image: row.featured_image,
        is_series: !seasons.is_empty(),
        genres: extract_genres(&categories),
        languages: extract_languages(&categories),
        qualities,
        release_year: extract_release_year(&categories),
        download_links,
        seasons,
        content: parse_content_metadata(row.content.as_deref()),
        excerpt: row.excerpt,
        status: row.status,
        modified_at: row.modified_date,
        categories,
    })
}

/// The ordered-query collaborator the pager draws from: translates page
/// arithmetic into repository offsets and parses rows on the way out.
pub struct CatalogPageSource {
    repository: DynCatalogRepository,
}

impl CatalogPageSource {
    pub fn new(repository: DynCatalogRepository) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl PageSource for CatalogPageSource {
    type Item = ContentItem;

    async fn fetch_page(
        &self,
        page_index: u32,
        page_size: u32,
    ) -> anyhow::Result<FetchedPage<ContentItem>> {
        let page_size = page_size.max(1);
        let start = page_index as u64 * page_size as u64;
        let end = start + page_size as u64 - 1;

        let (rows, total_count) = self
            .repository
            .fetch_range(start, end, page_index == 0)
            .await?;

        let items: Vec<ContentItem> = rows.into_iter().filter_map(transform_row).collect();
        let is_last_page = (items.len() as u32) < page_size;

        Ok(FetchedPage {
            items,
            is_last_page,
            total_count,
        })
    }
}

/// Snapshot of the whole published collection. Explicitly owned by the
/// service and explicitly invalidated; never a process-wide global.
struct CatalogCache {
    items: Vec<ContentItem>,
    filled_at: Option<i64>,
}

impl CatalogCache {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            filled_at: None,
        }
    }

    fn is_fresh(&self, now: i64) -> bool {
        self.filled_at
            .is_some_and(|at| now - at < CACHE_MAX_AGE_SECONDS)
    }

    fn fill(&mut self, items: Vec<ContentItem>, now: i64) {
        self.items = items;
        self.filled_at = Some(now);
    }

    fn clear(&mut self) {
        self.items.clear();
        self.filled_at = None;
    }
}

pub struct CatalogService {
    repository: DynCatalogRepository,
    source: Arc<CatalogPageSource>,
    cache: RwLock<CatalogCache>,
}

impl CatalogService {
    pub fn new(repository: DynCatalogRepository) -> Self {
        let source = Arc::new(CatalogPageSource::new(repository.clone()));
        Self {
            repository,
            source,
            cache: RwLock::new(CatalogCache::empty()),
        }
    }
}

#[async_trait]
impl CatalogServiceTrait for CatalogService {
    async fn get_page(&self, page: u32, page_size: u32) -> AppResult<FetchedPage<ContentItem>> {
        let fetched = self
            .source
            .fetch_page(page, page_size)
            .await
            .map_err(Error::AnyhowError)?;

        debug!(
            "served catalog page {} ({} items, total {:?})",
            page,
            fetched.items.len(),
            fetched.total_count
        );

        Ok(fetched)
    }

    async fn get_item(&self, id: &str) -> AppResult<ContentItem> {
        let row = self.repository.get_row(id).await?;

        let Some(row) = row else {
            return Err(Error::NotFound(format!("content {} not found", id)));
        };

        transform_row(row)
            .ok_or_else(|| Error::NotFound(format!("content {} is not published", id)))
    }

    async fn all_published(&self) -> AppResult<Vec<ContentItem>> {
        let now = chrono::Utc::now().timestamp();

        {
            let cache = self.cache.read().await;
            if cache.is_fresh(now) {
                debug!("catalog cache hit ({} items)", cache.items.len());
                return Ok(cache.items.clone());
            }
        }

        info!("catalog cache stale or empty, walking the full collection");

        let pager = ContentPager::new(self.source.clone(), WARM_PAGE_SIZE);
        pager.initialize().await?;
        while pager.has_more().await {
            pager.load_more().await?;
        }

        let items = pager.loaded_items().await;
        info!("catalog walk complete, {} published items", items.len());

        let mut cache = self.cache.write().await;
        cache.fill(items.clone(), now);

        Ok(items)
    }

    async fn upsert_row(&self, row: CatalogRow) -> AppResult<()> {
        self.repository.store_row(&row).await?;

        // the snapshot no longer reflects the store
        self.invalidate_cache().await;

        Ok(())
    }

    async fn invalidate_cache(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
        debug!("catalog cache invalidated");
    }
}
