use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// One fetched page. `is_last_page` is derived by the source from whether the
/// page came back full; `total_count` is only populated when the source was
/// asked for it (first page).
#[derive(Debug, Clone)]
pub struct FetchedPage<T> {
    pub items: Vec<T>,
    pub is_last_page: bool,
    pub total_count: Option<u64>,
}

/// The ordered query collaborator a pager draws from. Items are opaque to the
/// pager; the source's ordering is the single source of truth.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, page_index: u32, page_size: u32) -> Result<FetchedPage<Self::Item>>;
}

struct PagerState<T> {
    /// next page to fetch, bumped by exactly one per successful fetch
    page_index: u32,
    items: Vec<T>,
    loaded_count: usize,
    total_count: Option<u64>,
    has_more: bool,
    initialized: bool,
    /// bumped by reset(); fetches that finish under an older generation are dropped
    generation: u64,
    last_error: Option<String>,
}

impl<T> PagerState<T> {
    fn fresh(generation: u64) -> Self {
        Self {
            page_index: 0,
            items: Vec::new(),
            loaded_count: 0,
            total_count: None,
            has_more: false,
            initialized: false,
            generation,
            last_error: None,
        }
    }
}

/// Incremental cursor over an ordered collection in fixed-size batches.
///
/// At most one fetch is ever in flight; a `load_more` issued while another is
/// pending is dropped, not queued, so the caller re-invokes after completion
/// if it still wants the next page. `has_more` is computed purely from whether
/// the last page came back full, which tolerates a stale `total_count` at the
/// cost of one possible empty fetch when the collection size lands exactly on
/// a page boundary.
pub struct ContentPager<S: PageSource> {
    source: Arc<S>,
    page_size: u32,
    in_flight: AtomicBool,
    state: Mutex<PagerState<S::Item>>,
}

impl<S: PageSource> ContentPager<S> {
    pub fn new(source: Arc<S>, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.max(1),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(PagerState::fresh(0)),
        }
    }

    /// Fetch page zero and suspend until it lands. A failure leaves the
    /// cursor untouched in its retryable initial state; call again to retry.
    pub async fn initialize(&self) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.initialized {
                return Ok(());
            }
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            // another fetch is already running, drop this call
            return Ok(());
        }

        let generation = self.state.lock().await.generation;
        let result = self.source.fetch_page(0, self.page_size).await;

        let mut state = self.state.lock().await;
        self.in_flight.store(false, Ordering::Release);

        if state.generation != generation {
            debug!("dropping stale initial page (cursor was reset mid-fetch)");
            return Ok(());
        }

        match result {
            Ok(page) => {
                state.has_more = !page.is_last_page;
                state.total_count = page.total_count;
                state.loaded_count = page.items.len();
                state.items = page.items;
                state.page_index = 1;
                state.initialized = true;
                state.last_error = None;
                debug!(
                    "cursor initialized: {} items, total {:?}, has_more {}",
                    state.loaded_count, state.total_count, state.has_more
                );
                Ok(())
            }
            Err(e) => {
                error!("initial page fetch failed: {}", e);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch the next page and append it. Returns `Ok(false)` without touching
    /// anything when a fetch is already in flight or the collection is
    /// exhausted; returns `Ok(true)` when a page was appended. On failure the
    /// loaded items and position are left exactly as they were, and the caller
    /// may retry.
    pub async fn load_more(&self) -> Result<bool> {
        {
            let state = self.state.lock().await;
            if !state.initialized || !state.has_more {
                return Ok(false);
            }
        }

        if self.in_flight.swap(true, Ordering::AcqRel) {
            debug!("load_more dropped: a fetch is already in flight");
            return Ok(false);
        }

        let (generation, page_index) = {
            let state = self.state.lock().await;
            (state.generation, state.page_index)
        };

        let result = self.source.fetch_page(page_index, self.page_size).await;

        let mut state = self.state.lock().await;
        self.in_flight.store(false, Ordering::Release);

        if state.generation != generation {
            debug!("dropping stale page {} (cursor was reset mid-fetch)", page_index);
            return Ok(false);
        }

        match result {
            Ok(page) => {
                state.has_more = !page.is_last_page;
                state.page_index += 1;
                state.loaded_count += page.items.len();
                state.items.extend(page.items);
                if state.total_count.is_none() {
                    state.total_count = page.total_count;
                }
                state.last_error = None;
                debug!(
                    "loaded page {}: {} items total, has_more {}",
                    page_index, state.loaded_count, state.has_more
                );
                Ok(true)
            }
            Err(e) => {
                error!("page {} fetch failed: {}", page_index, e);
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Restart from scratch (e.g. the backing filter changed). Any fetch still
    /// in flight will see the generation bump and discard its result.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        let generation = state.generation + 1;
        *state = PagerState::fresh(generation);
    }

    pub async fn has_more(&self) -> bool {
        self.state.lock().await.has_more
    }

    pub async fn loaded_count(&self) -> usize {
        self.state.lock().await.loaded_count
    }

    pub async fn total_count(&self) -> Option<u64> {
        self.state.lock().await.total_count
    }

    pub async fn page_index(&self) -> u32 {
        self.state.lock().await.page_index
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn loaded_items(&self) -> Vec<S::Item>
    where
        S::Item: Clone,
    {
        self.state.lock().await.items.clone()
    }
}
