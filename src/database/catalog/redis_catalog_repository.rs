use std::sync::Arc;

use anyhow::{Context, Result};
use redis::AsyncCommands;
use tracing::{debug, warn};

use crate::database::RedisDatabase;
use crate::database::catalog::model::{CatalogRepository, CatalogRow};

/// row json keyed by record id
const ITEMS_KEY: &str = "catalog:items";
/// ordering index, scored by modified_date so ZREVRANGE gives newest first
const INDEX_KEY: &str = "catalog:index";

pub struct RedisCatalogRepository {
    redis: Arc<RedisDatabase>,
}

impl RedisCatalogRepository {
    pub fn new(redis: Arc<RedisDatabase>) -> Self {
        Self { redis }
    }
}

#[async_trait::async_trait]
impl CatalogRepository for RedisCatalogRepository {
    async fn fetch_range(
        &self,
        offset_start: u64,
        offset_end: u64,
        want_total: bool,
    ) -> Result<(Vec<CatalogRow>, Option<u64>)> {
        let mut conn = self.redis.connection.clone();

        let ids: Vec<String> = conn
            .zrevrange(INDEX_KEY, offset_start as isize, offset_end as isize)
            .await
            .context("catalog index range query failed")?;

        let total = if want_total {
            let count: u64 = conn
                .zcard(INDEX_KEY)
                .await
                .context("catalog index count failed")?;
            Some(count)
        } else {
            None
        };

        if ids.is_empty() {
            return Ok((Vec::new(), total));
        }

        // one round trip for the whole page
        let mut pipe = redis::pipe();
        for id in &ids {
            pipe.hget(ITEMS_KEY, id);
        }

        let raw: Vec<Option<String>> = pipe
            .query_async(&mut conn)
            .await
            .context("catalog row fetch failed")?;

        let rows: Vec<CatalogRow> = ids
            .iter()
            .zip(raw)
            .filter_map(|(id, json)| match json {
                Some(json) => match serde_json::from_str::<CatalogRow>(&json) {
                    Ok(row) => Some(row),
                    Err(e) => {
                        warn!("dropping undecodable catalog row {}: {}", id, e);
                        None
                    }
                },
                None => {
                    warn!("catalog index references missing row {}", id);
                    None
                }
            })
            .collect();

        debug!(
            "fetched catalog range {}..={} ({} rows)",
            offset_start,
            offset_end,
            rows.len()
        );

        Ok((rows, total))
    }

    async fn get_row(&self, id: &str) -> Result<Option<CatalogRow>> {
        let mut conn = self.redis.connection.clone();

        let json: Option<String> = conn
            .hget(ITEMS_KEY, id)
            .await
            .context("catalog row lookup failed")?;

        match json {
            Some(json) => {
                let row = serde_json::from_str::<CatalogRow>(&json)
                    .with_context(|| format!("catalog row {} is not decodable", id))?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    async fn store_row(&self, row: &CatalogRow) -> Result<()> {
        let id = row.record_id.to_string();
        let json = serde_json::to_string(row).context("catalog row is not serializable")?;

        let mut conn = self.redis.connection.clone();

        // only published rows belong in the listing index; the row itself is
        // kept either way so direct lookups can explain why it's hidden
        let result: Result<(), redis::RedisError> = if row.status == "publish" {
            redis::pipe()
                .atomic()
                .hset(ITEMS_KEY, &id, json)
                .ignore()
                .zadd(INDEX_KEY, &id, row.modified_date)
                .ignore()
                .query_async(&mut conn)
                .await
        } else {
            redis::pipe()
                .atomic()
                .hset(ITEMS_KEY, &id, json)
                .ignore()
                .zrem(INDEX_KEY, &id)
                .ignore()
                .query_async(&mut conn)
                .await
        };

        result.context("catalog row store failed")?;

        debug!("stored catalog row {} (status: {})", id, row.status);
        Ok(())
    }
}
