use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::catalog::model::ContentItem;

fn default_page_size() -> u32 {
    100
}

#[derive(Debug, Deserialize, Validate)]
pub struct ContentPageQuery {
    #[serde(default)]
    pub page: u32,

    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 200))]
    pub page_size: u32,
}

#[derive(Debug, Serialize)]
pub struct ContentPageResponse {
    pub items: Vec<ContentItem>,
    pub page: u32,
    pub page_size: u32,
    pub count: usize,
    /// exact total, only present on the first page
    pub total_count: Option<u64>,
    pub has_more: bool,
}
