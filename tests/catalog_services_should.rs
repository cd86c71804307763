use std::sync::Arc;

use cine_api::database::catalog::model::{
    CatalogRow, DynCatalogRepository, MockCatalogRepository, SeasonRow,
};
use cine_api::server::error::Error;
use cine_api::server::services::catalog_services::{
    CatalogService, CatalogServiceTrait, transform_row,
};

const SAMPLE_LINKS: &str = "https://pixeldrain.dev/api/file/bkDDeRAM?download,What A Girl Wants (2003) {Hindi-English} 480p WEB-DL [350MB],350MBhttps://pixeldrain.dev/api/file/NL5VGst8?download,What A Girl Wants (2003) {Hindi-English} 720p WEB-DL x264 [1GB],1GBhttps://pixeldrain.dev/api/file/eCzi9wwU?download,What A Girl Wants (2003) {Hindi-English} 1080p WEB-DL x264 [2.2GB],2.2GB";

fn sample_row(record_id: i64) -> CatalogRow {
    CatalogRow {
        record_id,
        title: "What A Girl Wants (2003)".to_string(),
        url_slug: format!("what-a-girl-wants-{}", record_id),
        featured_image: None,
        poster: Some("https://img.example/poster.jpg".to_string()),
        categories: Some("Comedy,Romance,2003,720p,Hindi Dubbed Movies".to_string()),
        links: Some(SAMPLE_LINKS.to_string()),
        content: Some(r#"["Teen comedy","1h 45m","5.9"]"#.to_string()),
        excerpt: None,
        status: "publish".to_string(),
        date: None,
        modified_date: 1_700_000_000 + record_id,
        seasons: Vec::new(),
    }
}

fn service_with(repo: MockCatalogRepository) -> CatalogService {
    CatalogService::new(Arc::new(repo) as DynCatalogRepository)
}

#[test]
fn test_transform_parses_free_text_fields() {
    let item = transform_row(sample_row(7)).expect("published row should transform");

    assert_eq!(item.id, "7");
    assert_eq!(item.download_links.len(), 3);
    assert_eq!(item.download_links[0].quality, "480P");
    assert_eq!(item.qualities, vec!["480P", "720P", "1080P"]);
    assert_eq!(item.release_year, Some(2003));
    assert_eq!(item.genres, vec!["Comedy", "Romance"]);
    assert_eq!(item.languages, vec!["Hindi Dubbed Movies"]);
    assert!(!item.is_series);

    let meta = item.content.expect("content metadata should parse");
    assert_eq!(meta.description.as_deref(), Some("Teen comedy"));
}

#[test]
fn test_transform_drops_unpublished_rows() {
    let mut row = sample_row(7);
    row.status = "draft".to_string();

    assert!(transform_row(row).is_none());
}

#[test]
fn test_transform_detects_series() {
    let mut row = sample_row(7);
    row.seasons = vec![SeasonRow {
        number: 1,
        data: "Episode 1: [https://cdn.example/s1e1.mkv],720p,229.05 MB".to_string(),
    }];

    let item = transform_row(row).expect("row should transform");

    assert!(item.is_series);
    assert_eq!(item.seasons.len(), 1);
    assert_eq!(item.seasons[0].episodes[0].number, 1);
}

#[tokio::test]
async fn test_get_page_translates_page_to_offsets() {
    let mut repo = MockCatalogRepository::new();
    repo.expect_fetch_range()
        .withf(|start, end, want_total| *start == 200 && *end == 299 && !*want_total)
        .times(1)
        .returning(|_, _, _| Ok((vec![sample_row(1), sample_row(2)], None)));

    let service = service_with(repo);
    let page = service.get_page(2, 100).await.expect("page should load");

    assert_eq!(page.items.len(), 2);
    assert!(page.is_last_page);
    assert_eq!(page.total_count, None);
}

#[tokio::test]
async fn test_get_page_requests_total_on_first_page() {
    let mut repo = MockCatalogRepository::new();
    repo.expect_fetch_range()
        .withf(|start, end, want_total| *start == 0 && *end == 99 && *want_total)
        .times(1)
        .returning(|_, _, _| Ok((vec![sample_row(1)], Some(251))));

    let service = service_with(repo);
    let page = service.get_page(0, 100).await.expect("page should load");

    assert_eq!(page.total_count, Some(251));
    assert!(page.is_last_page);
}

#[tokio::test]
async fn test_get_item_maps_missing_row_to_not_found() {
    let mut repo = MockCatalogRepository::new();
    repo.expect_get_row().times(1).returning(|_| Ok(None));

    let service = service_with(repo);

    assert!(matches!(
        service.get_item("404").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_get_item_hides_unpublished_rows() {
    let mut repo = MockCatalogRepository::new();
    repo.expect_get_row().times(1).returning(|_| {
        let mut row = sample_row(9);
        row.status = "draft".to_string();
        Ok(Some(row))
    });

    let service = service_with(repo);

    assert!(matches!(
        service.get_item("9").await,
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_all_published_serves_from_cache_until_invalidated() {
    let mut repo = MockCatalogRepository::new();
    // the full walk is one short page; exactly two walks are expected across
    // three calls because the middle one hits the cache
    repo.expect_fetch_range()
        .times(2)
        .returning(|_, _, _| Ok((vec![sample_row(1), sample_row(2), sample_row(3)], Some(3))));

    let service = service_with(repo);

    let first = service.all_published().await.expect("walk should succeed");
    assert_eq!(first.len(), 3);

    let cached = service.all_published().await.expect("cache hit should succeed");
    assert_eq!(cached.len(), 3);

    service.invalidate_cache().await;

    let rewalked = service.all_published().await.expect("re-walk should succeed");
    assert_eq!(rewalked.len(), 3);
}

#[tokio::test]
async fn test_upsert_stores_and_invalidates_cache() {
    let mut repo = MockCatalogRepository::new();
    repo.expect_fetch_range()
        .times(2)
        .returning(|_, _, _| Ok((vec![sample_row(1)], Some(1))));
    repo.expect_store_row().times(1).returning(|_| Ok(()));

    let service = service_with(repo);

    // warm the cache, then write through it
    service.all_published().await.expect("walk should succeed");
    service
        .upsert_row(sample_row(2))
        .await
        .expect("upsert should succeed");

    // the write invalidated the snapshot, so this walks again
    service.all_published().await.expect("re-walk should succeed");
}
