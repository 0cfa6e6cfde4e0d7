//! Directory cache integration tests.
//!
//! Tests verify:
//! - Directories are read once while fresh
//! - A newer modification time triggers a re-read
//! - Vanished directories stop resolving
//! - Concurrent requests for one directory share a single read
//! - Image probing is memoized

use std::sync::Arc;

use axum::http::StatusCode;

use docuserver::WireFormat;

use super::test_utils::{get_json, library, resolver, router};

#[tokio::test]
async fn test_fresh_directory_is_read_once() {
    let source = library();
    let router = router(source.clone());

    for pn in 1..=3 {
        let uri = format!("/scaler?fn=books/vol1&pn={}", pn);
        let (status, _, _) = get_json(router.clone(), &uri).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _, _) = get_json(router, "/dirinfo?fn=books/vol1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(source.list_count("/hires/books/vol1"), 1);
    assert_eq!(source.list_count("/lores/books/vol1"), 1);
}

#[tokio::test]
async fn test_newer_mtime_triggers_reread() {
    let source = library();
    let router = router(source.clone());

    let (_, _, json) = get_json(router.clone(), "/dirinfo?fn=books/vol2").await;
    assert_eq!(json["count"], 0);

    source.set_dir("/hires/books/vol2", &["b.jpg", "a.jpg"], 60);

    let (_, _, json) = get_json(router.clone(), "/dirinfo?fn=books/vol2").await;
    assert_eq!(json["files"], serde_json::json!(["a.jpg", "b.jpg"]));

    let (status, _, json) = get_json(router, "/scaler?fn=books/vol2&pn=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol2/b.jpg");
    assert_eq!(source.list_count("/hires/books/vol2"), 2);
}

#[tokio::test]
async fn test_same_mtime_keeps_cached_listing() {
    let source = library();
    let router = router(source.clone());

    get_json(router.clone(), "/dirinfo?fn=books/vol2").await;
    source.set_dir("/hires/books/vol2", &["a.jpg"], 0);

    let (_, _, json) = get_json(router, "/dirinfo?fn=books/vol2").await;
    assert_eq!(json["count"], 0);
    assert_eq!(source.list_count("/hires/books/vol2"), 1);
}

#[tokio::test]
async fn test_vanished_directory_is_not_found() {
    let source = library();
    let router = router(source.clone());

    let (status, _, _) = get_json(router.clone(), "/scaler?fn=books/vol1&pn=1").await;
    assert_eq!(status, StatusCode::OK);

    source.remove_dir("/hires/books/vol1");

    let (status, _, json) = get_json(router, "/scaler?fn=books/vol1&pn=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_concurrent_requests_share_one_read() {
    let source = library();
    let resolver = Arc::new(resolver(source.clone(), &["/hires", "/lores"]));

    let handles: Vec<_> = (1..=3)
        .cycle()
        .take(24)
        .map(|pn| {
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let raw = format!("fn=books/vol1&pn={}", pn);
                let (_, result) = resolver.decode_and_resolve(WireFormat::Query, &raw).await;
                result.map(|r| r.entry.name().to_string())
            })
        })
        .collect();

    for handle in handles {
        let name = handle.await.unwrap().unwrap();
        assert!(name.starts_with("page000"));
    }

    assert_eq!(source.list_count("/hires/books/vol1"), 1);
    assert_eq!(resolver.cache().cached_count().await, 1);
}

#[tokio::test]
async fn test_probe_is_memoized() {
    let source = library();
    let resolver = resolver(source.clone(), &["/hires"]);

    for _ in 0..3 {
        let mut params = resolver.decode(WireFormat::Query, "fn=books/vol1&pn=1");
        let resolved = resolver.resolve(&mut params).await.unwrap();
        assert_eq!(resolved.info.unwrap().width, 2000);
    }
    assert_eq!(source.probe_count(), 1);
}

#[tokio::test]
async fn test_parent_traversal() {
    let resolver = resolver(library(), &["/hires"]);
    let cache = resolver.cache();

    let vol1 = cache.get_directory("books/vol1").await.unwrap().unwrap();
    let books = cache.parent(&vol1).await.unwrap().unwrap();
    assert_eq!(books.name(), "books");
    assert_eq!(books.listing().await.len(), 0);

    let root = cache.parent(&books).await.unwrap().unwrap();
    assert_eq!(root.name(), "");
    assert!(cache.parent(&root).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cache_stats() {
    let resolver = resolver(library(), &["/hires"]);
    let cache = resolver.cache();

    cache.get_directory("books/vol1").await.unwrap();
    cache.get_file("books/vol1", 2).await.unwrap();
    cache.get_file("books/vol1/page0003", 1).await.unwrap();

    let stats = cache.stats().await;
    assert_eq!(stats.directories, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 2);
}
