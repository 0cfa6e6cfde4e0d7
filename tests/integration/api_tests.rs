//! API integration tests for request resolution and error handling.
//!
//! Tests verify:
//! - Scaler requests in query-string and legacy form
//! - IIIF info and image requests
//! - Directory info
//! - Error cases (missing file, path traversal)
//! - HTTP response codes and headers

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use docuserver::{create_router, DirCache, IiifSyntax, RequestDecoder, Resolver, RouterConfig};

use super::test_utils::{get_json, library, router};

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (status, _, json) = get_json(router(library()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}

// =============================================================================
// Scaler Requests
// =============================================================================

#[tokio::test]
async fn test_scaler_query_by_page() {
    let (status, headers, json) = get_json(router(library()), "/scaler?fn=books/vol1&pn=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "public, max-age=3600"
    );
    assert_eq!(json["path"], "books/vol1/page0002.tif");
    assert_eq!(json["directory"], "books/vol1");
    assert_eq!(json["page"], 2);
    assert_eq!(json["page_count"], 3);
    assert_eq!(json["width"], 2100);
    assert_eq!(json["height"], 3100);
    assert_eq!(
        json["variants"],
        serde_json::json!([
            { "path": "books/vol1/page0002.tif", "level": 0 },
            { "path": "books/vol1/page0002.jpg", "level": 1 }
        ])
    );

    let query = json["query"].as_str().unwrap();
    assert!(query.contains("fn=books/vol1"));
    assert!(query.contains("pn=2"));
    assert!(query.contains("pt=3"));
}

#[tokio::test]
async fn test_scaler_legacy_format() {
    let (status, _, json) = get_json(router(library()), "/scaler?books/vol1+3+0.5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0003.tif");
    assert_eq!(json["variants"].as_array().unwrap().len(), 1);
    assert!(json["query"].as_str().unwrap().contains("ws=0.5"));
}

#[tokio::test]
async fn test_scaler_legacy_percent_encoded() {
    let (status, _, json) = get_json(router(library()), "/scaler?books%2Fvol1+1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0001.tif");
}

#[tokio::test]
async fn test_scaler_with_directory_prefix() {
    let (status, _, json) = get_json(router(library()), "/scaler/books?fn=vol1&pn=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0001.tif");
    assert!(json["query"].as_str().unwrap().contains("fn=books/vol1"));
}

#[tokio::test]
async fn test_scaler_file_name_without_extension() {
    let (status, _, json) =
        get_json(router(library()), "/scaler?fn=books/vol1/page0002").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0002.tif");
}

#[tokio::test]
async fn test_scaler_ignores_internal_parameters() {
    let (status, _, json) =
        get_json(router(library()), "/scaler?request.path=books/&fn=vol1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

// =============================================================================
// IIIF Requests
// =============================================================================

#[tokio::test]
async fn test_iiif_info_json() {
    let (status, headers, json) =
        get_json(router(library()), "/iiif/books!vol1!page0001/info.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(headers.contains_key("cache-control"));
    assert_eq!(json["@context"], "http://iiif.io/api/image/2/context.json");
    assert_eq!(json["@id"], "/iiif/books!vol1!page0001");
    assert_eq!(json["width"], 2000);
    assert_eq!(json["height"], 3000);
}

#[tokio::test]
async fn test_iiif_identifier_only_is_info_request() {
    let (status, _, json) = get_json(router(library()), "/iiif/books!vol1!page0002").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 2100);
}

#[tokio::test]
async fn test_iiif_percent_encoded_identifier() {
    let (status, _, json) =
        get_json(router(library()), "/iiif/books%2Fvol1%2Fpage0001/info.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 2000);
}

#[tokio::test]
async fn test_iiif_image_request() {
    let (status, _, json) = get_json(
        router(library()),
        "/iiif/books!vol1!page0002/pct:10,20,30,40/pct:50/90/gray.png",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0002.tif");

    let query = json["query"].as_str().unwrap();
    assert!(query.contains("scale=0.5"));
    assert!(query.contains("wx=0.1"));
    assert!(query.contains("rot=90"));
    assert!(query.contains("colop=grayscale"));
    assert!(query.contains("mo=ascale,errcode,png"));
}

#[tokio::test]
async fn test_iiif_directory_identifier_selects_first_page() {
    let (status, _, json) =
        get_json(router(library()), "/iiif/books!vol1/full/full/0/default.jpg").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1/page0001.tif");
}

#[tokio::test]
async fn test_iiif_custom_prefix() {
    let decoder = RequestDecoder::new(IiifSyntax::with_prefix("IIIF").with_slash_replacement("~"));
    let cache = DirCache::new(library(), vec![PathBuf::from("/hires")]);
    let router = create_router(
        Resolver::new(Arc::new(cache), decoder),
        RouterConfig::new().with_tracing(false),
    );

    let (status, _, json) = get_json(router.clone(), "/IIIF/books~vol1~page0001/info.json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["width"], 2000);

    let request = Request::builder()
        .uri("/iiif/books~vol1~page0001/info.json")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_iiif_missing_image() {
    let (status, _, json) =
        get_json(router(library()), "/iiif/books!vol1!page0009/info.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
}

// =============================================================================
// Directory Info
// =============================================================================

#[tokio::test]
async fn test_dirinfo() {
    let (status, _, json) = get_json(router(library()), "/dirinfo?fn=books/vol1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1");
    assert_eq!(json["parent"], "books");
    assert_eq!(json["count"], 3);
    assert_eq!(
        json["files"],
        serde_json::json!(["page0001.tif", "page0002.tif", "page0003.tif"])
    );
}

#[tokio::test]
async fn test_dirinfo_of_file_answers_directory() {
    let (status, _, json) =
        get_json(router(library()), "/dirinfo?fn=books/vol1/page0002.tif").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "books/vol1");
}

#[tokio::test]
async fn test_dirinfo_root() {
    let (status, _, json) = get_json(router(library()), "/dirinfo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "");
    assert!(json.get("parent").is_none());
    assert_eq!(json["files"], serde_json::json!(["cover.jpg"]));
}

// =============================================================================
// Error Cases
// =============================================================================

#[tokio::test]
async fn test_page_out_of_range() {
    let (status, _, json) = get_json(router(library()), "/scaler?fn=books/vol1&pn=9").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn test_missing_directory() {
    let (status, _, _) = get_json(router(library()), "/scaler?fn=books/vol3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = get_json(router(library()), "/dirinfo?fn=maps/world").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_path_through_file_is_not_found() {
    let (status, _, json) =
        get_json(router(library()), "/scaler?fn=books/vol1/page0001.tif/x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");

    let (status, _, _) = get_json(router(library()), "/iiif/cover.jpg!x/info.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreadable_directory_is_not_found() {
    let source = library();
    source.fail("/hires/books/vol2");
    let router = router(source);

    let (status, _, json) = get_json(router.clone(), "/scaler?fn=books/vol2&pn=1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
    assert!(!json["message"].as_str().unwrap().contains("/hires"));

    let (status, _, _) = get_json(router, "/dirinfo?fn=books/vol2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_path_traversal_rejected() {
    let (status, _, json) = get_json(router(library()), "/scaler?fn=books/../../etc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_path");

    let (status, _, _) = get_json(router(library()), "/dirinfo?fn=../etc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
