//! Test utilities for integration tests.
//!
//! This module provides an in-memory directory source with controllable
//! modification times and helpers for driving the router.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tower::ServiceExt;

use docuserver::dir::{DirSource, FsEntry, FsStat, ImageInfo};
use docuserver::error::IoError;
use docuserver::{create_router, DirCache, RequestDecoder, Resolver, RouterConfig};

// =============================================================================
// Mock Directory Source
// =============================================================================

#[derive(Default)]
struct MockState {
    dirs: Mutex<HashMap<PathBuf, (SystemTime, Vec<FsEntry>)>>,
    sizes: Mutex<HashMap<PathBuf, ImageInfo>>,
    list_counts: Mutex<HashMap<PathBuf, usize>>,
    failing: Mutex<Vec<PathBuf>>,
    probe_count: AtomicUsize,
}

/// An in-memory filesystem.
///
/// Clones share state, so a test can keep a handle and change directories
/// after the source has been moved into a cache.
#[derive(Clone, Default)]
pub struct MockDirSource {
    state: Arc<MockState>,
}

impl MockDirSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory. Names ending in `/` are subdirectories.
    pub fn with_dir(self, path: &str, names: &[&str]) -> Self {
        self.set_dir(path, names, 0);
        self
    }

    /// Give an image file a pixel size. Other files probe as 100x100.
    pub fn with_image(self, path: &str, width: u32, height: u32) -> Self {
        self.state
            .sizes
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), ImageInfo::new(width, height));
        self
    }

    /// Replace a directory's contents with modification time `mtime_secs`.
    pub fn set_dir(&self, path: &str, names: &[&str], mtime_secs: u64) {
        let entries = names
            .iter()
            .map(|n| match n.strip_suffix('/') {
                Some(dir) => FsEntry::directory(dir),
                None => FsEntry::file(*n),
            })
            .collect();
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs);
        self.state
            .dirs
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), (modified, entries));
    }

    pub fn remove_dir(&self, path: &str) {
        self.state.dirs.lock().unwrap().remove(Path::new(path));
    }

    /// Make stat and list of `path` fail with a read error.
    pub fn fail(&self, path: &str) {
        self.state.failing.lock().unwrap().push(PathBuf::from(path));
    }

    fn check_failing(&self, path: &Path) -> Result<(), IoError> {
        if self.state.failing.lock().unwrap().iter().any(|p| p == path) {
            return Err(IoError::Read {
                path: path.display().to_string(),
                message: "permission denied".to_string(),
            });
        }
        Ok(())
    }

    /// Number of times a directory was listed.
    pub fn list_count(&self, path: &str) -> usize {
        self.state
            .list_counts
            .lock()
            .unwrap()
            .get(Path::new(path))
            .copied()
            .unwrap_or(0)
    }

    pub fn probe_count(&self) -> usize {
        self.state.probe_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirSource for MockDirSource {
    async fn stat(&self, path: &Path) -> Result<Option<FsStat>, IoError> {
        self.check_failing(path)?;
        Ok(self
            .state
            .dirs
            .lock()
            .unwrap()
            .get(path)
            .map(|(modified, _)| FsStat {
                kind: docuserver::dir::EntryKind::Directory,
                modified: *modified,
            }))
    }

    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>, IoError> {
        *self
            .state
            .list_counts
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default() += 1;
        self.check_failing(path)?;
        tokio::task::yield_now().await;
        self.state
            .dirs
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, entries)| entries.clone())
            .ok_or_else(|| IoError::NotFound(path.display().to_string()))
    }

    async fn probe(&self, path: &Path) -> Result<ImageInfo, IoError> {
        self.state.probe_count.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .sizes
            .lock()
            .unwrap()
            .get(path)
            .copied()
            .unwrap_or(ImageInfo::new(100, 100)))
    }
}

/// A small library: one book with three pages, plus scaled copies.
pub fn library() -> MockDirSource {
    MockDirSource::new()
        .with_dir("/hires", &["books/", "cover.jpg"])
        .with_dir("/hires/books", &["vol1/", "vol2/"])
        .with_dir(
            "/hires/books/vol1",
            &["page0003.tif", "page0001.tif", "page0002.tif", "readme.txt"],
        )
        .with_dir("/hires/books/vol2", &[])
        .with_dir("/lores/books/vol1", &["page0001.jpg", "page0002.jpg"])
        .with_image("/hires/books/vol1/page0001.tif", 2000, 3000)
        .with_image("/hires/books/vol1/page0002.tif", 2100, 3100)
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Resolver over `source` with the given base directories.
pub fn resolver(source: MockDirSource, roots: &[&str]) -> Resolver<MockDirSource> {
    let roots = roots.iter().map(PathBuf::from).collect();
    Resolver::new(Arc::new(DirCache::new(source, roots)), RequestDecoder::default())
}

/// Router over `source` with both base directories of [`library`].
pub fn router(source: MockDirSource) -> Router {
    create_router(
        resolver(source, &["/hires", "/lores"]),
        RouterConfig::new().with_tracing(false),
    )
}

/// Send a GET request and parse the JSON body.
pub async fn get_json(router: Router, uri: &str) -> (StatusCode, HeaderMap, serde_json::Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap();
    (status, headers, json)
}

/// Write an RGB PNG, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    image::RgbImage::new(width, height).save(path).unwrap();
}
