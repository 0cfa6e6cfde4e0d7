//! Directory cache.
//!
//! The cache maps canonical directory paths to [`Directory`] objects and keeps
//! them fresh:
//! - Directories are created on first reference and read lazily
//! - Every lookup compares the directory's modification time on disk with the
//!   one recorded at the last read, and re-reads a stale directory
//! - Reads of one directory are serialized; concurrent lookups of the same
//!   path trigger a single read
//!
//! # Example
//!
//! ```ignore
//! use docuserver::dir::{DirCache, LocalFs};
//!
//! let cache = DirCache::new(LocalFs, vec!["/data/hires".into(), "/data/lores".into()]);
//!
//! // Directory of a book, read on first access
//! let dir = cache.get_directory("books/vol1").await?;
//!
//! // Third page of the book
//! let page = cache.get_file("books/vol1", 3).await?;
//!
//! // A page by file name, extension optional
//! let page = cache.get_file("books/vol1/page0003", 1).await?;
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::IoError;

use super::directory::Directory;
use super::entry::{DirEntry, FileClass};
use super::listing::Listing;
use super::meta::{DirMeta, MetaLoader, NoMeta};
use super::path::{file_name, join_root, parent_path};
use super::source::{DirSource, EntryKind, FsStat};
use super::strategy::VariantStrategy;

// =============================================================================
// CacheStats
// =============================================================================

/// Counters of a [`DirCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of cached directories
    pub directories: usize,
    /// Lookups answered by a cached directory
    pub hits: usize,
    /// Lookups that created a directory
    pub misses: usize,
}

// =============================================================================
// DirCache
// =============================================================================

/// Process-wide cache of directories below one or more base directories.
///
/// The first base directory holds the primary (highest resolution) files and
/// determines which directories and entries exist. Further base directories
/// only contribute variants, see [`VariantStrategy`].
pub struct DirCache<S: DirSource> {
    /// Filesystem access
    source: S,

    /// Base directories, highest resolution first
    roots: Vec<PathBuf>,

    /// Kind of files collected in directories
    file_class: FileClass,

    /// How entries are assembled from the base directories
    strategy: VariantStrategy,

    /// Metadata loaded on every directory read
    meta: Box<dyn MetaLoader>,

    /// Cached directories by canonical path
    dirs: RwLock<HashMap<String, Arc<Directory>>>,

    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<S: DirSource> DirCache<S> {
    /// Create a cache over `roots`.
    ///
    /// More than one root selects [`VariantStrategy::Scaled`].
    pub fn new(source: S, roots: Vec<PathBuf>) -> Self {
        let strategy = if roots.len() > 1 {
            VariantStrategy::Scaled
        } else {
            VariantStrategy::Single
        };
        Self {
            source,
            roots,
            file_class: FileClass::Image,
            strategy,
            meta: Box::new(NoMeta),
            dirs: RwLock::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn with_strategy(mut self, strategy: VariantStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_file_class(mut self, file_class: FileClass) -> Self {
        self.file_class = file_class;
        self
    }

    pub fn with_meta_loader(mut self, loader: impl MetaLoader + 'static) -> Self {
        self.meta = Box::new(loader);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn strategy(&self) -> VariantStrategy {
        self.strategy
    }

    /// Directory for a canonical path.
    ///
    /// If `path` is not a directory (typically a file), the directory
    /// containing it is returned. Returns `Ok(None)` if neither exists.
    pub async fn get_directory(&self, path: &str) -> Result<Option<Arc<Directory>>, IoError> {
        if let Some(dir) = self.cached_directory(path).await? {
            return Ok(Some(dir));
        }
        match parent_path(path) {
            Some(parent) => self.cached_directory(parent).await,
            None => Ok(None),
        }
    }

    /// Entry for a canonical path and a 1-based page number.
    ///
    /// A directory path selects the entry at position `pn`. Any other path is
    /// looked up by file name in its parent directory and `pn` is ignored.
    pub async fn get_file(&self, path: &str, pn: i64) -> Result<Option<DirEntry>, IoError> {
        Ok(self.locate(path, pn).await?.map(|(_, entry)| entry))
    }

    /// Like [`get_file`](Self::get_file), also returning the owning directory.
    pub async fn locate(
        &self,
        path: &str,
        pn: i64,
    ) -> Result<Option<(Arc<Directory>, DirEntry)>, IoError> {
        if let Some(dir) = self.cached_directory(path).await? {
            let entry = dir.listing().await.page(pn).cloned();
            return Ok(entry.map(|e| (dir, e)));
        }

        let Some(parent) = parent_path(path) else {
            return Ok(None);
        };
        let Some(dir) = self.cached_directory(parent).await? else {
            return Ok(None);
        };
        let entry = self.find(&dir, file_name(path)).await?;
        Ok(entry.map(|e| (dir, e)))
    }

    /// Bring `dir` up to date with the filesystem.
    ///
    /// Re-reads the directory if it was never read or its modification time
    /// advanced since the last read. Returns whether the directory exists.
    pub async fn refresh(&self, dir: &Directory) -> Result<bool, IoError> {
        let _guard = dir.refresh_lock().lock().await;
        let current = dir.listing().await;

        let modified = match self.source.stat(&self.primary_path(dir.name())).await? {
            Some(FsStat {
                kind: EntryKind::Directory,
                modified,
            }) => modified,
            _ => {
                if current.is_valid() || !current.is_read() {
                    debug!(dir = dir.name(), "Directory no longer exists");
                    dir.replace(Listing::missing()).await;
                }
                return Ok(false);
            }
        };

        let stale = current
            .disk_modified()
            .map_or(true, |recorded| modified > recorded);
        if stale {
            let listing = self.read_listing(dir, modified).await?;
            dir.replace(listing).await;
        }
        Ok(true)
    }

    /// Position of `name` in `dir`, reading the directory first if needed.
    pub async fn index_of(&self, dir: &Directory, name: &str) -> Result<Option<usize>, IoError> {
        Ok(self.read_listing_snapshot(dir).await?.index_of(name))
    }

    /// Entry of `dir` matching `name`, reading the directory first if needed.
    pub async fn find(&self, dir: &Directory, name: &str) -> Result<Option<DirEntry>, IoError> {
        Ok(self.read_listing_snapshot(dir).await?.find(name).cloned())
    }

    /// Enclosing directory of `dir`, through the cache.
    pub async fn parent(&self, dir: &Directory) -> Result<Option<Arc<Directory>>, IoError> {
        match dir.parent_name() {
            Some(parent) => self.cached_directory(parent).await,
            None => Ok(None),
        }
    }

    /// Number of cached directories.
    pub async fn cached_count(&self) -> usize {
        self.dirs.read().await.len()
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            directories: self.cached_count().await,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Location of a canonical path in the primary base directory.
    pub fn primary_path(&self, path: &str) -> PathBuf {
        match self.roots.first() {
            Some(root) => join_root(root, path),
            None => PathBuf::from(path),
        }
    }

    /// Cached and refreshed directory at exactly `path`.
    async fn cached_directory(&self, path: &str) -> Result<Option<Arc<Directory>>, IoError> {
        let cached = self.dirs.read().await.get(path).cloned();
        if let Some(dir) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(self.refresh(&dir).await?.then_some(dir));
        }

        match self.source.stat(&self.primary_path(path)).await? {
            Some(stat) if stat.kind == EntryKind::Directory => {}
            _ => return Ok(None),
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let dir = {
            let mut dirs = self.dirs.write().await;
            dirs.entry(path.to_string())
                .or_insert_with(|| Arc::new(Directory::new(path, self.file_class)))
                .clone()
        };
        Ok(self.refresh(&dir).await?.then_some(dir))
    }

    /// Current listing of `dir`, read first if it never was.
    async fn read_listing_snapshot(&self, dir: &Directory) -> Result<Arc<Listing>, IoError> {
        let listing = dir.listing().await;
        if listing.is_read() {
            return Ok(listing);
        }
        self.refresh(dir).await?;
        Ok(dir.listing().await)
    }

    /// Read `dir` from disk. Must be called with the directory's refresh lock held.
    async fn read_listing(&self, dir: &Directory, modified: SystemTime) -> Result<Listing, IoError> {
        let path = self.primary_path(dir.name());
        let class = dir.file_class();

        let names: Vec<String> = self
            .source
            .list(&path)
            .await?
            .into_iter()
            .filter(|e| e.kind == EntryKind::File && class.matches(&e.name))
            .map(|e| e.name)
            .collect();

        let entries = self
            .strategy
            .build_entries(&self.source, &self.roots, dir.name(), names, class)
            .await?;

        let meta = self.load_meta(&path).await;

        info!(dir = dir.name(), entries = entries.len(), "Read directory");
        Ok(Listing::new(entries, modified, meta))
    }

    async fn load_meta(&self, path: &Path) -> Option<DirMeta> {
        match self.meta.load(path).await {
            Ok(meta) => meta,
            Err(e) => {
                warn!(dir = %path.display(), error = %e, "Failed to load directory metadata");
                None
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
