use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::entry::FileClass;
use super::listing::Listing;
use super::path::parent_path;

/// A cached directory.
///
/// The current [`Listing`] is held behind an `Arc` and replaced wholesale on
/// refresh. Reads and refreshes are serialized by a per-directory lock owned
/// by the cache; lookups only take the snapshot.
#[derive(Debug)]
pub struct Directory {
    name: String,
    parent: Option<String>,
    file_class: FileClass,
    listing: RwLock<Arc<Listing>>,
    refresh_lock: Mutex<()>,
}

impl Directory {
    pub(crate) fn new(name: impl Into<String>, file_class: FileClass) -> Self {
        let name = name.into();
        let parent = parent_path(&name).map(str::to_string);
        Self {
            name,
            parent,
            file_class,
            listing: RwLock::new(Arc::new(Listing::unread())),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Canonical path, `""` for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical path of the enclosing directory.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn file_class(&self) -> FileClass {
        self.file_class
    }

    /// Current snapshot. May be unread.
    pub async fn listing(&self) -> Arc<Listing> {
        self.listing.read().await.clone()
    }

    pub async fn is_read(&self) -> bool {
        self.listing.read().await.is_read()
    }

    pub async fn is_valid(&self) -> bool {
        self.listing.read().await.is_valid()
    }

    pub async fn len(&self) -> usize {
        self.listing.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listing.read().await.is_empty()
    }

    pub(crate) fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh_lock
    }

    pub(crate) async fn replace(&self, listing: Listing) {
        *self.listing.write().await = Arc::new(listing);
    }
}
