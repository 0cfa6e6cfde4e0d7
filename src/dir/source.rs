//! Filesystem access for the directory cache.
//!
//! The cache never touches the filesystem directly; it goes through a
//! [`DirSource`]. [`LocalFs`] is the implementation for local disks, tests
//! use in-memory sources with controllable modification times.

use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use crate::error::IoError;

use super::dpi::read_dpi;
use super::entry::ImageInfo;

/// Kind of a filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Result of a stat call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStat {
    pub kind: EntryKind,
    pub modified: SystemTime,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl FsEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// Filesystem operations needed to build and refresh directories.
#[async_trait]
pub trait DirSource: Send + Sync {
    /// Stat a path. Returns `Ok(None)` if it does not exist.
    async fn stat(&self, path: &Path) -> Result<Option<FsStat>, IoError>;

    /// List the entries of a directory, in no particular order.
    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>, IoError>;

    /// Read the pixel size (and resolution, if known) of an image file.
    async fn probe(&self, path: &Path) -> Result<ImageInfo, IoError>;
}

// =============================================================================
// LocalFs
// =============================================================================

/// [`DirSource`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DirSource for LocalFs {
    async fn stat(&self, path: &Path) -> Result<Option<FsStat>, IoError> {
        let path_name = path.display().to_string();
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) => {
                return match IoError::from_std(path_name, &e) {
                    IoError::NotFound(_) => Ok(None),
                    err => Err(err),
                };
            }
        };
        let modified = metadata
            .modified()
            .map_err(|e| IoError::from_std(path_name, &e))?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Ok(Some(FsStat { kind, modified }))
    }

    async fn list(&self, path: &Path) -> Result<Vec<FsEntry>, IoError> {
        let dir_name = path.display().to_string();
        let mut read_dir = tokio::fs::read_dir(path)
            .await
            .map_err(|e| IoError::from_std(dir_name.clone(), &e))?;

        let mut entries = Vec::new();
        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| IoError::from_std(dir_name.clone(), &e))?
        {
            let Ok(name) = entry.file_name().into_string() else {
                debug!(dir = %dir_name, "Skipping entry with non UTF-8 name");
                continue;
            };
            // follow symlinks
            let is_dir = match tokio::fs::metadata(entry.path()).await {
                Ok(m) => m.is_dir(),
                Err(_) => continue,
            };
            entries.push(FsEntry {
                name,
                kind: if is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            });
        }
        Ok(entries)
    }

    async fn probe(&self, path: &Path) -> Result<ImageInfo, IoError> {
        let owned = path.to_path_buf();
        let file_name = path.display().to_string();

        let probed = tokio::task::spawn_blocking(move || {
            image::image_dimensions(&owned).map(|size| (size, read_dpi(&owned)))
        })
        .await
        .map_err(|e| IoError::Probe {
            path: file_name.clone(),
            message: e.to_string(),
        })?;

        let ((width, height), dpi) = probed.map_err(|e| IoError::Probe {
            path: file_name,
            message: e.to_string(),
        })?;

        let info = ImageInfo::new(width, height);
        Ok(match dpi {
            Some((dpi_x, dpi_y)) => info.with_dpi(dpi_x, dpi_y),
            None => info,
        })
    }
}
