//! Directory entries and their on-disk variants.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::warn;

use super::path::{basename, extension};
use super::source::DirSource;

/// Kind of files a directory collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    #[default]
    Image,
    Text,
    Svg,
}

impl FileClass {
    /// File extensions (lowercase) belonging to this class.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileClass::Image => &[
                "jpg", "jpeg", "jp2", "jpx", "png", "gif", "tif", "tiff", "webp", "bmp",
            ],
            FileClass::Text => &["txt", "xml", "html", "htm", "md"],
            FileClass::Svg => &["svg"],
        }
    }

    /// Whether `name` is a visible file of this class.
    pub fn matches(self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        extension(name).is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}

/// Pixel size and resolution of an image file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Horizontal and vertical dots per inch, if the file records them
    pub dpi: Option<(f64, f64)>,
}

impl ImageInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            dpi: None,
        }
    }

    pub fn with_dpi(mut self, dpi_x: f64, dpi_y: f64) -> Self {
        self.dpi = Some((dpi_x, dpi_y));
        self
    }
}

/// One concrete file backing a [`DirEntry`].
///
/// The image header is probed at most once, on first call to [`info`](Self::info).
/// A failed probe is remembered as `None` until the owning listing is re-read.
#[derive(Debug)]
pub struct ImageVariant {
    path: PathBuf,
    info: OnceCell<Option<ImageInfo>>,
}

impl ImageVariant {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            info: OnceCell::new(),
        }
    }

    /// Filesystem path of the variant.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the header has been probed already.
    pub fn is_probed(&self) -> bool {
        self.info.initialized()
    }

    /// Size and resolution, probed through `source` on first use.
    pub async fn info<S: DirSource + ?Sized>(&self, source: &S) -> Option<ImageInfo> {
        *self
            .info
            .get_or_init(|| async {
                match source.probe(&self.path).await {
                    Ok(info) => Some(info),
                    Err(e) => {
                        warn!(path = %self.path.display(), error = %e, "Failed to probe image variant");
                        None
                    }
                }
            })
            .await
    }
}

/// One addressable resource of a directory.
///
/// Variants are ordered from highest to lowest resolution.
#[derive(Debug, Clone)]
pub struct DirEntry {
    name: String,
    variants: Vec<Arc<ImageVariant>>,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, variants: Vec<Arc<ImageVariant>>) -> Self {
        Self {
            name: name.into(),
            variants,
        }
    }

    /// File name in the primary base directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without extension.
    pub fn basename(&self) -> &str {
        basename(&self.name)
    }

    pub fn variants(&self) -> &[Arc<ImageVariant>] {
        &self.variants
    }

    /// Highest resolution variant.
    pub fn hires(&self) -> Option<&Arc<ImageVariant>> {
        self.variants.first()
    }

    /// Lowest resolution variant.
    pub fn lores(&self) -> Option<&Arc<ImageVariant>> {
        self.variants.last()
    }
}
