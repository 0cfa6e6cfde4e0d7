//! How entries are assembled from one or more base directories.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::IoError;

use super::entry::{DirEntry, FileClass, ImageVariant};
use super::path::{basename, join_root};
use super::source::{DirSource, EntryKind};

/// Variant resolution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantStrategy {
    /// One variant per entry, from the first base directory
    #[default]
    Single,
    /// Files with the same basename in later (lower resolution) base
    /// directories become additional variants
    Scaled,
}

impl VariantStrategy {
    /// Build entries for `names`, the sorted file names of `dir` in the
    /// first base directory.
    ///
    /// Lower resolution directories are optional: a missing or unreadable
    /// one contributes no variants.
    pub async fn build_entries<S: DirSource + ?Sized>(
        self,
        source: &S,
        roots: &[PathBuf],
        dir: &str,
        names: Vec<String>,
        class: FileClass,
    ) -> Result<Vec<DirEntry>, IoError> {
        let Some((primary, lower)) = roots.split_first() else {
            return Ok(Vec::new());
        };
        let primary_dir = join_root(primary, dir);

        let lower_dirs: Vec<(PathBuf, HashMap<String, String>)> = match self {
            VariantStrategy::Single => Vec::new(),
            VariantStrategy::Scaled => {
                let mut dirs = Vec::with_capacity(lower.len());
                for root in lower {
                    let path = join_root(root, dir);
                    match source.list(&path).await {
                        Ok(files) => {
                            let by_basename = files
                                .into_iter()
                                .filter(|f| f.kind == EntryKind::File && class.matches(&f.name))
                                .map(|f| (basename(&f.name).to_string(), f.name))
                                .collect();
                            dirs.push((path, by_basename));
                        }
                        Err(IoError::NotFound(_)) => {
                            debug!(dir = %path.display(), "No scaled directory");
                        }
                        Err(e) => {
                            warn!(dir = %path.display(), error = %e, "Skipping unreadable scaled directory");
                        }
                    }
                }
                dirs
            }
        };

        let entries = names
            .into_iter()
            .map(|name| {
                let mut variants = vec![Arc::new(ImageVariant::new(primary_dir.join(&name)))];
                for (path, by_basename) in &lower_dirs {
                    if let Some(file) = by_basename.get(basename(&name)) {
                        variants.push(Arc::new(ImageVariant::new(path.join(file))));
                    }
                }
                DirEntry::new(name, variants)
            })
            .collect();

        Ok(entries)
    }
}
