//! Directory layer.
//!
//! A [`DirCache`] maps canonical paths to [`Directory`] objects. Each directory
//! holds a sorted [`Listing`] of [`DirEntry`] values, one per logical image,
//! each backed by one or more [`ImageVariant`] files. All filesystem access
//! goes through a [`DirSource`].

mod cache;
mod directory;
mod dpi;
mod entry;
mod listing;
mod meta;
mod path;
mod source;
mod strategy;

pub use cache::{CacheStats, DirCache};
pub use directory::Directory;
pub use entry::{DirEntry, FileClass, ImageInfo, ImageVariant};
pub use listing::Listing;
pub use meta::{DirMeta, MetaLoader, NoMeta};
pub use path::{basename, file_name, normalize_path, parent_path};
pub use source::{DirSource, EntryKind, FsEntry, FsStat, LocalFs};
pub use strategy::VariantStrategy;
