//! Immutable snapshot of a directory's contents.

use std::time::SystemTime;

use super::entry::DirEntry;
use super::meta::DirMeta;
use super::path::basename;

/// Sorted entries of a directory as of one read.
///
/// A listing is never mutated: a refresh builds a new one and swaps it in,
/// so readers holding an older snapshot keep a consistent view.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    entries: Vec<DirEntry>,
    valid: bool,
    disk_modified: Option<SystemTime>,
    read_at: Option<SystemTime>,
    meta: Option<DirMeta>,
}

impl Listing {
    /// A listing that has not been read yet.
    pub fn unread() -> Self {
        Self::default()
    }

    /// Result of reading a directory that does not exist on disk.
    pub fn missing() -> Self {
        Self {
            read_at: Some(SystemTime::now()),
            ..Self::default()
        }
    }

    /// Listing of a directory read from disk. Entries are sorted by name.
    pub fn new(mut entries: Vec<DirEntry>, disk_modified: SystemTime, meta: Option<DirMeta>) -> Self {
        entries.sort_by(|a, b| a.name().cmp(b.name()));
        Self {
            entries,
            valid: true,
            disk_modified: Some(disk_modified),
            read_at: Some(SystemTime::now()),
            meta,
        }
    }

    /// Whether the directory has been read at least once.
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Whether the directory existed when it was last read.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Modification time of the directory when it was read.
    pub fn disk_modified(&self) -> Option<SystemTime> {
        self.disk_modified
    }

    pub fn read_at(&self) -> Option<SystemTime> {
        self.read_at
    }

    pub fn meta(&self) -> Option<&DirMeta> {
        self.meta.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&DirEntry> {
        self.entries.get(index)
    }

    /// Entry at a 1-based page number.
    pub fn page(&self, pn: i64) -> Option<&DirEntry> {
        let index = usize::try_from(pn).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }

    /// Position of `name` in the listing.
    ///
    /// Exact matches are found by binary search. Otherwise the insertion
    /// point and its two neighbours are checked, in that order, for an entry
    /// whose basename equals the basename of `name` or `name` itself. Entries
    /// further away are not considered.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        let idx = match self.entries.binary_search_by(|e| e.name().cmp(name)) {
            Ok(idx) => return Some(idx),
            Err(idx) => idx,
        };

        let wanted = basename(name);
        let matches = |i: usize| {
            self.entries
                .get(i)
                .is_some_and(|e| e.basename() == wanted || e.basename() == name)
        };

        [Some(idx), idx.checked_sub(1), idx.checked_add(1)]
            .into_iter()
            .flatten()
            .find(|&i| matches(i))
    }

    /// Entry matching `name`, see [`index_of`](Self::index_of).
    pub fn find(&self, name: &str) -> Option<&DirEntry> {
        self.index_of(name).and_then(|i| self.entries.get(i))
    }
}
