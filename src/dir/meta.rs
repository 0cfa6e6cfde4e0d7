//! Descriptive metadata attached to a directory when it is read.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::MetaError;

/// Auxiliary descriptive metadata of a directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

/// Loads [`DirMeta`] for a directory.
///
/// Called once per directory read with the directory's location in the
/// primary base directory. Errors are logged by the cache and the directory
/// is used without metadata.
#[async_trait]
pub trait MetaLoader: Send + Sync {
    async fn load(&self, dir: &Path) -> Result<Option<DirMeta>, MetaError>;
}

/// Loader that never finds metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMeta;

#[async_trait]
impl MetaLoader for NoMeta {
    async fn load(&self, _dir: &Path) -> Result<Option<DirMeta>, MetaError> {
        Ok(None)
    }
}
