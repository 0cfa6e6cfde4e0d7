//! Resolution of decoded requests to directory entries.
//!
//! The [`Resolver`] ties the decoders and the directory cache together: it
//! computes the canonical file path of a request, looks it up in the
//! [`DirCache`] and writes what it learned about the image back into the
//! request parameters for the services that consume them.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::codec::{RequestDecoder, WireFormat};
use crate::dir::{DirCache, DirEntry, DirSource, Directory, ImageInfo};
use crate::error::{IoError, ResolveError};
use crate::params::{
    ParamValue, RequestParams, FN, IMG_DPIX, IMG_DPIY, IMG_FN, IMG_PIX_X, IMG_PIX_Y, PT,
    REQUEST_PATH,
};

/// A successfully resolved request.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Directory owning the entry
    pub directory: Arc<Directory>,
    /// The requested entry
    pub entry: DirEntry,
    /// Canonical path of the entry's file
    pub path: String,
    /// Size and resolution of the highest resolution variant, if it could be probed
    pub info: Option<ImageInfo>,
}

/// Decodes requests and resolves them against a directory cache.
pub struct Resolver<S: DirSource> {
    cache: Arc<DirCache<S>>,
    decoder: RequestDecoder,
}

impl<S: DirSource> Resolver<S> {
    pub fn new(cache: Arc<DirCache<S>>, decoder: RequestDecoder) -> Self {
        Self { cache, decoder }
    }

    pub fn cache(&self) -> &Arc<DirCache<S>> {
        &self.cache
    }

    pub fn decoder(&self) -> &RequestDecoder {
        &self.decoder
    }

    /// Decode a raw request.
    pub fn decode(&self, format: WireFormat, raw: &str) -> RequestParams {
        self.decoder.decode(format, raw)
    }

    /// Resolve `params` to a directory entry.
    ///
    /// A path naming a directory selects the entry at page `pn`; a path naming
    /// a file is looked up by name. On success `img.fn`, `img.pix_x`,
    /// `img.pix_y`, `img.dpix`, `img.dpiy` and `pt` are written to `params`.
    pub async fn resolve(&self, params: &mut RequestParams) -> Result<Resolved, ResolveError> {
        let path = params.file_path().ok_or_else(|| {
            ResolveError::InvalidPath(format!(
                "{}{}",
                params.str_value(REQUEST_PATH).unwrap_or(""),
                params.str_value(FN).unwrap_or("")
            ))
        })?;
        let pn = params.page_number();

        let (directory, entry) = self
            .cache
            .locate(&path, pn)
            .await
            .map_err(|e| unreadable(&path, e))?
            .ok_or_else(|| ResolveError::NotFound(path.clone()))?;

        let info = match entry.hires() {
            Some(variant) => variant.info(self.cache.source()).await,
            None => None,
        };

        let file_path = if directory.name().is_empty() {
            entry.name().to_string()
        } else {
            format!("{}/{}", directory.name(), entry.name())
        };

        let page_count = i64::try_from(directory.len().await).unwrap_or(i64::MAX);
        set_known(params, PT, page_count);
        set_known(params, IMG_FN, file_path.as_str());
        if let Some(info) = info {
            set_known(params, IMG_PIX_X, i64::from(info.width));
            set_known(params, IMG_PIX_Y, i64::from(info.height));
            if let Some((dpi_x, dpi_y)) = info.dpi {
                set_known(params, IMG_DPIX, dpi_x);
                set_known(params, IMG_DPIY, dpi_y);
            }
        }

        debug!(path = %path, pn = pn, file = %file_path, "Resolved request");

        Ok(Resolved {
            directory,
            entry,
            path: file_path,
            info,
        })
    }

    /// Directory for a canonical path, or the directory containing it.
    ///
    /// Like [`resolve`](Self::resolve), an unreadable directory is reported
    /// as not found.
    pub async fn directory(&self, path: &str) -> Result<Arc<Directory>, ResolveError> {
        self.cache
            .get_directory(path)
            .await
            .map_err(|e| unreadable(path, e))?
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }

    /// Decode a raw request and resolve it.
    ///
    /// The decoded parameters are returned even if resolution fails.
    pub async fn decode_and_resolve(
        &self,
        format: WireFormat,
        raw: &str,
    ) -> (RequestParams, Result<Resolved, ResolveError>) {
        let mut params = self.decode(format, raw);
        let result = self.resolve(&mut params).await;
        (params, result)
    }
}

/// A directory that cannot be read resolves to nothing.
fn unreadable(path: &str, err: IoError) -> ResolveError {
    warn!(path = path, error = %err, "Unreadable directory, treating as not found");
    ResolveError::NotFound(path.to_string())
}

/// Set a parameter that is part of the fixed schema.
fn set_known(params: &mut RequestParams, name: &str, value: impl Into<ParamValue>) {
    if let Err(e) = params.set(name, value) {
        debug!(param = name, error = %e, "Failed to set schema parameter");
    }
}
