//! HTTP request handlers.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /{prefix}/{*path}` - IIIF Image API request
//! - `GET /scaler?{query}` - Query-string or legacy request
//! - `GET /scaler/{*dir}?{query}` - Same, relative to a directory
//! - `GET /dirinfo?fn={path}` - Directory summary

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::codec::WireFormat;
use crate::dir::{normalize_path, DirMeta, DirSource};
use crate::error::{IoError, ResolveError};
use crate::params::{RequestParams, OPT_INFO, REQUEST_PATH};
use crate::resolve::{Resolved, Resolver};

/// IIIF Image API context of info responses.
pub const IIIF_CONTEXT: &str = "http://iiif.io/api/image/2/context.json";

/// IIIF Image API compliance profile of info responses.
pub const IIIF_PROFILE: &str = "http://iiif.io/api/image/2/level1.json";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the resolver.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S: DirSource> {
    /// Decodes and resolves requests
    pub resolver: Arc<Resolver<S>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,
}

impl<S: DirSource> AppState<S> {
    pub fn new(resolver: Resolver<S>) -> Self {
        Self::with_cache_max_age(resolver, 3600)
    }

    pub fn with_cache_max_age(resolver: Resolver<S>, cache_max_age: u32) -> Self {
        Self {
            resolver: Arc::new(resolver),
            cache_max_age,
        }
    }

    fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }
}

impl<S: DirSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the directory info endpoint.
#[derive(Debug, Deserialize)]
pub struct DirInfoQueryParams {
    /// Directory path, or a file path inside the directory
    #[serde(rename = "fn", default)]
    pub path: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_path")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// A resolved request.
#[derive(Debug, Serialize)]
pub struct ResolutionResponse {
    /// Canonical path of the resolved file
    pub path: String,

    /// Canonical path of the owning directory
    pub directory: String,

    /// Requested page number
    pub page: i64,

    /// Number of entries in the directory
    pub page_count: usize,

    /// Pixel size of the highest resolution variant, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Files backing the entry, highest resolution first
    pub variants: Vec<VariantResponse>,

    /// The request re-encoded as a query string
    pub query: String,
}

/// One file backing an entry.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct VariantResponse {
    /// Path relative to its base directory
    pub path: String,

    /// Index of the base directory, 0 for the highest resolution
    pub level: usize,
}

impl VariantResponse {
    /// Locate `file` below the most specific of `roots`.
    fn locate(roots: &[PathBuf], file: &FsPath) -> Option<Self> {
        roots
            .iter()
            .enumerate()
            .filter_map(|(level, root)| {
                let relative = file.strip_prefix(root).ok()?;
                Some((root.as_os_str().len(), level, relative))
            })
            .max_by_key(|(len, _, _)| *len)
            .map(|(_, level, relative)| Self {
                path: relative.display().to_string(),
                level,
            })
    }
}

impl ResolutionResponse {
    async fn build(params: &RequestParams, resolved: &Resolved, roots: &[PathBuf]) -> Self {
        Self {
            path: resolved.path.clone(),
            directory: resolved.directory.name().to_string(),
            page: params.page_number(),
            page_count: resolved.directory.len().await,
            width: resolved.info.map(|i| i.width),
            height: resolved.info.map(|i| i.height),
            variants: resolved
                .entry
                .variants()
                .iter()
                .filter_map(|v| VariantResponse::locate(roots, v.path()))
                .collect(),
            query: params.to_wire_string(),
        }
    }
}

/// Summary of a directory.
#[derive(Debug, Serialize)]
pub struct DirInfoResponse {
    /// Canonical path, empty for the root
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Number of entries
    pub count: usize,

    /// Entry names in page order
    pub files: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<DirMeta>,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ResolveError to HTTP response.
///
/// 5xx errors are logged at ERROR level, 404 at DEBUG and other 4xx at WARN.
impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ResolveError::InvalidPath(path) => (
                StatusCode::BAD_REQUEST,
                "invalid_path",
                format!("Invalid path: {}", path),
            ),

            ResolveError::NotFound(path) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("File not found: {}", path),
            ),

            // filesystem paths stay in the log
            ResolveError::Io(io_err) => {
                let (status, error_type, message) = match io_err {
                    IoError::NotFound(_) => (
                        StatusCode::NOT_FOUND,
                        "not_found",
                        "Resource not found".to_string(),
                    ),
                    IoError::Read { .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "io_error",
                        "Failed to read from storage".to_string(),
                    ),
                    IoError::Probe { .. } => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "probe_error",
                        "Image size unavailable".to_string(),
                    ),
                };
                error!(error = %io_err, "Storage error");
                (status, error_type, message)
            }
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);

        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// `GET /health` answers `{"status": "healthy", "version": "..."}`.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle IIIF Image API requests.
///
/// # Endpoint
///
/// `GET /{prefix}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}`
///
/// The path is decoded as sent, before percent-decoding, so that an encoded
/// `/` in the identifier does not split a segment.
///
/// # Response
///
/// - `200 OK`: `info.json` for info requests, the resolution otherwise
/// - `400 Bad Request`: Path leaves the base directory
/// - `404 Not Found`: No such directory or file
/// - `500 Internal Server Error`: Filesystem error
pub async fn iiif_handler<S: DirSource>(
    State(state): State<AppState<S>>,
    uri: Uri,
) -> Result<Response, ResolveError> {
    let raw = uri.path().trim_start_matches('/');
    let (params, result) = state
        .resolver
        .decode_and_resolve(WireFormat::Iiif, raw)
        .await;
    let resolved = result?;

    if params.has_option(OPT_INFO) {
        let info = resolved.info.ok_or_else(|| IoError::Probe {
            path: resolved.path.clone(),
            message: "image size unavailable".to_string(),
        })?;
        let id = uri
            .path()
            .trim_end_matches('/')
            .trim_end_matches("/info.json")
            .to_string();
        let body = json!({
            "@context": IIIF_CONTEXT,
            "@id": id,
            "protocol": "http://iiif.io/api/image",
            "width": info.width,
            "height": info.height,
            "profile": [IIIF_PROFILE],
        });
        return Ok(json_response(&state, body));
    }

    let roots = state.resolver.cache().roots();
    let body = ResolutionResponse::build(&params, &resolved, roots).await;
    Ok(json_response(&state, body))
}

/// Handle scaler requests without a directory prefix.
///
/// `GET /scaler?fn=books/vol1&pn=3` or, in legacy form, `GET /scaler?books/vol1+3`.
pub async fn scaler_handler<S: DirSource>(
    State(state): State<AppState<S>>,
    RawQuery(query): RawQuery,
) -> Result<Response, ResolveError> {
    scale(&state, None, query.as_deref().unwrap_or("")).await
}

/// Handle scaler requests relative to a directory.
///
/// `GET /scaler/books?fn=vol1&pn=3` resolves `books/vol1`, page 3.
pub async fn scaler_dir_handler<S: DirSource>(
    State(state): State<AppState<S>>,
    Path(dir): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, ResolveError> {
    scale(&state, Some(&dir), query.as_deref().unwrap_or("")).await
}

async fn scale<S: DirSource>(
    state: &AppState<S>,
    dir: Option<&str>,
    raw: &str,
) -> Result<Response, ResolveError> {
    let format = WireFormat::detect_query(raw);
    let mut params = match format {
        // legacy fields are delimited by '+', so only percent-decode
        WireFormat::Legacy => {
            let decoded = urlencoding::decode(raw)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            state.resolver.decode(format, &decoded)
        }
        _ => state.resolver.decode(format, raw),
    };

    if let Some(dir) = dir {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        // request.path is part of the schema
        let _ = params.set(REQUEST_PATH, prefix);
    }

    let resolved = state.resolver.resolve(&mut params).await?;
    let roots = state.resolver.cache().roots();
    let body = ResolutionResponse::build(&params, &resolved, roots).await;
    Ok(json_response(state, body))
}

/// Handle directory info requests.
///
/// `GET /dirinfo?fn=books/vol1` answers the directory's entries. A file path
/// answers the directory containing the file.
pub async fn dirinfo_handler<S: DirSource>(
    State(state): State<AppState<S>>,
    Query(query): Query<DirInfoQueryParams>,
) -> Result<Response, ResolveError> {
    let path =
        normalize_path(&query.path).ok_or_else(|| ResolveError::InvalidPath(query.path.clone()))?;

    let dir = state.resolver.directory(&path).await?;

    let listing = dir.listing().await;
    let body = DirInfoResponse {
        path: dir.name().to_string(),
        parent: dir.parent_name().map(str::to_string),
        count: listing.len(),
        files: listing.entries().iter().map(|e| e.name().to_string()).collect(),
        meta: listing.meta().cloned(),
    };
    Ok(json_response(&state, body))
}

fn json_response<S: DirSource>(state: &AppState<S>, body: impl Serialize) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, state.cache_control())],
        Json(body),
    )
        .into_response()
}

// =============================================================================
// Tests
// =============================================================================
