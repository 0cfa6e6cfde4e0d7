//! # Docuserver
//!
//! Request resolution for a scanned-page image server.
//!
//! Page images are addressed by a directory path and a page number or file
//! name. Requests arrive in one of three encodings and are decoded into one
//! typed parameter model, which is then resolved against a cache of the
//! image directories on disk.
//!
//! ## Features
//!
//! - **Three wire formats**: legacy `fn+pn+ws+...`, query strings and IIIF Image API paths
//! - **Lenient decoding**: malformed fields are skipped, unknown parameters are kept
//! - **Lazy directory cache**: directories are read on first use and re-read when their
//!   modification time changes
//! - **Fuzzy lookup**: files are found with or without their extension
//! - **Multi-resolution**: scaled copies in further base directories become variants
//!
//! ## Architecture
//!
//! - [`params`] - Typed request parameters
//! - [`codec`] - Legacy, query-string and IIIF decoders
//! - [`dir`] - Filesystem abstraction, directories and the directory cache
//! - [`resolve`] - Request to directory entry resolution
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use docuserver::{DirCache, LocalFs, RequestDecoder, Resolver, WireFormat};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = DirCache::new(LocalFs::new(), vec!["/data/hires".into()]);
//!     let resolver = Resolver::new(Arc::new(cache), RequestDecoder::default());
//!
//!     let (params, result) = resolver
//!         .decode_and_resolve(WireFormat::Query, "fn=books/vol1&pn=3")
//!         .await;
//!     if let Ok(resolved) = result {
//!         println!("{} -> {}", params.to_wire_string(), resolved.path);
//!     }
//! }
//! ```

pub mod codec;
pub mod config;
pub mod dir;
pub mod error;
pub mod params;
pub mod resolve;
pub mod server;

// Re-export commonly used types
pub use codec::{
    decode_iiif, decode_legacy, decode_query, IiifSyntax, RequestDecoder, WireFormat,
};
pub use config::Config;
pub use dir::{
    normalize_path, CacheStats, DirCache, DirEntry, DirMeta, DirSource, Directory, FileClass,
    ImageInfo, ImageVariant, Listing, LocalFs, MetaLoader, NoMeta, VariantStrategy,
};
pub use error::{IoError, MetaError, ParamError, ResolveError};
pub use params::{OptionSet, ParamKind, ParamValue, Parameter, RequestParams, ValueType};
pub use resolve::{Resolved, Resolver};
pub use server::{create_router, AppState, ErrorResponse, HealthResponse, RouterConfig};
