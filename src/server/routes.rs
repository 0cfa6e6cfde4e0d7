//! Router configuration.
//!
//! # Route Structure
//!
//! ```text
//! /health                  - Health check
//! /{iiif_prefix}/{*path}   - IIIF Image API (prefix of the resolver's decoder)
//! /scaler                  - Query-string or legacy request
//! /scaler/{*dir}           - Same, relative to a directory
//! /dirinfo                 - Directory summary
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use docuserver::codec::RequestDecoder;
//! use docuserver::dir::{DirCache, LocalFs};
//! use docuserver::resolve::Resolver;
//! use docuserver::server::routes::{create_router, RouterConfig};
//!
//! let cache = DirCache::new(LocalFs, vec!["/data/hires".into()]);
//! let resolver = Resolver::new(Arc::new(cache), RequestDecoder::default());
//!
//! let config = RouterConfig::new()
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(resolver, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    dirinfo_handler, health_handler, iiif_handler, scaler_dir_handler, scaler_handler, AppState,
};
use crate::dir::DirSource;
use crate::resolve::Resolver;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - IIIF requests live below `/iiif`
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set the IIIF path prefix. Must match the decoder's prefix.
    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router<S>(resolver: Resolver<S>, config: RouterConfig) -> Router
where
    S: DirSource + 'static,
{
    let iiif_route = format!(
        "/{}/{{*path}}",
        resolver.decoder().iiif_syntax().prefix.trim_matches('/')
    );

    let app_state = AppState::with_cache_max_age(resolver, config.cache_max_age);
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(&iiif_route, get(iiif_handler::<S>))
        .route("/scaler", get(scaler_handler::<S>))
        .route("/scaler/{*dir}", get(scaler_dir_handler::<S>))
        .route("/dirinfo", get(dirinfo_handler::<S>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
