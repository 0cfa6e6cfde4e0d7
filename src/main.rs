//! Docuserver - resolves page image requests against scanned-document directories.
//!
//! This binary starts the HTTP server and configures all components.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docuserver::{
    codec::RequestDecoder,
    config::Config,
    dir::{DirCache, LocalFs},
    resolve::Resolver,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Docuserver v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    for (i, dir) in config.base_dirs.iter().enumerate() {
        let role = if i == 0 { "primary" } else { "scaled" };
        if dir.is_dir() {
            info!("  Base dir ({}): {}", role, dir.display());
        } else {
            warn!("  Base dir ({}): {} (not a directory)", role, dir.display());
        }
    }
    info!("  IIIF prefix: /{}", config.iiif_prefix);
    info!("  Cache max-age: {}s", config.cache_max_age);

    let cache = DirCache::new(LocalFs::new(), config.base_dirs.clone());
    info!("  Variant strategy: {:?}", cache.strategy());

    let decoder = RequestDecoder::new(config.iiif_syntax());
    let resolver = Resolver::new(Arc::new(cache), decoder);

    let router = create_router(resolver, build_router_config(&config));

    let addr = config.bind_address();

    info!("");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl 'http://{}/dirinfo?fn=<dir>'", addr);
    info!("    curl 'http://{}/scaler?fn=<dir>&pn=1'", addr);
    info!("    curl http://{}/{}/<dir>!<file>/info.json", addr, config.iiif_prefix);
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "docuserver=debug,tower_http=debug"
    } else {
        "docuserver=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    router_config
}
