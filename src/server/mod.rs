//! HTTP server layer.
//!
//! A thin axum surface over the resolution pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │      /iiif/...      /scaler?...      /dirinfo?fn=...            │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │  (decode, resolve, JSON) │  │  (router config, CORS)      │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                    Resolver → DirCache
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    dirinfo_handler, health_handler, iiif_handler, scaler_dir_handler, scaler_handler, AppState,
    DirInfoQueryParams, DirInfoResponse, ErrorResponse, HealthResponse, ResolutionResponse,
    VariantResponse,
};
pub use routes::{create_router, RouterConfig};
