//! Configuration management.
//!
//! Settings come from command-line arguments via clap, with environment
//! variables (prefix `DOCU_`) as fallback and defaults for everything but the
//! base directories.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use docuserver::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Serving {:?} on {}", config.base_dirs, config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `DOCU_HOST` - Server bind address (default: 0.0.0.0)
//! - `DOCU_PORT` - Server port (default: 8080)
//! - `DOCU_BASE_DIRS` - Image base directories, highest resolution first (required)
//! - `DOCU_IIIF_PREFIX` - First path segment of IIIF requests (default: iiif)
//! - `DOCU_IIIF_SLASH_REPLACEMENT` - Stands for `/` in IIIF identifiers (default: !)
//! - `DOCU_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `DOCU_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::path::PathBuf;

use clap::Parser;

use crate::codec::{IiifSyntax, DEFAULT_IIIF_PREFIX, DEFAULT_SLASH_REPLACEMENT};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

/// Paths the router uses itself; the IIIF prefix may not shadow them.
const RESERVED_PREFIXES: [&str; 3] = ["health", "scaler", "dirinfo"];

// =============================================================================
// CLI Arguments
// =============================================================================

/// Docuserver - resolves page image requests against scanned-document directories.
///
/// Accepts legacy, query-string and IIIF Image API requests and resolves them
/// to image files below one or more base directories.
#[derive(Parser, Debug, Clone)]
#[command(name = "docuserver")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "DOCU_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "DOCU_PORT")]
    pub port: u16,

    // =========================================================================
    // Directory Configuration
    // =========================================================================
    /// Image base directories (comma-separated), highest resolution first.
    ///
    /// Directories after the first hold scaled-down copies of the same files.
    #[arg(long, env = "DOCU_BASE_DIRS", value_delimiter = ',', required = true)]
    pub base_dirs: Vec<PathBuf>,

    // =========================================================================
    // IIIF Configuration
    // =========================================================================
    /// First path segment of IIIF Image API requests.
    #[arg(long, default_value = DEFAULT_IIIF_PREFIX, env = "DOCU_IIIF_PREFIX")]
    pub iiif_prefix: String,

    /// String standing for `/` inside IIIF identifiers.
    ///
    /// Pass an empty string to disable the replacement.
    #[arg(long, default_value = DEFAULT_SLASH_REPLACEMENT, env = "DOCU_IIIF_SLASH_REPLACEMENT")]
    pub iiif_slash_replacement: String,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "DOCU_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "DOCU_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_dirs.is_empty() || self.base_dirs.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(
                "At least one base directory is required. Set --base-dirs or DOCU_BASE_DIRS"
                    .to_string(),
            );
        }

        if self.iiif_prefix.is_empty() || self.iiif_prefix.contains('/') {
            return Err("iiif_prefix must be a single non-empty path segment".to_string());
        }
        if RESERVED_PREFIXES.contains(&self.iiif_prefix.as_str()) {
            return Err(format!(
                "iiif_prefix must not be one of {}",
                RESERVED_PREFIXES.join(", ")
            ));
        }

        if self.iiif_slash_replacement.contains('/') {
            return Err("iiif_slash_replacement must not contain '/'".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// IIIF syntax for the request decoder.
    pub fn iiif_syntax(&self) -> IiifSyntax {
        let syntax = IiifSyntax::with_prefix(&self.iiif_prefix);
        if self.iiif_slash_replacement.is_empty() {
            syntax.without_slash_replacement()
        } else {
            syntax.with_slash_replacement(&self.iiif_slash_replacement)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
