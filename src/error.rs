use thiserror::Error;

/// I/O errors raised by a directory source
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Path does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Listing or stat failed
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// Image header could not be probed for size
    #[error("Failed to probe image {path}: {message}")]
    Probe { path: String, message: String },
}

impl IoError {
    /// Build a read error from a `std::io::Error`.
    ///
    /// A missing path and a path running through a file both map to `NotFound`.
    pub fn from_std(path: impl Into<String>, err: &std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory => {
                IoError::NotFound(path)
            }
            _ => IoError::Read {
                path,
                message: err.to_string(),
            },
        }
    }
}

/// Errors from the request parameter model
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// Name is neither in the schema nor was added during decoding
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),
}

/// Errors from a directory metadata loader.
///
/// These never invalidate a directory; they are logged and dropped.
#[derive(Debug, Clone, Error)]
pub enum MetaError {
    #[error("Failed to read metadata: {0}")]
    Read(String),

    #[error("Failed to parse metadata: {0}")]
    Parse(String),
}

/// Errors resolving a decoded request to a directory entry
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// Request path tries to leave the base directories
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No directory or entry exists for the request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Filesystem failure while probing a resolved image
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}
