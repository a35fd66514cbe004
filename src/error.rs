//! Error types for vp8-recon

use thiserror::Error;

/// Result type alias for vp8-recon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vp8-recon
///
/// The reconstruction kernels themselves never fail (they perform no
/// allocation, no I/O, and no input validation); errors only arise at the
/// configuration boundary, e.g. when parsing a backend override.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported feature
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an unsupported error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Error::Unsupported(msg.into())
    }
}
