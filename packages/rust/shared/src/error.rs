//! Error types for channelkeys.
//!
//! Library crates use [`ChannelKeysError`] via `thiserror` for run-level
//! failures. Per-identifier decode failures have their own typed enums in the
//! decoder and core crates. The CLI wraps everything with `color-eyre`.

use std::path::PathBuf;

/// Top-level error type for run-level channelkeys operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelKeysError {
    /// Required configuration missing or invalid. Fatal to the run.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page.
    #[error("network error: {0}")]
    Network(String),

    /// Listing page could not be fetched or yielded no identifiers. Fatal to the run.
    #[error("discovery error: {message}")]
    Discovery { message: String },

    /// Result store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed URL, empty identifier, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ChannelKeysError>;

impl ChannelKeysError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a discovery error from any displayable message.
    pub fn discovery(msg: impl Into<String>) -> Self {
        Self::Discovery {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ChannelKeysError::config("BASE_LISTING_URL is not set");
        assert_eq!(err.to_string(), "config error: BASE_LISTING_URL is not set");

        let err = ChannelKeysError::discovery("no identifiers found");
        assert!(err.to_string().contains("no identifiers"));
    }

    #[test]
    fn io_error_keeps_path() {
        let err = ChannelKeysError::io(
            "/tmp/api_data.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("api_data.json"));
    }
}
