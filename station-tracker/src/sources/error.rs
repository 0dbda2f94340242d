//! Snapshot source error types.

/// Errors that can occur when fetching a snapshot from a remote source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Source returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Request could not be built from the configuration
    #[error("invalid configuration: {message}")]
    Config { message: String },
}
