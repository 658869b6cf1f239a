//! Error taxonomy for the wait run.
//!
//! Only fatal conditions live here: recoverable watch disconnects are retried
//! inside the evaluation loop and never surface as errors (at worst they turn
//! into a timeout). Every variant maps to exit code 2.

use thiserror::Error;

/// Fatal errors that terminate a run immediately.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The pattern document is malformed
    #[error("invalid pattern: {0}")]
    Pattern(#[from] statematch::ParseError),

    /// The pattern file or standard input could not be read
    #[error("failed to read pattern: {0}")]
    PatternRead(#[from] std::io::Error),

    /// Kubernetes client or discovery error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Discovery found no API resource for the requested kind
    #[error("no API resources matching the filtering criteria were found for kind {0}")]
    NoApiResource(String),

    /// Discovery found several API resources for the requested kind
    #[error(
        "multiple API resources were found for kind {0}; narrow with --group, --group-version, --api-version or --plural"
    )]
    AmbiguousApiResource(String),

    /// The API server rejected the watch in a way retrying cannot fix
    /// (permission denied, kind or namespace not found)
    #[error("watch request rejected (status {code}): {message}")]
    Watch {
        /// HTTP status returned by the API server
        code: u16,
        /// Server-supplied reason
        message: String,
    },

    /// The watch stream terminated without a terminal state
    #[error("watch stream finished unexpectedly")]
    StreamEnded,
}
