//! Common error types for the prioritizer

use thiserror::Error;

/// Common result type for prioritizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across prioritizer crates
///
/// Nothing in this taxonomy is fatal to the process: validation errors are
/// reported before any remote call, remote-call errors degrade to a stale
/// board mirror, decode errors fall back to scheme defaults, and persistence
/// errors surface as a status message while local editing continues.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid user input or request precondition (no destination list,
    /// nothing selected). Reported immediately, no remote call attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-success response from the remote card API
    #[error("Remote call error: {0}")]
    RemoteCall(String),

    /// Embedded metadata marker missing or corrupt. Always recovered by
    /// substituting scheme defaults; never surfaced to the user.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Snapshot load/save failure (local file or remote blob store)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
