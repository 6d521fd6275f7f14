//! Error types for the capture pipeline

use thiserror::Error;

/// Core pipeline error type
///
/// Malformed VT input is never an error: the emulator resynchronizes and
/// parsing continues. Only caller mistakes and session teardown surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied argument outside the accepted domain
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Session worker has shut down; no further events will be produced
    #[error("session closed")]
    SessionClosed,
}

/// Result type for core pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
