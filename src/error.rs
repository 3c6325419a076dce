use thiserror::Error;

use crate::models::ConfigId;

/// Failure taxonomy surfaced across the invoke boundary.
///
/// Per-window replay failures (launch failed, placement denied) are not
/// errors at this level; they are reported per record inside a
/// [`crate::ReplayReport`] so callers can represent partial success.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS window query could not be performed at all.
    #[error("window enumeration unavailable: {0}")]
    EnumerationUnavailable(String),

    #[error("no configuration saved under id {0}")]
    NotFound(ConfigId),

    /// A save did not reach disk. Writes are atomic, so any previously
    /// saved record under the same id is untouched.
    #[error("failed to write configuration catalog: {0}")]
    StoreWriteFailed(String),

    /// A record exists on disk but could not be decoded.
    #[error("failed to read configuration catalog: {0}")]
    StoreReadFailed(String),

    /// The catalog worker is gone; no store operation can proceed.
    #[error("configuration store unavailable: {0}")]
    StoreUnavailable(String),
}
