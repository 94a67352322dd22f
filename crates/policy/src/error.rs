//! Policy error types.

use thiserror::Error;

/// Policy errors.
///
/// Evaluation itself never fails; these come from building statements and
/// reading session payloads.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A statement or pattern is invalid.
    #[error("invalid statement: {0}")]
    Invalid(String),

    /// Failed to parse a session payload.
    #[error("failed to parse session payload: {0}")]
    Parse(String),

    /// An I/O error occurred while reading a payload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
