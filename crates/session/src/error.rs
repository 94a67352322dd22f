use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API error: {0}")]
    Api(String),

    /// The server rejected the session; the cached policy has been cleared.
    #[error("invalid session: sign in again")]
    InvalidSession,

    #[error("transfer not found: {0}")]
    TransferNotFound(String),

    #[error(transparent)]
    Policy(#[from] policy::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
