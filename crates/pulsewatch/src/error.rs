use thiserror::Error;
use uuid::Uuid;

/// Failures raised by a heartbeat or monitor store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("invalid row: {0}")]
    Decode(String),

    #[error("monitor {0} not found")]
    MonitorNotFound(Uuid),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<deadpool::managed::PoolError<libsql::Error>> for StoreError {
    fn from(err: deadpool::managed::PoolError<libsql::Error>) -> Self {
        match err {
            deadpool::managed::PoolError::Backend(e) => StoreError::Database(e),
            other => StoreError::Pool(other.to_string()),
        }
    }
}

/// Rejected monitor definitions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("monitor name must not be empty")]
    EmptyName,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme `{0}`, only http and https can be monitored")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}
