use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("buffer write failed: {0}")]
    Write(String),

    #[error("buffer read failed: {0}")]
    DrainRead(String),

    #[error("buffer trim failed: {0}")]
    DrainTrim(String),

    #[error("publish failed: {0}")]
    Publish(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
