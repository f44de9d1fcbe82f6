use thiserror::Error;

/// Everything the core can fail with. Remote failures are deliberately
/// uniform: network, authorization and server-side validation errors all
/// collapse into [`AppError::Remote`] and trigger the same rollback path.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
