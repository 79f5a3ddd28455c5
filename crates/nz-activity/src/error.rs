use nz_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActivityError {
    #[error("activity weights parse error: {0}")]
    Parse(String),

    #[error("activity configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ActivityResult<T> = Result<T, ActivityError>;
